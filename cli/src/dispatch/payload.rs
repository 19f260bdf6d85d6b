//! Request bodies for the dashboard admin endpoints.
//!
//! The dashboard expects camelCase keys (`orgAccess`) even though the input
//! file and [`AdminRecord`] use lower/snake case. Unset fields are omitted,
//! never sent as null.

use serde_json::{json, Map, Value};

use crate::error::ValidationResult;
use crate::models::{AccessGrant, AdminRecord, GrantKind};
use crate::validation::validate_target_access;

/// Grants as dashboard objects: `{"id"|"tag": target, "access": level}`.
fn grants_payload(kind: GrantKind, grants: &[AccessGrant]) -> ValidationResult<Value> {
    let items = grants
        .iter()
        .map(|grant| -> ValidationResult<Value> {
            let access = validate_target_access(&grant.access)?;
            Ok(json!({ kind.payload_key(): grant.target, "access": access }))
        })
        .collect::<ValidationResult<Vec<_>>>()?;
    Ok(Value::Array(items))
}

fn insert_grants(body: &mut Map<String, Value>, record: &AdminRecord) -> ValidationResult<()> {
    if !record.networks.is_empty() {
        body.insert("networks".to_string(), grants_payload(GrantKind::Network, &record.networks)?);
    }
    if !record.tags.is_empty() {
        body.insert("tags".to_string(), grants_payload(GrantKind::Tag, &record.tags)?);
    }
    Ok(())
}

/// Body for creating an admin. `org_access` is the validated canonical value.
pub fn add_payload(record: &AdminRecord, org_access: &str) -> ValidationResult<Value> {
    let mut body = Map::new();
    body.insert("name".to_string(), json!(record.name));
    body.insert("email".to_string(), json!(record.email));
    body.insert("orgAccess".to_string(), json!(org_access));
    insert_grants(&mut body, record)?;
    Ok(Value::Object(body))
}

/// Body for updating an admin. Only supplied fields are included.
pub fn update_payload(
    admin_id: &str,
    record: &AdminRecord,
    org_access: Option<&str>,
) -> ValidationResult<Value> {
    let mut body = Map::new();
    body.insert("id".to_string(), json!(admin_id));
    if let Some(name) = &record.name {
        body.insert("name".to_string(), json!(name));
    }
    if let Some(access) = org_access {
        body.insert("orgAccess".to_string(), json!(access));
    }
    insert_grants(&mut body, record)?;
    Ok(Value::Object(body))
}

//! CSV reader for admin provisioning files.
//!
//! Decodes the file (encoding auto-detection), reads the header row and
//! yields raw data rows lazily, in file order. Row normalization lives in
//! [`normalizer`].

pub mod normalizer;

use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::report::logs::log_warning;

pub use normalizer::{NormalizedRow, RowNormalizer, VALID_FIELDS};

/// One data row as read from the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based position among data rows (the header is not counted).
    pub ordinal: u64,
    /// Physical line the row starts on.
    pub line: u64,
    /// Values in header order.
    pub values: Vec<String>,
}

impl RawRow {
    /// True when every column is blank.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        // WHATWG maps the Latin-1 labels onto windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Lazy reader over the data rows of an input file.
pub struct RowReader<R: Read> {
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<R>,
    ordinal: u64,
}

impl<R: Read> RowReader<R> {
    /// Read the header row. Fails with [`IngestError::Empty`] when there is none.
    pub fn new(reader: R) -> IngestResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::Empty);
        }

        Ok(Self {
            headers,
            records: rdr.into_records(),
            ordinal: 0,
        })
    }

    /// Header names, whitespace-trimmed, original case.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = IngestResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            self.ordinal += 1;

            let row = RawRow {
                ordinal: self.ordinal,
                line: record.position().map(|p| p.line()).unwrap_or(0),
                values: record.iter().map(String::from).collect(),
            };

            if row.is_blank() {
                log_warning(format!("Line {}: blank row skipped", row.line));
                continue;
            }
            return Some(Ok(row));
        }
    }
}

/// Open a file, detect its encoding and return a row reader over it.
pub fn open_csv<P: AsRef<Path>>(path: P) -> IngestResult<RowReader<Cursor<Vec<u8>>>> {
    let bytes = std::fs::read(path.as_ref())?;
    read_bytes(&bytes)
}

/// Same as [`open_csv`] for in-memory content.
pub fn read_bytes(bytes: &[u8]) -> IngestResult<RowReader<Cursor<Vec<u8>>>> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    RowReader::new(Cursor::new(content.into_bytes()))
}

//! Seeding the local store from a JSON records file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::{DhtError, Record, RecordType};
use crate::service::DhtEngine;

/// One entry of the records file. `value` is text (an IP address, a CNAME
/// target) and is stored as its bytes.
#[derive(Debug, Deserialize)]
struct RecordEntry {
    domain: String,
    record_type: String,
    value: String,
    ttl: i64,
}

#[derive(Debug, Deserialize)]
struct RecordsFile {
    #[serde(default)]
    records: Vec<RecordEntry>,
}

/// Errors that can occur while importing records.
#[derive(Debug, Error)]
pub enum RecordImportError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the records file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid records JSON.
    #[error("failed to parse records file: {0}")]
    Parse(#[from] serde_json::Error),
    /// The store refused a record.
    #[error("failed to import {key}: {source}")]
    Store {
        /// Key of the refused record.
        key: String,
        /// Why the store refused it.
        #[source]
        source: DhtError,
    },
}

/// Load every record in `path` into the engine's local store.
///
/// The file looks like
/// `{"records": [{"domain": "structx.io", "record_type": "A", "value": "10.0.0.1", "ttl": 300}]}`.
/// Each record is stored under [`Record::key`]. A missing file is not an
/// error and imports nothing.
///
/// Returns the number of records imported.
///
/// # Errors
///
/// Unreadable or malformed files, and the first record the store refuses
/// (for instance a duplicate key).
pub fn import_records<P: AsRef<Path>>(
    path: P,
    engine: &DhtEngine,
) -> Result<usize, RecordImportError> {
    let path = path.as_ref();
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No records file found, nothing to import");
            return Ok(0);
        }
        Err(source) => {
            return Err(RecordImportError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let file: RecordsFile = serde_json::from_slice(&raw)?;
    let mut imported = 0;
    for entry in file.records {
        let record_type: RecordType = entry.record_type.into();
        let record = Record::new(entry.domain, record_type, entry.value.into_bytes(), entry.ttl);
        let key = record.key();
        engine
            .set_value(&key, record)
            .map_err(|source| RecordImportError::Store {
                key: key.clone(),
                source,
            })?;
        info!(key = %key, "Imported DNS record");
        imported += 1;
    }
    Ok(imported)
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Clinical metadata table
//!
//! One record per detector class id, loaded once at startup and read-only
//! afterwards. The table is indexed directly by class id, so ids must run
//! contiguously from 0.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::ClassTable;

/// Versioned table shipped with the binary
const EMBEDDED_METADATA: &str = include_str!("../../assets/clinical_metadata.json");

/// Clinical guidance shown alongside a detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub class_name: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read clinical metadata from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid clinical metadata JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Clinical metadata table is empty")]
    Empty,

    #[error("Duplicate clinical metadata record for class id {0}")]
    Duplicate(u32),

    #[error("Clinical metadata ids must be contiguous from 0: expected {expected}, found {found}")]
    NonContiguous { expected: u32, found: u32 },

    #[error("Clinical metadata record {class_id} has an empty {field}")]
    EmptyField { class_id: u32, field: &'static str },

    #[error("No clinical metadata for class id {class_id}")]
    Gap { class_id: u32 },

    #[error("Clinical metadata does not cover detector class ids {missing:?}")]
    Coverage { missing: Vec<u32> },
}

#[derive(Deserialize)]
struct MetadataFile {
    version: String,
    records: Vec<RecordEntry>,
}

#[derive(Deserialize)]
struct RecordEntry {
    class_id: u32,
    #[serde(flatten)]
    record: ClinicalRecord,
}

#[derive(Debug, Clone)]
pub struct ClinicalMetadata {
    version: String,
    records: Box<[ClinicalRecord]>,
}

impl ClinicalMetadata {
    /// Load the table compiled into the binary
    pub fn embedded() -> Result<Self, MetadataError> {
        Self::from_json_str(EMBEDDED_METADATA)
    }

    /// Load a replacement table from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, MetadataError> {
        let file: MetadataFile = serde_json::from_str(raw)?;
        let mut entries = file.records;
        if entries.is_empty() {
            return Err(MetadataError::Empty);
        }

        entries.sort_by_key(|e| e.class_id);

        let mut records = Vec::with_capacity(entries.len());
        for (expected, entry) in (0u32..).zip(entries) {
            if entry.class_id < expected {
                return Err(MetadataError::Duplicate(entry.class_id));
            }
            if entry.class_id > expected {
                return Err(MetadataError::NonContiguous {
                    expected,
                    found: entry.class_id,
                });
            }
            validate_record(entry.class_id, &entry.record)?;
            records.push(entry.record);
        }

        Ok(Self {
            version: file.version,
            records: records.into_boxed_slice(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Declared class id range
    pub fn class_ids(&self) -> Range<u32> {
        0..self.records.len() as u32
    }

    /// Clinical record for `class_id`
    pub fn lookup(&self, class_id: u32) -> Result<&ClinicalRecord, MetadataError> {
        usize::try_from(class_id)
            .ok()
            .and_then(|idx| self.records.get(idx))
            .ok_or(MetadataError::Gap { class_id })
    }

    /// Fail unless every class the detector can emit has a record
    pub fn ensure_covers(&self, classes: &ClassTable) -> Result<(), MetadataError> {
        let missing: Vec<u32> = classes
            .keys()
            .copied()
            .filter(|id| !self.class_ids().contains(id))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MetadataError::Coverage { missing })
        }
    }

    /// Canonical class names, usable as a detector class table
    pub fn canonical_names(&self) -> ClassTable {
        (0u32..)
            .zip(self.records.iter())
            .map(|(id, record)| (id, record.class_name.clone()))
            .collect()
    }
}

fn validate_record(class_id: u32, record: &ClinicalRecord) -> Result<(), MetadataError> {
    let fields = [
        ("class_name", &record.class_name),
        ("title", &record.title),
        ("description", &record.description),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(MetadataError::EmptyField { class_id, field });
        }
    }
    Ok(())
}

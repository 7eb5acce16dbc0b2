// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Parser for the `names` entry of exported YOLO model metadata
//!
//! The exporter writes the class table as a Python dict literal, e.g.
//! `{0: 'Caries', 1: 'Crown', 2: "Dentist's note"}`. Quoted keys are accepted
//! too so a JSON object with numeric string keys parses as well.

use regex::Regex;
use thiserror::Error;

use super::ClassTable;

/// One `id: 'name'` entry and its separator. Keys may be bare or quoted.
const ENTRY_PATTERN: &str = r#"\A\s*(?:(\d+)|'(\d+)'|"(\d+)")\s*:\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")\s*(?:,|\z)"#;

const ESCAPE_PATTERN: &str = r"\\(.)";

#[derive(Debug, Error, PartialEq)]
#[error("Malformed class names at offset {offset}: {reason}")]
pub struct ClassNamesError {
    pub offset: usize,
    pub reason: String,
}

impl ClassNamesError {
    fn at(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// Parse a class table from model metadata
pub fn parse_class_names(raw: &str) -> Result<ClassTable, ClassNamesError> {
    let entry = Regex::new(ENTRY_PATTERN).map_err(|e| ClassNamesError::at(0, e.to_string()))?;
    let escape = Regex::new(ESCAPE_PATTERN).map_err(|e| ClassNamesError::at(0, e.to_string()))?;

    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| ClassNamesError::at(leading, "expected a {id: name} mapping"))?;
    let body_offset = leading + 1;

    let mut table = ClassTable::new();
    let mut pos = 0;

    while !body[pos..].trim().is_empty() {
        let caps = entry.captures(&body[pos..]).ok_or_else(|| {
            ClassNamesError::at(body_offset + pos, "expected 'id: name' entry")
        })?;

        let digits = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let id = digits.parse::<u32>().map_err(|_| {
            ClassNamesError::at(body_offset + pos, format!("invalid class id '{}'", digits))
        })?;

        let quoted = caps
            .get(4)
            .or_else(|| caps.get(5))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let name = escape.replace_all(quoted, "$1").into_owned();

        if table.insert(id, name).is_some() {
            return Err(ClassNamesError::at(
                body_offset + pos,
                format!("duplicate class id {}", id),
            ));
        }

        pos += caps.get(0).map(|m| m.end()).unwrap_or(body.len() - pos);
    }

    Ok(table)
}

//! Manifest line format.
//!
//! One line per recorded type, fields in fixed order:
//!
//! ```text
//! <name> id: <id>[ super: <id>][ interfaces: <id> <id> ...][ source: <path>]
//! ```
//!
//! `super:`, `interfaces:` and `source:` only appear for user-defined loader
//! types. The `source:` value is the origin URI with its scheme cut off by a
//! fixed width, so it is a truncated URI rather than a real file name and
//! readers must decode it themselves.

use crate::config::ManifestConfig;
use crate::error::{ClassListError, Result};
use crate::platform::PathStyle;
use crate::registry::ManifestId;
use std::collections::HashSet;
use std::fmt;

/// Cut the `file:` scheme off an origin.
///
/// Drive-letter platforms drop one more character so that
/// `file:/C:/dir/foo.jar` becomes `C:/dir/foo.jar`; elsewhere
/// `file:/dir/foo.jar` becomes `/dir/foo.jar`.
///
/// `None` if the origin is shorter than the cut or the cut would split a
/// character.
pub fn strip_source_scheme(origin: &str, style: PathStyle) -> Option<&str> {
    let width = match style {
        PathStyle::DriveLetter => ManifestConfig::DRIVE_LETTER_STRIP,
        PathStyle::Posix => ManifestConfig::POSIX_STRIP,
    };
    origin.get(width..)
}

/// One manifest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub id: ManifestId,
    pub super_id: Option<ManifestId>,
    pub interfaces: Vec<ManifestId>,
    pub source: Option<String>,
}

impl ManifestEntry {
    pub fn new(name: impl Into<String>, id: ManifestId) -> Self {
        Self {
            name: name.into(),
            id,
            super_id: None,
            interfaces: Vec::new(),
            source: None,
        }
    }

    /// Ids this record refers to, super first.
    pub fn dependencies(&self) -> impl Iterator<Item = ManifestId> + '_ {
        self.super_id.into_iter().chain(self.interfaces.iter().copied())
    }

    /// Parse one record. `line` is only used for error messages.
    pub fn parse(text: &str, line: usize) -> Result<Self> {
        let malformed = |message: &str| ClassListError::MalformedLine {
            line,
            message: message.to_string(),
        };

        let (fields, source) = match text.split_once(" source: ") {
            Some((fields, source)) => (fields, Some(source.to_string())),
            None => (text, None),
        };

        let mut tokens = fields.split_whitespace();
        let name = tokens.next().ok_or_else(|| malformed("empty record"))?;
        if tokens.next() != Some("id:") {
            return Err(malformed("expected `id:` after the type name"));
        }
        let id = parse_id(tokens.next(), line)?;

        let mut entry = ManifestEntry::new(name, id);
        entry.source = source;

        let mut in_interfaces = false;
        while let Some(token) = tokens.next() {
            match token {
                "super:" if entry.super_id.is_none() && !in_interfaces => {
                    entry.super_id = Some(parse_id(tokens.next(), line)?);
                }
                "interfaces:" if !in_interfaces => in_interfaces = true,
                _ if in_interfaces => entry.interfaces.push(parse_id(Some(token), line)?),
                other => return Err(malformed(&format!("unexpected field `{other}`"))),
            }
        }
        if in_interfaces && entry.interfaces.is_empty() {
            return Err(malformed("`interfaces:` with no ids"));
        }

        Ok(entry)
    }
}

fn parse_id(token: Option<&str>, line: usize) -> Result<ManifestId> {
    let token = token.ok_or_else(|| ClassListError::MalformedLine {
        line,
        message: "missing id".to_string(),
    })?;
    token.parse().map_err(|_| ClassListError::MalformedLine {
        line,
        message: format!("invalid id `{token}`"),
    })
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} id: {}", self.name, self.id)?;
        if let Some(super_id) = self.super_id {
            write!(f, " super: {super_id}")?;
        }
        if !self.interfaces.is_empty() {
            write!(f, " interfaces:")?;
            for id in &self.interfaces {
                write!(f, " {id}")?;
            }
        }
        if let Some(source) = &self.source {
            write!(f, " source: {source}")?;
        }
        Ok(())
    }
}

/// Parse a whole manifest, skipping the header and blank lines.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|(index, line)| ManifestEntry::parse(line, index + 1))
        .collect()
}

/// Check that ids only grow and every reference points at an earlier record.
pub fn verify_topology(entries: &[ManifestEntry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut last: Option<ManifestId> = None;

    for (index, entry) in entries.iter().enumerate() {
        let record = index + 1;
        if last.is_some_and(|prev| entry.id <= prev) {
            return Err(ClassListError::OutOfOrder {
                record,
                message: format!("{} has id {} after id {}", entry.name, entry.id, last.unwrap_or(0)),
            });
        }
        if let Some(missing) = entry.dependencies().find(|dep| !seen.contains(dep)) {
            return Err(ClassListError::OutOfOrder {
                record,
                message: format!("{} refers to id {} before it was written", entry.name, missing),
            });
        }
        seen.insert(entry.id);
        last = Some(entry.id);
    }
    Ok(())
}

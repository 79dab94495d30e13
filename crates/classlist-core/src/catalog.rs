//! Side catalog of types defined by user-defined loaders.
//!
//! A user-defined loader type is only written to the manifest if it can be
//! entered into this catalog. The archive builder later loads such types by
//! name from their recorded source, so two different types sharing one name
//! cannot both be replayed.

use crate::model::{TypeIdentity, TypeRecord};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Registration went through (or the type was already registered).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted;

/// The name is already held by a different type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: String,
    pub existing: TypeIdentity,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} already registered by {}", self.name, self.existing)
    }
}

impl std::error::Error for Conflict {}

/// Registration capability for user-defined loader types.
///
/// Implementations are called while the writer holds its lock, so they must
/// not call back into the writer.
pub trait UnregisteredCatalog: Send + Sync {
    fn register(&self, ty: &TypeRecord) -> Result<Accepted, Conflict>;
}

/// Catalog keyed by type name, held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    by_name: Mutex<HashMap<String, TypeIdentity>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

impl UnregisteredCatalog for InMemoryCatalog {
    fn register(&self, ty: &TypeRecord) -> Result<Accepted, Conflict> {
        let mut by_name = self.by_name.lock().unwrap_or_else(PoisonError::into_inner);
        match by_name.get(&ty.name) {
            Some(existing) if *existing == ty.identity => Ok(Accepted),
            Some(existing) => Err(Conflict {
                name: ty.name.clone(),
                existing: *existing,
            }),
            None => {
                by_name.insert(ty.name.clone(), ty.identity);
                Ok(Accepted)
            }
        }
    }
}

//! Identity registry: sequential manifest ids for recorded types.
//!
//! Ids are handed out in order of first acceptance and are never reused.
//! Once a line naming id `k` has been flushed, `k` belongs to that type for
//! the rest of the manifest, so unloading a type drops its mapping but leaves
//! the counter alone.
//!
//! The registry has no lock of its own; the writer owns it behind the same
//! mutex as the output sink.

use crate::model::TypeIdentity;
use std::collections::HashMap;

/// Manifest id assigned to a recorded type.
pub type ManifestId = u32;

#[derive(Debug, Default)]
pub struct IdRegistry {
    ids: HashMap<TypeIdentity, ManifestId>,
    next_id: ManifestId,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `identity`, assigning the next one if it has none.
    pub fn get_or_create_id(&mut self, identity: TypeIdentity) -> ManifestId {
        let next_id = &mut self.next_id;
        *self.ids.entry(identity).or_insert_with(|| {
            let id = *next_id;
            *next_id += 1;
            id
        })
    }

    /// False for identities never recorded and for ones removed since.
    pub fn has_id(&self, identity: TypeIdentity) -> bool {
        self.ids.contains_key(&identity)
    }

    pub fn get(&self, identity: TypeIdentity) -> Option<ManifestId> {
        self.ids.get(&identity).copied()
    }

    /// Drop the mapping for an unloaded type. The counter is not rewound.
    pub fn remove(&mut self, identity: TypeIdentity) -> Option<ManifestId> {
        self.ids.remove(&identity)
    }

    /// Number of live mappings.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The id the next new identity will receive.
    pub fn next_id(&self) -> ManifestId {
        self.next_id
    }
}

//! Runtime type objects as seen by the writer.
//!
//! These are owned by the host runtime. The writer only reads them while
//! handling a load event and keeps nothing but their identities.

use serde::{Deserialize, Serialize};

/// Opaque identity of a loaded type, stable for the type's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIdentity(pub u64);

impl std::fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which kind of loader defined a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderClass {
    Builtin,
    UserDefined,
}

impl LoaderClass {
    pub fn is_builtin(&self) -> bool {
        matches!(self, LoaderClass::Builtin)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFlags {
    #[serde(default)]
    pub is_hidden: bool,
    /// Loaded from an archive produced by an earlier run.
    #[serde(default)]
    pub is_from_prior_archive: bool,
    #[serde(default)]
    pub belongs_to_patched_module: bool,
}

/// A loaded type and its structural context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub identity: TypeIdentity,
    /// Fully-qualified name, written verbatim.
    pub name: String,
    pub loader: LoaderClass,
    /// Absent only for the root of the hierarchy.
    #[serde(default)]
    pub super_type: Option<TypeIdentity>,
    /// Direct interfaces in declaration order.
    #[serde(default)]
    pub interfaces: Vec<TypeIdentity>,
    #[serde(default)]
    pub flags: TypeFlags,
}

impl TypeRecord {
    pub fn new(identity: u64, name: impl Into<String>, loader: LoaderClass) -> Self {
        Self {
            identity: TypeIdentity(identity),
            name: name.into(),
            loader,
            super_type: None,
            interfaces: Vec::new(),
            flags: TypeFlags::default(),
        }
    }

    pub fn builtin(identity: u64, name: impl Into<String>) -> Self {
        Self::new(identity, name, LoaderClass::Builtin)
    }

    pub fn user_defined(identity: u64, name: impl Into<String>) -> Self {
        Self::new(identity, name, LoaderClass::UserDefined)
    }

    pub fn with_super(mut self, super_type: TypeIdentity) -> Self {
        self.super_type = Some(super_type);
        self
    }

    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = TypeIdentity>) -> Self {
        self.interfaces = interfaces.into_iter().collect();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.flags.is_hidden = true;
        self
    }

    pub fn from_prior_archive(mut self) -> Self {
        self.flags.is_from_prior_archive = true;
        self
    }

    pub fn in_patched_module(mut self) -> Self {
        self.flags.belongs_to_patched_module = true;
        self
    }
}

/// Where a type's bytes came from, as reported by the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteOrigin {
    /// URI-like source, e.g. `file:/dir/foo.jar`.
    #[serde(default)]
    pub source: Option<String>,
}

impl ByteOrigin {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
        }
    }
}

//! Eligibility and ordering rules for manifest records.
//!
//! A type is checked once, when it finishes loading. A rejected type is
//! skipped for good: nothing remembers it, so a later type whose super or
//! interface was rejected is rejected too, even if it would otherwise
//! qualify. There is no retry queue.

use crate::catalog::{Conflict, UnregisteredCatalog};
use crate::config::ManifestConfig;
use crate::format::strip_source_scheme;
use crate::model::{ByteOrigin, TypeIdentity, TypeRecord};
use crate::platform::PathStyle;
use tracing::trace;

/// Why a type was left out of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Hidden,
    PatchedModule,
    /// Came from an earlier archive; its real source was not kept.
    FromPriorArchive,
    MissingSource,
    UnsupportedScheme,
    /// The fixed-width scheme cut does not leave a valid path.
    UnstrippableSource,
    CatalogConflict(Conflict),
    GeneratedSpecies,
    UnrecordedSuper(TypeIdentity),
    UnrecordedInterface(TypeIdentity),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Hidden => write!(f, "hidden type"),
            Rejection::PatchedModule => write!(f, "type in a patched module"),
            Rejection::FromPriorArchive => write!(f, "loaded from a prior archive"),
            Rejection::MissingSource => write!(f, "no byte origin"),
            Rejection::UnsupportedScheme => write!(f, "origin is not a file URI"),
            Rejection::UnstrippableSource => write!(f, "origin too short to strip"),
            Rejection::CatalogConflict(conflict) => write!(f, "catalog conflict: {conflict}"),
            Rejection::GeneratedSpecies => write!(f, "generated species type"),
            Rejection::UnrecordedSuper(id) => write!(f, "super type {id} not recorded"),
            Rejection::UnrecordedInterface(id) => write!(f, "interface {id} not recorded"),
        }
    }
}

/// Decide whether `ty` may be written now.
///
/// `has_id` answers whether a type already has a manifest id. The catalog is
/// only consulted for user-defined loader types that passed every earlier
/// rule. `style` decides how the origin will be cut for the `source:` field.
pub fn check(
    ty: &TypeRecord,
    origin: Option<&ByteOrigin>,
    has_id: impl Fn(TypeIdentity) -> bool,
    catalog: &dyn UnregisteredCatalog,
    style: PathStyle,
) -> Result<(), Rejection> {
    let result = run_rules(ty, origin, has_id, catalog, style);
    if let Err(reason) = &result {
        trace!("Skipping {} ({}): {}", ty.name, ty.identity, reason);
    }
    result
}

fn run_rules(
    ty: &TypeRecord,
    origin: Option<&ByteOrigin>,
    has_id: impl Fn(TypeIdentity) -> bool,
    catalog: &dyn UnregisteredCatalog,
    style: PathStyle,
) -> Result<(), Rejection> {
    if ty.flags.is_hidden {
        return Err(Rejection::Hidden);
    }
    if ty.flags.belongs_to_patched_module {
        return Err(Rejection::PatchedModule);
    }

    let source = origin.and_then(|o| o.source.as_deref());

    if !ty.loader.is_builtin() {
        if ty.flags.is_from_prior_archive {
            return Err(Rejection::FromPriorArchive);
        }
        match source {
            None => return Err(Rejection::MissingSource),
            Some(s) if !s.starts_with(ManifestConfig::FILE_SCHEME) => {
                return Err(Rejection::UnsupportedScheme)
            }
            Some(s) if strip_source_scheme(s, style).is_none() => {
                return Err(Rejection::UnstrippableSource)
            }
            Some(_) => {}
        }
        catalog.register(ty).map_err(Rejection::CatalogConflict)?;
    }

    if source == Some(ManifestConfig::GENERATED_SPECIES_MARKER) {
        return Err(Rejection::GeneratedSpecies);
    }

    if let Some(super_type) = ty.super_type {
        if !has_id(super_type) {
            return Err(Rejection::UnrecordedSuper(super_type));
        }
    }
    if let Some(missing) = ty.interfaces.iter().copied().find(|i| !has_id(*i)) {
        return Err(Rejection::UnrecordedInterface(missing));
    }

    Ok(())
}

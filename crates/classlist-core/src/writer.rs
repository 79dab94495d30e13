//! The class list writer service.
//!
//! One writer per process. The host calls [`ClassListWriter::init`] before any
//! type can load, feeds it load and unload notifications from any thread, and
//! calls [`ClassListWriter::close`] at shutdown.
//!
//! A single mutex guards both the id registry and the output sink. It is held
//! across the whole check, id assignment and write for one type, so two types
//! loading at once never see each other half-recorded, and an unload can never
//! interleave with the recording of the same type.

use crate::catalog::{InMemoryCatalog, UnregisteredCatalog};
use crate::config::{ClassListConfig, ManifestConfig};
use crate::error::{ClassListError, Result};
use crate::filter::{self, Rejection};
use crate::format::{strip_source_scheme, ManifestEntry};
use crate::model::{ByteOrigin, TypeIdentity, TypeRecord};
use crate::registry::{IdRegistry, ManifestId};
use crate::sink::ManifestSink;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// What happened to a type handed to [`ClassListWriter::on_type_loaded`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Recorded { id: ManifestId },
    /// Skipped for the rest of the process.
    Rejected(Rejection),
    /// Dumping is off, was never opened, or has failed.
    Disabled,
}

impl LoadOutcome {
    pub fn id(&self) -> Option<ManifestId> {
        match self {
            LoadOutcome::Recorded { id } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct WriterState {
    /// Created on the first id assignment.
    registry: Option<IdRegistry>,
    sink: Option<ManifestSink>,
}

impl WriterState {
    fn has_id(&self, identity: TypeIdentity) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|registry| registry.has_id(identity))
    }

    fn shutdown(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close() {
                warn!("Failed to close class list: {}", e);
            }
        }
    }
}

pub struct ClassListWriter {
    config: ClassListConfig,
    catalog: Arc<dyn UnregisteredCatalog>,
    state: Mutex<WriterState>,
    enabled: AtomicBool,
}

impl ClassListWriter {
    /// Create a writer backed by an [`InMemoryCatalog`].
    pub fn new(config: ClassListConfig) -> Self {
        Self::with_catalog(config, Arc::new(InMemoryCatalog::new()))
    }

    pub fn with_catalog(config: ClassListConfig, catalog: Arc<dyn UnregisteredCatalog>) -> Self {
        Self {
            config,
            catalog,
            state: Mutex::new(WriterState::default()),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ClassListConfig {
        &self.config
    }

    /// Open the manifest if dumping is configured.
    ///
    /// Without an output path this does nothing and the writer stays
    /// disabled. If the file cannot be created the writer also stays
    /// disabled; the error is logged and returned, and the host carries on.
    pub fn init(&self) -> Result<()> {
        let Some(path) = self.config.resolved_output() else {
            return Ok(());
        };

        let mut state = self.lock_state()?;
        if state.sink.is_some() {
            return Ok(());
        }

        match ManifestSink::open(&path) {
            Ok(sink) => {
                state.sink = Some(sink);
                self.enabled.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                warn!("Cannot open class list {}, dumping disabled: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Start dumping to an already-open sink instead of the configured path.
    ///
    /// Does nothing if a sink is already in place.
    pub fn init_with_sink(&self, sink: ManifestSink) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.sink.is_none() {
            state.sink = Some(sink);
            self.enabled.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Path of the open manifest, if any.
    pub fn output_path(&self) -> Option<PathBuf> {
        let state = self.lock_state().ok()?;
        state.sink.as_ref().map(|sink| sink.path().to_path_buf())
    }

    /// Record a type that has just finished loading, if it qualifies.
    pub fn on_type_loaded(&self, ty: &TypeRecord, origin: Option<&ByteOrigin>) -> LoadOutcome {
        if !self.is_enabled() {
            return LoadOutcome::Disabled;
        }

        let mut guard = match self.lock_state() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Class list dumping disabled: {}", e);
                self.enabled.store(false, Ordering::SeqCst);
                return LoadOutcome::Disabled;
            }
        };
        let state = &mut *guard;
        if state.sink.is_none() {
            return LoadOutcome::Disabled;
        }

        if !self.config.has_runtime_image {
            warn!("Class list dumping is not supported in exploded build");
            self.disable(state);
            return LoadOutcome::Disabled;
        }

        // A repeated load event for a recorded type is not a new record.
        if let Some(id) = state.registry.as_ref().and_then(|r| r.get(ty.identity)) {
            return LoadOutcome::Recorded { id };
        }

        if let Err(reason) = filter::check(
            ty,
            origin,
            |id| state.has_id(id),
            self.catalog.as_ref(),
            self.config.path_style,
        ) {
            return LoadOutcome::Rejected(reason);
        }

        let registry = state.registry.get_or_insert_with(IdRegistry::new);
        let entry = self.entry_for(registry, ty, origin);
        let id = entry.id;

        let Some(sink) = state.sink.as_mut() else {
            return LoadOutcome::Disabled;
        };
        match sink.write_line(&entry.to_string()) {
            Ok(()) => LoadOutcome::Recorded { id },
            Err(e) => {
                warn!("Failed to write class list, dumping disabled: {}", e);
                self.disable(state);
                LoadOutcome::Disabled
            }
        }
    }

    /// Forget an unloaded type. Its id is not handed out again.
    pub fn on_type_unloaded(&self, identity: TypeIdentity) {
        let mut state = self.lock_state_for_teardown();
        if let Some(id) = state.registry.as_mut().and_then(|r| r.remove(identity)) {
            debug!("Unloaded {} (class list id {})", identity, id);
        }
    }

    /// Manifest id of a currently loaded, recorded type.
    pub fn id_of(&self, identity: TypeIdentity) -> Option<ManifestId> {
        let state = self.lock_state().ok()?;
        state.registry.as_ref().and_then(|r| r.get(identity))
    }

    /// Number of recorded types that have not been unloaded.
    pub fn live_records(&self) -> usize {
        self.lock_state()
            .map(|state| state.registry.as_ref().map_or(0, IdRegistry::len))
            .unwrap_or(0)
    }

    /// Flush and close the manifest. Safe to call repeatedly, or without
    /// ever having called [`init`](Self::init).
    pub fn close(&self) {
        let mut state = self.lock_state_for_teardown();
        self.enabled.store(false, Ordering::SeqCst);
        state.shutdown();
    }

    fn entry_for(
        &self,
        registry: &mut IdRegistry,
        ty: &TypeRecord,
        origin: Option<&ByteOrigin>,
    ) -> ManifestEntry {
        let mut entry = ManifestEntry::new(ty.name.clone(), registry.get_or_create_id(ty.identity));
        if ty.loader.is_builtin() {
            return entry;
        }

        // Dependencies already have ids; the filter checked.
        entry.super_id = ty.super_type.map(|s| registry.get_or_create_id(s));
        entry.interfaces = ty
            .interfaces
            .iter()
            .map(|i| registry.get_or_create_id(*i))
            .collect();
        entry.source = origin
            .and_then(|o| o.source.as_deref())
            .filter(|s| s.starts_with(ManifestConfig::FILE_SCHEME))
            .and_then(|s| strip_source_scheme(s, self.config.path_style))
            .map(str::to_string);
        entry
    }

    fn disable(&self, state: &mut WriterState) {
        self.enabled.store(false, Ordering::SeqCst);
        state.shutdown();
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, WriterState>> {
        self.state.lock().map_err(|_| ClassListError::LockPoisoned)
    }

    /// Unload and shutdown must still run after a panic elsewhere.
    fn lock_state_for_teardown(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ClassListWriter {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ClassListWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassListWriter")
            .field("config", &self.config)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

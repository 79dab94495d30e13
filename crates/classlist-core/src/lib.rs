//! Class List Core - dependency-ordered manifest of loaded types.
//!
//! Each type that finishes loading is offered to a [`ClassListWriter`]. If it
//! qualifies, it gets the next sequential id and one line is appended to the
//! manifest. A line that refers to a super type or interface by id is only
//! ever written after the line for that id, so an archive builder can replay
//! the file top to bottom without resolving anything itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use classlist_core::{ByteOrigin, ClassListConfig, ClassListWriter, TypeRecord};
//!
//! let writer = ClassListWriter::new(ClassListConfig::with_output("classes-%p.lst"));
//! writer.init()?;
//!
//! let object = TypeRecord::builtin(1, "java/lang/Object");
//! writer.on_type_loaded(&object, None);
//!
//! let main = TypeRecord::user_defined(2, "app/Main").with_super(object.identity);
//! writer.on_type_loaded(&main, Some(&ByteOrigin::from_source("file:/opt/app.jar")));
//!
//! writer.close();
//! # Ok::<(), classlist_core::ClassListError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod model;
pub mod platform;
pub mod registry;
pub mod sink;
pub mod writer;

// Re-export commonly used types
pub use catalog::{Accepted, Conflict, InMemoryCatalog, UnregisteredCatalog};
pub use config::{ClassListConfig, ManifestConfig};
pub use error::{ClassListError, Result};
pub use filter::Rejection;
pub use format::{parse_manifest, strip_source_scheme, verify_topology, ManifestEntry};
pub use model::{ByteOrigin, LoaderClass, TypeFlags, TypeIdentity, TypeRecord};
pub use platform::PathStyle;
pub use registry::{IdRegistry, ManifestId};
pub use sink::{ManifestOutput, ManifestSink};
pub use writer::{ClassListWriter, LoadOutcome};

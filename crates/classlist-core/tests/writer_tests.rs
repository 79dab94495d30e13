//! Integration tests for the ClassListWriter public interface.
//!
//! These tests drive the writer through load and unload events and check the
//! manifest that ends up on disk.

use classlist_core::{
    parse_manifest, verify_topology, Accepted, ByteOrigin, ClassListConfig, ClassListWriter,
    Conflict, LoadOutcome, ManifestConfig, ManifestEntry, PathStyle, Rejection,
    TypeIdentity, TypeRecord, UnregisteredCatalog,
};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Create a writer with an open manifest in a fresh temp directory.
fn create_writer() -> (TempDir, ClassListWriter) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = ClassListConfig::with_output(temp_dir.path().join("classes.lst"))
        .path_style(PathStyle::Posix);
    let writer = ClassListWriter::new(config);
    writer.init().expect("Failed to open class list");
    (temp_dir, writer)
}

fn read_entries(temp_dir: &TempDir) -> Vec<ManifestEntry> {
    let text = std::fs::read_to_string(temp_dir.path().join("classes.lst")).unwrap();
    parse_manifest(&text).unwrap()
}

struct RejectAll;

impl UnregisteredCatalog for RejectAll {
    fn register(&self, ty: &TypeRecord) -> Result<Accepted, Conflict> {
        Err(Conflict {
            name: ty.name.clone(),
            existing: TypeIdentity(0),
        })
    }
}

#[test]
fn test_base_then_derived_scenario() {
    let (temp_dir, writer) = create_writer();

    let base = TypeRecord::builtin(1, "Base");
    let derived = TypeRecord::builtin(2, "Derived").with_super(base.identity);
    writer.on_type_loaded(&base, None);
    writer.on_type_loaded(&derived, None);
    writer.close();

    let entries = read_entries(&temp_dir);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Base");
    assert_eq!(entries[0].id, 0);
    assert_eq!(entries[1].name, "Derived");
    assert_eq!(entries[1].id, 1);
}

#[test]
fn test_derived_from_hidden_scenario() {
    let (temp_dir, writer) = create_writer();

    let hidden = TypeRecord::builtin(1, "Hidden").hidden();
    let derived = TypeRecord::builtin(2, "Derived").with_super(hidden.identity);

    // Hidden never reaches the writer as recorded; Derived comes alone.
    assert_eq!(
        writer.on_type_loaded(&derived, None),
        LoadOutcome::Rejected(Rejection::UnrecordedSuper(hidden.identity))
    );
    writer.close();

    assert!(read_entries(&temp_dir).is_empty());
}

#[test]
fn test_user_defined_scenario() {
    let (temp_dir, writer) = create_writer();

    let object = TypeRecord::builtin(1, "java/lang/Object");
    writer.on_type_loaded(&object, None);

    let ty = TypeRecord::user_defined(2, "app/X").with_super(object.identity);
    let outcome = writer.on_type_loaded(&ty, Some(&ByteOrigin::from_source("file:/tmp/x.jar")));
    assert_eq!(outcome, LoadOutcome::Recorded { id: 1 });

    let entries = read_entries(&temp_dir);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].source.as_deref(), Some("/tmp/x.jar"));
    assert_eq!(entries[1].super_id, Some(0));
}

#[test]
fn test_rejection_is_permanent() {
    let (temp_dir, writer) = create_writer();

    let base = TypeRecord::builtin(1, "Base");
    let derived = TypeRecord::builtin(2, "Derived").with_super(base.identity);

    // Derived arrives before its super and is dropped.
    assert!(matches!(
        writer.on_type_loaded(&derived, None),
        LoadOutcome::Rejected(_)
    ));
    writer.on_type_loaded(&base, None);

    // Nothing revisits Derived once Base is in.
    writer.close();
    let entries = read_entries(&temp_dir);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Base");
}

#[test]
fn test_ids_count_only_accepted_types() {
    let (temp_dir, writer) = create_writer();

    let mut expected = 0;
    for i in 0..20u64 {
        let mut ty = TypeRecord::builtin(i, format!("T{i}"));
        if i % 3 == 0 {
            ty = ty.hidden();
        }
        let outcome = writer.on_type_loaded(&ty, None);
        if i % 3 == 0 {
            assert!(matches!(outcome, LoadOutcome::Rejected(Rejection::Hidden)));
        } else {
            assert_eq!(outcome.id(), Some(expected));
            expected += 1;
        }
        if i % 4 == 1 {
            writer.on_type_unloaded(ty.identity);
        }
    }

    let entries = read_entries(&temp_dir);
    let ids: Vec<u32> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, (0..expected).collect::<Vec<_>>());
}

#[test]
fn test_unloaded_id_never_reused() {
    let (temp_dir, writer) = create_writer();

    let a = TypeRecord::builtin(1, "A");
    let k = writer.on_type_loaded(&a, None).id().unwrap();
    writer.on_type_unloaded(a.identity);

    let b = TypeRecord::builtin(2, "B");
    assert_ne!(writer.on_type_loaded(&b, None).id(), Some(k));

    // Same identity coming back is a new type as far as the manifest goes.
    let a_again = TypeRecord::builtin(1, "A");
    assert_eq!(writer.on_type_loaded(&a_again, None).id(), Some(2));
    assert_eq!(read_entries(&temp_dir).len(), 3);
}

#[test]
fn test_catalog_conflict_skips_user_types() {
    let temp_dir = TempDir::new().unwrap();
    let config = ClassListConfig::with_output(temp_dir.path().join("classes.lst"))
        .path_style(PathStyle::Posix);
    let writer = ClassListWriter::with_catalog(config, Arc::new(RejectAll));
    writer.init().unwrap();

    let object = TypeRecord::builtin(1, "java/lang/Object");
    assert!(writer.on_type_loaded(&object, None).id().is_some());

    let ty = TypeRecord::user_defined(2, "app/X").with_super(object.identity);
    assert!(matches!(
        writer.on_type_loaded(&ty, Some(&ByteOrigin::from_source("file:/tmp/x.jar"))),
        LoadOutcome::Rejected(Rejection::CatalogConflict(_))
    ));
}

#[test]
fn test_duplicate_user_type_name_recorded_once() {
    let (temp_dir, writer) = create_writer();

    let object = TypeRecord::builtin(1, "java/lang/Object");
    writer.on_type_loaded(&object, None);

    let origin = ByteOrigin::from_source("file:/tmp/a.jar");
    let first = TypeRecord::user_defined(2, "app/Dup").with_super(object.identity);
    let second = TypeRecord::user_defined(3, "app/Dup").with_super(object.identity);
    assert!(writer.on_type_loaded(&first, Some(&origin)).id().is_some());
    assert!(matches!(
        writer.on_type_loaded(&second, Some(&origin)),
        LoadOutcome::Rejected(Rejection::CatalogConflict(_))
    ));

    let names: Vec<String> = read_entries(&temp_dir).into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["java/lang/Object", "app/Dup"]);
}

#[test]
fn test_header_written_once() {
    let (temp_dir, writer) = create_writer();
    writer.on_type_loaded(&TypeRecord::builtin(1, "A"), None);
    writer.close();

    let text = std::fs::read_to_string(temp_dir.path().join("classes.lst")).unwrap();
    let header: Vec<&str> = text.lines().take_while(|l| l.starts_with('#')).collect();
    assert_eq!(header, ManifestConfig::HEADER.to_vec());
    assert_eq!(text.lines().filter(|l| l.starts_with('#')).count(), 3);
}

#[test]
fn test_output_name_expands_pid() {
    let temp_dir = TempDir::new().unwrap();
    let writer = ClassListWriter::new(ClassListConfig::with_output(
        temp_dir.path().join("classes-%p.lst"),
    ));
    writer.init().unwrap();

    let expected = temp_dir
        .path()
        .join(format!("classes-{}.lst", std::process::id()));
    assert_eq!(writer.output_path(), Some(expected.clone()));
    assert!(expected.exists());
}

#[test]
fn test_concurrent_loads_stay_ordered() {
    const THREADS: u64 = 8;
    const CHAIN: u64 = 50;

    let (temp_dir, writer) = create_writer();
    let writer = Arc::new(writer);

    let object = TypeRecord::builtin(0, "java/lang/Object");
    writer.on_type_loaded(&object, None);

    let handles: Vec<_> = (1..=THREADS)
        .map(|t| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                let mut parent = TypeIdentity(0);
                for k in 0..CHAIN {
                    let identity = t * 1_000 + k;
                    let mut ty = TypeRecord::user_defined(identity, format!("t{t}/C{k}"))
                        .with_super(parent);
                    if k == CHAIN / 2 && t % 2 == 0 {
                        // Everything below this point in the chain is lost.
                        ty = ty.hidden();
                    }
                    let origin = ByteOrigin::from_source(format!("file:/jars/t{t}.jar"));
                    writer.on_type_loaded(&ty, Some(&origin));
                    parent = ty.identity;

                    if k % 7 == 6 {
                        writer.on_type_unloaded(TypeIdentity(identity - 3));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    writer.close();

    let entries = read_entries(&temp_dir);
    verify_topology(&entries).unwrap();

    let ids: Vec<u32> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, (0..entries.len() as u32).collect::<Vec<_>>());
    assert!(entries
        .iter()
        .filter(|e| e.name.starts_with("t2/"))
        .all(|e| e.name.trim_start_matches("t2/C").parse::<u64>().unwrap() < CHAIN / 2));
}

//! Tests for output resolvers.

use std::io::Write;

use tempfile::tempdir;

use crate::io::{DirResolver, MemoryResolver, OutputResolver, TempFileResolver};

#[test]
fn temp_resolver_allocates_a_fresh_named_file_each_time() {
    let dir = tempdir().unwrap();
    let resolver = TempFileResolver::new("customerOutput", ".out").in_dir(dir.path());

    let first = resolver.resolve("EVEN").unwrap();
    let second = resolver.resolve("EVEN").unwrap();
    assert_ne!(first.id(), second.id());

    for target in [&first, &second] {
        let path = std::path::Path::new(target.id());
        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("customerOutputEVEN"), "{name}");
        assert!(name.ends_with(".out"), "{name}");
        // kept after the temp handle is gone
        assert!(path.exists());
    }
}

#[test]
fn dir_resolver_is_stable_per_destination() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("nested");
    let resolver = DirResolver::new(&nested, "customers-", ".jsonl");

    let target = resolver.resolve("ODD").unwrap();
    assert_eq!(
        target.id(),
        nested.join("customers-ODD.jsonl").to_string_lossy()
    );
    assert!(nested.is_dir());
    assert_eq!(
        resolver.resolve("ODD").unwrap().id(),
        target.id()
    );
}

#[test]
fn memory_resolver_shares_sinks_by_destination() {
    let resolver = MemoryResolver::new();
    let target = resolver.resolve("EVEN").unwrap();
    target.open_append().unwrap().write_all(b"line\n").unwrap();

    assert_eq!(resolver.sink("EVEN").lines(), vec!["line"]);
    assert!(resolver.sink("ODD").lines().is_empty());
}

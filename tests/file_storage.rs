use record_cache::prelude::*;
use serde_json::json;

#[test]
fn writer_survives_restart_on_file_host() {
    let dir = tempfile::tempdir().unwrap();

    {
        let writer = CacheWriter::new(FileStorage::new(dir.path()));
        writer.write_field("1", "name", "Alice", Some("Person"));
        writer.write_root_call("viewer", None, "1");
    }

    let writer = CacheWriter::new(FileStorage::new(dir.path()));
    let alice = writer.read_node("1").unwrap();
    assert_eq!(alice.typename(), Some("Person"));
    assert_eq!(alice.get("name"), Some(&json!("Alice")));
    assert_eq!(writer.root_call("viewer").as_deref(), Some("1"));

    writer.clear_storage();
    assert!(!FileStorage::new(dir.path()).path().exists());
    assert!(CacheWriter::new(FileStorage::new(dir.path())).read_node("1").is_none());
}

#[test]
fn corrupt_file_means_empty_cache() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::with_key(dir.path(), "corrupt");
    std::fs::write(storage.path(), "{\"records\": ").unwrap();

    let writer = CacheWriter::new(storage.clone());
    assert!(writer.read_node("1").is_none());

    // The next persisting write replaces the corrupt snapshot.
    writer.write_field("1", "name", "Alice", None);
    let text = storage.get().unwrap().unwrap();
    assert!(RecordStore::from_json(&text).is_ok());
}

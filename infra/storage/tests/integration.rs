use cmesh_storage::*;
use tempfile::TempDir;

#[tokio::test]
async fn path_traversal_blocked() {
    let temp = TempDir::new().unwrap();

    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    assert!(storage.resolve("../etc/passwd").is_err());
    assert!(storage.resolve("foo/../../bar").is_err());
}

#[tokio::test]
async fn write_read_roundtrip_uncompressed() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    let payload = b"hello world";
    storage.write("foo/bar.bin", payload).await.unwrap();
    assert!(storage.exists("foo/bar.bin").unwrap());

    let data = storage.read("foo/bar.bin").await.unwrap();
    assert_eq!(data, payload);
}

#[tokio::test]
async fn write_read_roundtrip_compressed() {
    let temp = TempDir::new().unwrap();
    let storage =
        Storage::builder().root(temp.path()).compression(Compression::Lz4).connect().await.unwrap();

    let payload = vec![1u8; 4096];
    storage.write("bin/data.dat", &payload).await.unwrap();

    let data = storage.read("bin/data.dat").await.unwrap();
    assert_eq!(data, payload);
}

#[tokio::test]
async fn overwrite_replaces_previous_content() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    storage.write("state.bin", b"first").await.unwrap();
    storage.write("state.bin", b"second").await.unwrap();

    assert_eq!(storage.read("state.bin").await.unwrap(), b"second");
}

#[tokio::test]
async fn namespace_isolation() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    let ns_a = storage.namespace("user_a").unwrap();
    let ns_b = storage.namespace("user_b").unwrap();

    ns_a.write("snapshot.bin", b"a").await.unwrap();
    ns_b.write("snapshot.bin", b"b").await.unwrap();

    let a_path = ns_a.resolve("snapshot.bin").unwrap();
    let b_path = ns_b.resolve("snapshot.bin").unwrap();
    assert_ne!(a_path, b_path, "paths must differ across namespaces");

    assert_eq!(ns_a.read("snapshot.bin").await.unwrap(), b"a");
    assert_eq!(ns_b.read("snapshot.bin").await.unwrap(), b"b");
}

#[tokio::test]
async fn namespace_names_are_validated() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    assert!(storage.namespace("").is_err());
    assert!(storage.namespace("../evil").is_err());
    assert!(storage.namespace("ok_name_42").is_ok());
}

#[tokio::test]
async fn delete_and_exists() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    storage.write("tmp/file.txt", b"x").await.unwrap();
    assert!(storage.exists("tmp/file.txt").unwrap());

    storage.delete("tmp/file.txt").await.unwrap();
    assert!(!storage.exists("tmp/file.txt").unwrap());
}

#[tokio::test]
async fn delete_missing_file_reports_not_found() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    let err = storage.delete("never-written.bin").await.unwrap_err();
    assert!(matches!(err, StorageError::FileNotFound { .. }));
}

#[tokio::test]
async fn read_missing_file_reports_not_found() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).connect().await.unwrap();

    let err = storage.read("missing.bin").await.unwrap_err();
    assert!(matches!(err, StorageError::FileNotFound { .. }));
}

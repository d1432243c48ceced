use mrpdiff_log::{SourceError, load_document, read_source};
use std::io::Write;

#[test]
fn test_missing_source_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.log");
    let err = load_document(&path).unwrap_err();
    assert!(matches!(err, SourceError::NotFound { .. }));
    assert!(err.to_string().starts_with("source not found:"));
}

#[test]
fn test_load_document_uses_path_as_source_id() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Site: PLANT2").unwrap();
    writeln!(file, "Job: 1").unwrap();
    let doc = load_document(file.path()).unwrap();
    assert_eq!(doc.source_id, file.path().display().to_string());
    assert_eq!(doc.site.as_deref(), Some("PLANT2"));
    assert_eq!(doc.entries.len(), 2);
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"Job: 7 \xff\xfe\n").unwrap();
    let text = read_source(file.path()).unwrap();
    assert!(text.starts_with("Job: 7"));
}

#[test]
fn test_empty_file_is_valid_document() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let doc = load_document(file.path()).unwrap();
    assert!(doc.is_empty());
}

use crate::builder::DocumentBuilder;
use crate::ir::LogDocument;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Failure to obtain the text of a log. This is the only fatal condition of the pipeline;
/// malformed content never produces an error.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source not found: {source_id}")]
    NotFound { source_id: String },
    #[error("failed to read {source_id}")]
    Unreadable {
        source_id: String,
        #[source]
        source: io::Error,
    },
}

/// Reads a log file as text. Invalid UTF-8 sequences are replaced rather than rejected.
pub fn read_source(path: &Path) -> Result<String, SourceError> {
    let source_id = path.display().to_string();
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SourceError::NotFound { source_id }),
        Err(e) => Err(SourceError::Unreadable { source_id, source: e }),
    }
}

/// Reads and parses a log file in one step. The path doubles as the source identifier.
pub fn load_document(path: &Path) -> Result<LogDocument, SourceError> {
    let text = read_source(path)?;
    log::info!("parsing {} ({} bytes)", path.display(), text.len());
    Ok(DocumentBuilder::new(path.display().to_string()).parse(&text))
}

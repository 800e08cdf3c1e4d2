use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not read the file \"{}\": {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read a source file into text.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected; they
/// can never be commands, so the sanitizer drops them either way.
pub fn read_source(path: impl AsRef<Path>) -> Result<String, SourceError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SourceError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read source");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

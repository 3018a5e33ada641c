// ============================================================
// Layer 6 — Atomic File Writes
// ============================================================
// Every output is written to a temporary file next to its
// destination and renamed into place only once the whole body
// has been flushed. A run that fails half way therefore never
// leaves a truncated vocabulary or model that a later make-mode
// check would consider up to date.
//
//   out/vocab.txt
//     1. create out/            (like `mkdir -p`)
//     2. write  out/.tmpXXXXXX  (NamedTempFile)
//     3. flush + rename → out/vocab.txt
//
// If anything fails before step 3 the temp file is deleted
// when the NamedTempFile is dropped.
//
// Reference: tempfile crate documentation

use anyhow::Result;
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};
use tempfile::NamedTempFile;

use crate::domain::errors::ActionError;

/// Write `path` through `body`, replacing any previous file atomically.
pub fn write_atomically<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| ActionError::io(parent, e))?;

    let temp = NamedTempFile::new_in(parent).map_err(|e| ActionError::io(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        body(&mut writer).map_err(|e| ActionError::io(path, e))?;
        writer.flush().map_err(|e| ActionError::io(path, e))?;
    }
    temp.persist(path).map_err(|e| ActionError::io(path, e.error))?;

    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

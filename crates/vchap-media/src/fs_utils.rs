//! Filesystem helpers for output files.

use std::ffi::OsString;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tokio::fs;

use crate::error::MediaResult;

/// Write `contents` to `dst` so readers never see a partial file.
///
/// The data goes to a temporary sibling first and is then renamed over the
/// destination. Missing parent directories are created.
///
/// # Example
///
/// ```ignore
/// use vchap_media::fs_utils::write_atomic;
///
/// write_atomic("/videos/talk.chapter", b"00:00.000 Chapter 1").await?;
/// ```
pub async fn write_atomic(dst: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> MediaResult<()> {
    let dst = dst.as_ref();

    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
    }

    // Unique per writer; removed on drop unless persisted
    let tmp = tmp_sibling(dst, dir)?;
    fs::write(tmp.path(), contents).await?;

    if let Err(e) = tmp.persist(dst) {
        tracing::error!(
            "Failed to move temp file into place: {} -> {}: {}",
            e.file.path().display(),
            dst.display(),
            e.error
        );
        return Err(e.error.into());
    }

    Ok(())
}

/// `<dir>/.<name>.<random>.tmp`, on the same filesystem as the destination.
fn tmp_sibling(dst: &Path, dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut prefix = OsString::from(".");
    prefix.push(dst.file_name().unwrap_or_default());
    prefix.push(".");
    Builder::new().prefix(&prefix).suffix(".tmp").tempfile_in(dir)
}

//! Chapter file rendering and output.
//!
//! A chapter file holds one line per chapter, `MM:SS.mmm Title`, separated by
//! `\n` without a trailing newline:
//!
//! ```text
//! 00:00.000 Chapter 1
//! 00:11.800 Chapter 2
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;
use vchap_models::ChapterMark;

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::write_atomic;

/// Chapter file path for a video: the extension is replaced by `suffix`.
///
/// `movie.mp4` with `.chapter` becomes `movie.chapter`.
pub fn chapter_file_path(video: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let video = video.as_ref();
    let mut name: OsString = video.file_stem().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    video.with_file_name(name)
}

/// Render chapters to the chapter file format.
pub fn render_chapter_file(chapters: &[ChapterMark]) -> String {
    chapters
        .iter()
        .map(ChapterMark::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write chapters to `path` as UTF-8.
///
/// Returns [`MediaError::OutputExists`] when the file is present and
/// `overwrite` is off.
pub async fn write_chapter_file(
    path: impl AsRef<Path>,
    chapters: &[ChapterMark],
    overwrite: bool,
) -> MediaResult<()> {
    let path = path.as_ref();

    if !overwrite && path.exists() {
        return Err(MediaError::OutputExists(path.to_path_buf()));
    }

    write_atomic(path, render_chapter_file(chapters)).await?;
    debug!(path = %path.display(), chapters = chapters.len(), "Wrote chapter file");
    Ok(())
}

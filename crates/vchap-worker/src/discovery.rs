//! Input video discovery.
//!
//! Patterns are shell-style globs relative to the input directory:
//! `*` and `?` stay within one path component, `**` spans directories and
//! `{mp4,mkv}` expands to alternatives.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};
use vchap_media::is_reencode_input;
use vchap_models::{ConfigError, InputConfig};
use walkdir::WalkDir;

use crate::error::{WorkerError, WorkerResult};

/// Expand `{a,b}` alternation. Nested groups are supported; an unmatched
/// `{` is taken literally.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (i, c) in pattern[open..].char_indices() {
        let i = open + i;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(i),
            _ => {}
        }
    }

    let Some(close) = close else {
        // No closing brace, keep the prefix literal and expand the rest
        let rest = &pattern[open + 1..];
        return expand_braces(rest)
            .into_iter()
            .map(|tail| format!("{}{{{}", &pattern[..open], tail))
            .collect();
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    let mut bounds = vec![open];
    bounds.extend(splits);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| {
            let alternative = &pattern[w[0] + 1..w[1]];
            expand_braces(&format!("{}{}{}", prefix, alternative, suffix))
        })
        .collect()
}

/// Translate one brace-free glob to an anchored regex over `/`-separated
/// relative paths.
pub fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    Regex::new(&out)
}

/// A compiled input pattern.
#[derive(Debug, Clone)]
pub struct InputPattern {
    source: String,
    regexes: Vec<Regex>,
    /// Deepest directory level any alternative can reach, `None` if unbounded
    max_depth: Option<usize>,
}

impl InputPattern {
    pub fn parse(pattern: &str) -> WorkerResult<Self> {
        let alternatives = expand_braces(pattern.trim());

        let regexes = alternatives
            .iter()
            .map(String::as_str)
            .map(glob_to_regex)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "input.pattern",
                message: e.to_string(),
            })?;

        let max_depth = alternatives
            .iter()
            .map(|glob| (!glob.contains("**")).then(|| glob.split('/').count()))
            .try_fold(0, |acc, depth| depth.map(|d| acc.max(d)));

        Ok(Self {
            source: pattern.to_string(),
            regexes,
            max_depth,
        })
    }

    /// Match a path relative to the input directory.
    pub fn matches(&self, relative: &Path) -> bool {
        let Some(normalized) = to_slash_path(relative) else {
            return false;
        };
        self.regexes.iter().any(|re| re.is_match(&normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// `a/b/c.mp4` with forward slashes, `None` for non-UTF-8 or non-normal
/// components.
fn to_slash_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

/// Find the videos to process, sorted and without duplicates.
pub fn discover_inputs(input: &InputConfig) -> WorkerResult<Vec<PathBuf>> {
    let dir = Path::new(&input.path);
    if !dir.is_dir() {
        return Err(WorkerError::DirectoryNotFound(dir.to_path_buf()));
    }

    let pattern = InputPattern::parse(&input.pattern)?;
    let files = collect_files(dir, pattern.max_depth, |relative| pattern.matches(relative));

    if files.is_empty() {
        return Err(WorkerError::no_input_files(dir, pattern.as_str()));
    }

    debug!(
        dir = %dir.display(),
        pattern = pattern.as_str(),
        count = files.len(),
        "Discovered input files"
    );
    Ok(files)
}

/// Recursively find videos eligible for re-encoding.
pub fn find_reencode_inputs(dir: impl AsRef<Path>) -> WorkerResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(WorkerError::DirectoryNotFound(dir.to_path_buf()));
    }
    Ok(collect_files(dir, None, |p| is_reencode_input(p)))
}

fn collect_files<F>(dir: &Path, max_depth: Option<usize>, mut accept: F) -> Vec<PathBuf>
where
    F: FnMut(&Path) -> bool,
{
    let mut walker = WalkDir::new(dir).min_depth(1);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files = BTreeSet::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if accept(relative) {
            files.insert(path.to_path_buf());
        }
    }

    files.into_iter().collect()
}

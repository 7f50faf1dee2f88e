//! Rendering, atomic writing and reading of `.env` files.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::Builder;

/// One line of a generated env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    /// `# text`
    Comment(String),
    /// Empty separator line.
    Blank,
    /// `KEY=value`
    Pair {
        /// Variable name.
        key: String,
        /// Value, written unquoted.
        value: String,
    },
}

impl EnvLine {
    /// Comment line; the `# ` prefix is added when rendering.
    pub fn comment(text: impl Into<String>) -> Self {
        EnvLine::Comment(text.into())
    }

    /// `KEY=value` line.
    pub fn pair(key: &str, value: impl Into<String>) -> Self {
        EnvLine::Pair {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Join lines with `\n`; the result always ends with a newline.
pub fn render_env(lines: &[EnvLine]) -> String {
    let mut out = String::new();
    for line in lines {
        match line {
            EnvLine::Comment(text) => {
                out.push_str("# ");
                out.push_str(text);
            }
            EnvLine::Blank => {}
            EnvLine::Pair { key, value } => {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
            }
        }
        out.push('\n');
    }
    out
}

/// Key/value pairs in document order, comments and blanks dropped.
pub fn env_pairs(lines: &[EnvLine]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter_map(|line| match line {
            EnvLine::Pair { key, value } => Some((key.clone(), value.clone())),
            _ => None,
        })
        .collect()
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// An existing file keeps its mode; a new one gets `0o666` minus the umask,
/// the same as a plain `File::create`.
pub fn write_env_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut tmp = temp_builder().tempfile_in(&dir).with_context(|| {
        format!("failed to create temp file in {}", dir.display())
    })?;
    tmp.write_all(contents.as_bytes())
        .context("failed to write env contents")?;
    if let Some(perms) = existing {
        tmp.as_file().set_permissions(perms).with_context(|| {
            format!("failed to keep permissions of {}", path.display())
        })?;
    }
    tmp.as_file()
        .sync_all()
        .context("failed to flush env contents")?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Read an env file as ordered key/value pairs, keeping duplicates.
pub fn read_env_entries(path: &Path) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for entry in iter {
        let (key, value) = entry
            .with_context(|| format!("failed to parse {}", path.display()))?;
        entries.push((key, value));
    }
    Ok(entries)
}

#[cfg(unix)]
fn temp_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;
    let mut builder = Builder::new();
    builder.permissions(fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_builder() -> Builder<'static, 'static> {
    Builder::new()
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

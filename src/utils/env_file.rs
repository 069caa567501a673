//! Key-value access to a dotenv-style file.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::EnvFileError;

/// What an upsert did to the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PersistOutcome {
    /// Key was absent and a new entry was added.
    Appended,
    /// Key existed with a different value, or existed more than once.
    Updated {
        previous: String,
        duplicates_removed: usize,
    },
    /// Key already held this value.
    Unchanged,
}

/// Store with "set this key" semantics.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, EnvFileError>;

    fn upsert(&self, key: &str, value: &str) -> Result<PersistOutcome, EnvFileError>;
}

/// A `.env` file holding `KEY="value"` lines.
///
/// The file is handled as raw bytes. Lines that are not valid UTF-8 are
/// carried through untouched.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    /// Point at `path`. The file is created on the first upsert if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<u8>, EnvFileError> {
        match fs::read(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn append_entry(&self, key: &str, value: &str) -> Result<(), EnvFileError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "\n{}", format_entry(key, value))?;
        Ok(())
    }

    /// Swap in new contents through a sibling temp file and a rename, so the
    /// existing file is either fully replaced or left as it was.
    fn replace_contents(&self, contents: &[u8]) -> Result<(), EnvFileError> {
        let target = fs::canonicalize(&self.path)?;
        let dir = target.parent().unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;
        temp.as_file()
            .set_permissions(fs::metadata(&target)?.permissions())?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for EnvFile {
    fn get(&self, key: &str) -> Result<Option<String>, EnvFileError> {
        validate_key(key)?;
        let content = self.read()?;
        Ok(content
            .split(|&b| b == b'\n')
            .find_map(|line| entry_value(line, key)))
    }

    fn upsert(&self, key: &str, value: &str) -> Result<PersistOutcome, EnvFileError> {
        validate_key(key)?;
        validate_value(key, value)?;

        let content = self.read()?;
        let segments: Vec<&[u8]> = content.split_inclusive(|&b| b == b'\n').collect();
        let matches: Vec<(usize, String)> = segments
            .iter()
            .enumerate()
            .filter_map(|(i, segment)| entry_value(segment, key).map(|v| (i, v)))
            .collect();

        let Some(((first, previous), duplicates)) = matches.split_first() else {
            self.append_entry(key, value)?;
            tracing::debug!(path = %self.path.display(), key, "appended env entry");
            return Ok(PersistOutcome::Appended);
        };

        if previous == value && duplicates.is_empty() {
            return Ok(PersistOutcome::Unchanged);
        }

        if !duplicates.is_empty() {
            tracing::warn!(
                path = %self.path.display(),
                key,
                count = duplicates.len(),
                "removing duplicate env entries"
            );
        }

        let mut rewritten = Vec::with_capacity(content.len());
        for (i, segment) in segments.iter().enumerate() {
            if i == *first {
                rewritten.extend_from_slice(format_entry(key, value).as_bytes());
                rewritten.extend_from_slice(&segment[line_body(segment).len()..]);
            } else if !duplicates.iter().any(|(d, _)| *d == i) {
                rewritten.extend_from_slice(segment);
            }
        }
        self.replace_contents(&rewritten)?;

        tracing::debug!(path = %self.path.display(), key, "updated env entry");
        Ok(PersistOutcome::Updated {
            previous: previous.clone(),
            duplicates_removed: duplicates.len(),
        })
    }
}

/// `segment` without its trailing line break.
fn line_body(segment: &[u8]) -> &[u8] {
    let end = segment
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n'))
        .map_or(0, |i| i + 1);
    &segment[..end]
}

/// Keys are ASCII, so a lossy decode never changes whether a line matches.
fn entry_value(segment: &[u8], key: &str) -> Option<String> {
    let line = String::from_utf8_lossy(line_body(segment));
    parse_entry(&line, key).map(str::to_string)
}

fn format_entry(key: &str, value: &str) -> String {
    format!("{key}=\"{value}\"")
}

/// Value of `line` if it assigns `key`, with surrounding quotes removed.
fn parse_entry<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
    let rest = line.strip_prefix(key)?;
    let value = rest.trim_start().strip_prefix('=')?.trim();
    Some(unquote(value))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn validate_key(key: &str) -> Result<(), EnvFileError> {
    let mut chars = key.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(EnvFileError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<(), EnvFileError> {
    if value.contains(['"', '\n', '\r']) {
        return Err(EnvFileError::InvalidValue {
            key: key.to_string(),
            reason: "value must not contain quotes or line breaks".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const KEY: &str = "LLAMACLOUD_PIPELINE_ID";

    fn env_file_with(content: impl AsRef<[u8]>) -> (tempfile::TempDir, EnvFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, content).unwrap();
        (dir, EnvFile::new(path))
    }

    #[test]
    fn test_append_preserves_prior_content() {
        let prior = "OPENAI_API_KEY=\"sk-1\"\nLLAMACLOUD_API_KEY=\"llx-2\"";
        let (_dir, store) = env_file_with(prior);

        let outcome = store.upsert(KEY, "abc123").unwrap();

        assert_eq!(outcome, PersistOutcome::Appended);
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, format!("{prior}\nLLAMACLOUD_PIPELINE_ID=\"abc123\""));
    }

    #[test]
    fn test_append_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = EnvFile::new(dir.path().join(".env"));

        store.upsert(KEY, "abc123").unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "\nLLAMACLOUD_PIPELINE_ID=\"abc123\"");
    }

    #[test]
    fn test_second_upsert_replaces_in_place() {
        let (_dir, store) = env_file_with("A=1\n");

        store.upsert(KEY, "first").unwrap();
        let outcome = store.upsert(KEY, "second").unwrap();

        assert_eq!(
            outcome,
            PersistOutcome::Updated {
                previous: "first".to_string(),
                duplicates_removed: 0
            }
        );
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "A=1\n\nLLAMACLOUD_PIPELINE_ID=\"second\"");
        assert_eq!(content.matches(KEY).count(), 1);
    }

    #[test]
    fn test_same_value_is_unchanged() {
        let (_dir, store) = env_file_with("LLAMACLOUD_PIPELINE_ID=\"abc123\"\nB=2\n");

        let outcome = store.upsert(KEY, "abc123").unwrap();

        assert_eq!(outcome, PersistOutcome::Unchanged);
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "LLAMACLOUD_PIPELINE_ID=\"abc123\"\nB=2\n");
    }

    #[test]
    fn test_collapses_legacy_duplicates() {
        let (_dir, store) = env_file_with(
            "A=1\nLLAMACLOUD_PIPELINE_ID=\"old\"\nB=2\nLLAMACLOUD_PIPELINE_ID=\"older\"\r\nC=3",
        );

        let outcome = store.upsert(KEY, "new").unwrap();

        assert_eq!(
            outcome,
            PersistOutcome::Updated {
                previous: "old".to_string(),
                duplicates_removed: 1
            }
        );
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "A=1\nLLAMACLOUD_PIPELINE_ID=\"new\"\nB=2\nC=3");
    }

    #[test]
    fn test_similar_key_prefix_is_not_matched() {
        let (_dir, store) = env_file_with("LLAMACLOUD_PIPELINE_ID_OLD=\"x\"");

        assert_eq!(store.get(KEY).unwrap(), None);
        assert_eq!(store.upsert(KEY, "abc").unwrap(), PersistOutcome::Appended);
    }

    #[test]
    fn test_get_handles_export_and_quotes() {
        let (_dir, store) = env_file_with("export LLAMACLOUD_PIPELINE_ID = 'abc'\n");
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_rejects_bad_key_and_value() {
        let (_dir, store) = env_file_with("");
        assert!(matches!(
            store.upsert("1BAD", "x"),
            Err(EnvFileError::InvalidKey(_))
        ));
        assert!(matches!(
            store.upsert(KEY, "a\"b"),
            Err(EnvFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_append_to_non_utf8_file_keeps_bytes() {
        let prior: &[u8] = b"# caf\xe9\nA=1";
        let (_dir, store) = env_file_with(prior);

        let outcome = store.upsert(KEY, "abc123").unwrap();

        assert_eq!(outcome, PersistOutcome::Appended);
        let mut expected = prior.to_vec();
        expected.extend_from_slice(b"\nLLAMACLOUD_PIPELINE_ID=\"abc123\"");
        assert_eq!(fs::read(store.path()).unwrap(), expected);
    }

    #[test]
    fn test_update_in_non_utf8_file_keeps_other_lines() {
        let (_dir, store) =
            env_file_with(b"# caf\xe9\nLLAMACLOUD_PIPELINE_ID=\"old\"\nB=\xff\n".as_slice());

        let outcome = store.upsert(KEY, "new").unwrap();

        assert_eq!(
            outcome,
            PersistOutcome::Updated {
                previous: "old".to_string(),
                duplicates_removed: 0
            }
        );
        assert_eq!(
            fs::read(store.path()).unwrap(),
            b"# caf\xe9\nLLAMACLOUD_PIPELINE_ID=\"new\"\nB=\xff\n".to_vec()
        );
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_rewrite_leaves_no_stray_files() {
        let (dir, store) = env_file_with("LLAMACLOUD_PIPELINE_ID=\"old\"\n");

        store.upsert(KEY, "new").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(".env")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = env_file_with("LLAMACLOUD_PIPELINE_ID=\"old\"\n");
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o600)).unwrap();

        store.upsert(KEY, "new").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_through_symlink_updates_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("shared.env");
        fs::write(&target, "LLAMACLOUD_PIPELINE_ID=\"old\"\n").unwrap();
        let link = dir.path().join(".env");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let store = EnvFile::new(link.clone());

        store.upsert(KEY, "new").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "LLAMACLOUD_PIPELINE_ID=\"new\"\n"
        );
    }
}

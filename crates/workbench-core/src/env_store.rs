//! Keyed line store for the orchestrator's `.env` file.
//!
//! The file is the source of truth — every operation reads it fresh from
//! disk, and writes replace only the targeted `KEY=value` line, leaving
//! comments, unrelated keys, and even pre-existing duplicate key lines
//! untouched. When the key line is duplicated, the first match wins.

use std::path::Path;

use thiserror::Error;

pub const ENV_FILE_NAME: &str = ".env";
pub const PRIVATE_KEY_VAR: &str = "CRE_ETH_PRIVATE_KEY";
pub const TARGET_VAR: &str = "CRE_TARGET";
pub const DEFAULT_TARGET: &str = "staging-settings";

/// Values that mark a key slot as still holding template text. Matched as
/// case-sensitive substrings of the stored value, deliberately permissive.
const PLACEHOLDER_MARKERS: &[&str] = &["your_", "your-eth-private-key", "placeholder"];

#[derive(Debug, Error)]
pub enum EnvStoreError {
    #[error("{0}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of a private-key status read. Read failures are folded into
/// `configured: false` with a diagnostic instead of surfacing as errors.
#[derive(Debug, Clone)]
pub struct KeyStatus {
    pub configured: bool,
    pub path: String,
    pub error: Option<String>,
}

/// Report whether the `.env` file holds a usable private key.
pub fn read_private_key_status(path: &Path) -> KeyStatus {
    let display = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(content) => KeyStatus {
            configured: is_key_configured(&content),
            path: display,
            error: None,
        },
        Err(e) => KeyStatus {
            configured: false,
            path: display,
            error: Some(e.to_string()),
        },
    }
}

/// Validate and store a private key, preserving all unrelated lines.
///
/// Accepts an optional `0x` prefix and surrounding whitespace; the stored
/// value is the bare 64-hex-character key. Validation failure leaves the
/// file untouched.
pub fn write_private_key(path: &Path, raw_key: &str) -> Result<(), EnvStoreError> {
    let key = clean_private_key(raw_key)?;

    let content = std::fs::read_to_string(path).unwrap_or_default();
    let mut updated = upsert_line(&content, PRIVATE_KEY_VAR, &key);
    if first_value(&updated, TARGET_VAR).is_none() {
        updated.push_str(&format!("{}={}\n", TARGET_VAR, DEFAULT_TARGET));
    }

    std::fs::write(path, updated)?;
    Ok(())
}

/// Create the `.env` file (and its parent directories) when absent.
/// Existing files are never touched. Returns whether a file was created.
pub fn ensure_env_file(
    path: &Path,
    bootstrap_key: Option<&str>,
    bootstrap_target: Option<&str>,
) -> Result<bool, EnvStoreError> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = format!(
        "{}={}\n{}={}\n",
        PRIVATE_KEY_VAR,
        bootstrap_key.unwrap_or(""),
        TARGET_VAR,
        bootstrap_target.unwrap_or(DEFAULT_TARGET),
    );
    std::fs::write(path, content)?;
    Ok(true)
}

/// Strip whitespace and an optional `0x` prefix, then require exactly 64
/// hexadecimal characters.
fn clean_private_key(raw: &str) -> Result<String, EnvStoreError> {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if bare.len() != 64 || !bare.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EnvStoreError::InvalidKey(
            "private key must be 64 hexadecimal characters (optionally 0x-prefixed)".to_string(),
        ));
    }
    Ok(bare.to_string())
}

/// Value of the first `key=` line, if any.
fn first_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')))
}

fn is_key_configured(content: &str) -> bool {
    let Some(value) = first_value(content, PRIVATE_KEY_VAR) else {
        return false;
    };
    let value = value.trim();
    !value.is_empty() && !PLACEHOLDER_MARKERS.iter().any(|marker| value.contains(marker))
}

/// Replace the first `key=` line with `key=value`, or append one. Every
/// other line — later duplicates included — passes through unchanged.
fn upsert_line(content: &str, key: &str, value: &str) -> String {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let replacement = format!("{}={}", key, value);

    match lines
        .iter()
        .position(|line| line.starts_with(key) && line[key.len()..].starts_with('='))
    {
        Some(index) => lines[index] = replacement,
        None => lines.push(replacement),
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const KEY: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn test_clean_private_key() {
        assert_eq!(clean_private_key(KEY).unwrap(), KEY);
        assert_eq!(clean_private_key(&format!("0x{}", KEY)).unwrap(), KEY);
        assert_eq!(clean_private_key(&format!("  0x{}  ", KEY)).unwrap(), KEY);

        let upper = KEY.to_uppercase();
        assert_eq!(clean_private_key(&upper).unwrap(), upper);

        assert!(clean_private_key("").is_err());
        assert!(clean_private_key("0x").is_err());
        assert!(clean_private_key(&KEY[..63]).is_err());
        assert!(clean_private_key(&format!("{}a", KEY)).is_err());
        assert!(clean_private_key(&format!("{}g", &KEY[..63])).is_err());
        // 0x stripped exactly once; a doubled prefix leaves non-hex chars.
        assert!(clean_private_key(&format!("0x0x{}", &KEY[..60])).is_err());
    }

    #[test]
    fn test_configured_detection() {
        assert!(is_key_configured(&format!("CRE_ETH_PRIVATE_KEY={}\n", KEY)));
        assert!(!is_key_configured(""));
        assert!(!is_key_configured("CRE_TARGET=staging-settings\n"));
        assert!(!is_key_configured("CRE_ETH_PRIVATE_KEY=\n"));
        assert!(!is_key_configured("CRE_ETH_PRIVATE_KEY=   \n"));
        assert!(!is_key_configured(
            "CRE_ETH_PRIVATE_KEY=your_private_key_here\n"
        ));
        assert!(!is_key_configured(
            "CRE_ETH_PRIVATE_KEY=<your-eth-private-key>\n"
        ));
        assert!(!is_key_configured("CRE_ETH_PRIVATE_KEY=placeholder\n"));
        // The check is a substring match, not full-value equality.
        assert!(!is_key_configured(
            "CRE_ETH_PRIVATE_KEY=abc_placeholder_def\n"
        ));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let content = format!(
            "CRE_ETH_PRIVATE_KEY=\nCRE_ETH_PRIVATE_KEY={}\n",
            KEY
        );
        // The first (empty) line is authoritative.
        assert!(!is_key_configured(&content));
    }

    #[test]
    fn test_key_name_must_match_exactly() {
        // A longer variable sharing the prefix is not the key.
        assert!(!is_key_configured(&format!(
            "CRE_ETH_PRIVATE_KEY_BACKUP={}\n",
            KEY
        )));
    }

    #[test]
    fn test_upsert_preserves_unrelated_lines() {
        let content = "# orchestrator settings\nCRE_TARGET=production-settings\nCRE_ETH_PRIVATE_KEY=old\nEXTRA=1\n";
        let updated = upsert_line(content, PRIVATE_KEY_VAR, KEY);
        assert_eq!(
            updated,
            format!(
                "# orchestrator settings\nCRE_TARGET=production-settings\nCRE_ETH_PRIVATE_KEY={}\nEXTRA=1\n",
                KEY
            )
        );
    }

    #[test]
    fn test_upsert_replaces_first_match_only() {
        let content = "CRE_ETH_PRIVATE_KEY=old1\nCRE_ETH_PRIVATE_KEY=old2\n";
        let updated = upsert_line(content, PRIVATE_KEY_VAR, KEY);
        assert_eq!(
            updated,
            format!("CRE_ETH_PRIVATE_KEY={}\nCRE_ETH_PRIVATE_KEY=old2\n", KEY)
        );
    }

    #[test]
    fn test_upsert_appends_when_absent() {
        let updated = upsert_line("CRE_TARGET=staging-settings\n", PRIVATE_KEY_VAR, KEY);
        assert_eq!(
            updated,
            format!("CRE_TARGET=staging-settings\nCRE_ETH_PRIVATE_KEY={}\n", KEY)
        );
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");

        let status = read_private_key_status(&env_path);
        assert!(!status.configured);
        assert!(status.error.is_some());

        write_private_key(&env_path, &format!("0x{}", KEY)).unwrap();
        let status = read_private_key_status(&env_path);
        assert!(status.configured);
        assert!(status.error.is_none());

        let content = std::fs::read_to_string(&env_path).unwrap();
        assert_eq!(
            content,
            format!("CRE_ETH_PRIVATE_KEY={}\nCRE_TARGET={}\n", KEY, DEFAULT_TARGET)
        );
    }

    #[test]
    fn test_write_keeps_existing_target() {
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        std::fs::write(&env_path, "CRE_TARGET=production-settings\n").unwrap();

        write_private_key(&env_path, KEY).unwrap();
        let content = std::fs::read_to_string(&env_path).unwrap();
        assert_eq!(
            content,
            format!(
                "CRE_TARGET=production-settings\nCRE_ETH_PRIVATE_KEY={}\n",
                KEY
            )
        );
    }

    #[test]
    fn test_invalid_key_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        let original = "CRE_ETH_PRIVATE_KEY=old\nEXTRA=1\n";
        std::fs::write(&env_path, original).unwrap();

        let err = write_private_key(&env_path, "not-a-key").unwrap_err();
        assert!(matches!(err, EnvStoreError::InvalidKey(_)));
        assert_eq!(std::fs::read_to_string(&env_path).unwrap(), original);
    }

    #[test]
    fn test_ensure_env_file() {
        let dir = tempdir().unwrap();
        let env_path = dir.path().join("nested").join(".env");

        let created = ensure_env_file(&env_path, None, None).unwrap();
        assert!(created);
        assert_eq!(
            std::fs::read_to_string(&env_path).unwrap(),
            format!("CRE_ETH_PRIVATE_KEY=\nCRE_TARGET={}\n", DEFAULT_TARGET)
        );

        // Second call is a no-op even after the file changed.
        std::fs::write(&env_path, "CUSTOM=1\n").unwrap();
        let created = ensure_env_file(&env_path, Some(KEY), Some("local")).unwrap();
        assert!(!created);
        assert_eq!(std::fs::read_to_string(&env_path).unwrap(), "CUSTOM=1\n");
    }

    #[test]
    fn test_ensure_env_file_uses_bootstrap_values() {
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");

        ensure_env_file(&env_path, Some(KEY), Some("local-settings")).unwrap();
        assert_eq!(
            std::fs::read_to_string(&env_path).unwrap(),
            format!("CRE_ETH_PRIVATE_KEY={}\nCRE_TARGET=local-settings\n", KEY)
        );
    }
}

//! Tracked targets and their two-field-per-line persistence
//!
//! The target list round-trips only identity and required count; found
//! counts live for one session.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read target list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write target list {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One card the tracker is counting sightings of.
///
/// `required_raw` holds the live-editable required-count text; it is
/// re-parsed every poll cycle, with parse failures coerced to 0.
#[derive(Debug, Clone)]
pub struct TrackedTarget {
    pub name: String,
    pub required_raw: String,
    pub found: u32,
    pub last_found: Option<Instant>,
}

impl TrackedTarget {
    pub fn new(name: impl Into<String>, required: u32) -> Self {
        Self {
            name: name.into(),
            required_raw: required.to_string(),
            found: 0,
            last_found: None,
        }
    }

    /// Parse the live required-count text; malformed input counts as 0.
    pub fn required(&self) -> u32 {
        self.required_raw.trim().parse().unwrap_or(0)
    }

    pub fn satisfied(&self) -> bool {
        self.found >= self.required()
    }

    pub fn reset(&mut self) {
        self.found = 0;
        self.last_found = None;
    }
}

/// Result of loading the target-list file, with malformed lines reported
/// rather than silently dropped.
#[derive(Debug, Default)]
pub struct TargetListLoad {
    pub entries: Vec<(String, u32)>,
    pub skipped_lines: Vec<usize>,
}

/// Load the `name,required` target list.
///
/// A missing file is a valid empty state (`Ok(None)`); an unreadable file
/// is an error. Malformed lines are skipped and reported in the result.
pub fn load_target_list(path: &Path) -> Result<Option<TargetListLoad>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut load = TargetListLoad::default();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_target_line(line) {
            Some(entry) => load.entries.push(entry),
            None => load.skipped_lines.push(idx + 1),
        }
    }
    Ok(Some(load))
}

fn parse_target_line(line: &str) -> Option<(String, u32)> {
    let (name, required) = line.split_once(',')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let required = required.trim().parse().ok()?;
    Some((name.to_string(), required))
}

/// Persist the target list, one `name,required` pair per line.
pub fn save_target_list(path: &Path, targets: &[TrackedTarget]) -> Result<(), ConfigError> {
    let mut content = String::new();
    for target in targets {
        content.push_str(&format!("{},{}\n", target.name, target.required()));
    }
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_coerces_malformed_input_to_zero() {
        let mut target = TrackedTarget::new("card.png", 4);
        assert_eq!(target.required(), 4);

        target.required_raw = "abc".to_string();
        assert_eq!(target.required(), 0);
        // With required 0 the target is trivially satisfied
        assert!(target.satisfied());
    }

    #[test]
    fn test_parse_target_line() {
        assert_eq!(
            parse_target_line("super_creek.png,4"),
            Some(("super_creek.png".to_string(), 4))
        );
        assert_eq!(
            parse_target_line("  spaced.png , 2 "),
            Some(("spaced.png".to_string(), 2))
        );
        assert_eq!(parse_target_line("no_comma.png"), None);
        assert_eq!(parse_target_line("bad.png,abc"), None);
        assert_eq!(parse_target_line(",3"), None);
    }

    #[test]
    fn test_load_missing_file_is_valid_empty_state() {
        let path = std::env::temp_dir().join("card-macro-run-no-such-config.txt");
        let loaded = load_target_list(&path).expect("missing file is not an error");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_reports_malformed_lines() {
        let path = std::env::temp_dir().join("card-macro-run-test-config.txt");
        std::fs::write(&path, "good.png,3\nbroken line\nother.png,1\n").unwrap();

        let loaded = load_target_list(&path)
            .expect("readable file")
            .expect("file exists");
        assert_eq!(
            loaded.entries,
            vec![("good.png".to_string(), 3), ("other.png".to_string(), 1)]
        );
        assert_eq!(loaded.skipped_lines, vec![2]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_round_trips_entries() {
        let path = std::env::temp_dir().join("card-macro-run-test-save.txt");
        let targets = vec![
            TrackedTarget::new("a.png", 2),
            TrackedTarget::new("b.png", 5),
        ];
        save_target_list(&path, &targets).unwrap();

        let loaded = load_target_list(&path).unwrap().unwrap();
        assert_eq!(
            loaded.entries,
            vec![("a.png".to_string(), 2), ("b.png".to_string(), 5)]
        );
        assert!(loaded.skipped_lines.is_empty());

        std::fs::remove_file(&path).ok();
    }
}

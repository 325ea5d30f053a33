//! The link list to relay and the log of links already relayed.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// One link from the list, with its position among the list's entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLink {
    pub index: usize,
    pub reference: String,
}

/// Line-delimited list of video links.
///
/// Blank lines and lines starting with `#` are not entries. Indices count
/// entries only, after the optional reversal, so they stay stable across
/// resumed runs.
#[derive(Debug, Clone)]
pub struct LinkFile {
    path: PathBuf,
    reverse: bool,
}

impl LinkFile {
    pub fn new(path: impl Into<PathBuf>, reverse: bool) -> Self {
        Self {
            path: path.into(),
            reverse,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry in processing order.
    pub fn read_all(&self) -> Result<Vec<PendingLink>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!(
                "cannot read links file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(parse_links(&content, self.reverse))
    }

    /// Entries whose reference is not in `completed`.
    pub fn read_pending(&self, completed: &HashSet<String>) -> Result<Vec<PendingLink>> {
        let all = self.read_all()?;
        let total = all.len();
        let pending: Vec<_> = all
            .into_iter()
            .filter(|link| !completed.contains(&link.reference))
            .collect();

        tracing::debug!(
            "{} of {} links pending in {}",
            pending.len(),
            total,
            self.path.display()
        );
        Ok(pending)
    }
}

fn parse_links(content: &str, reverse: bool) -> Vec<PendingLink> {
    let mut lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    if reverse {
        lines.reverse();
    }

    lines
        .into_iter()
        .enumerate()
        .map(|(index, reference)| PendingLink {
            index,
            reference: reference.to_string(),
        })
        .collect()
}

/// A relayed link as recorded in the progress log.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    pub completed_at: DateTime<Utc>,
    pub index: usize,
    pub reference: String,
}

/// Append-only log of relayed links, one `timestamp<TAB>index<TAB>reference`
/// line per link.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All recorded entries. A missing log is empty; malformed lines are
    /// skipped with a warning.
    pub fn entries(&self) -> Result<Vec<ProgressEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_entry(line) {
                Some(entry) => entries.push(entry),
                None => tracing::warn!(
                    "Skipping malformed line {} in {}",
                    n + 1,
                    self.path.display()
                ),
            }
        }
        Ok(entries)
    }

    /// References of every recorded link.
    pub fn completed(&self) -> Result<HashSet<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|e| e.reference)
            .collect())
    }

    /// Record `reference` as relayed now.
    pub fn append(&self, index: usize, reference: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{}\t{}\t{}",
            Utc::now().to_rfc3339(),
            index,
            reference
        )?;
        Ok(())
    }
}

fn parse_entry(line: &str) -> Option<ProgressEntry> {
    let mut parts = line.splitn(3, '\t');
    let completed_at = DateTime::parse_from_rfc3339(parts.next()?)
        .ok()?
        .with_timezone(&Utc);
    let index = parts.next()?.parse().ok()?;
    let reference = parts.next()?.trim();
    if reference.is_empty() {
        return None;
    }
    Some(ProgressEntry {
        completed_at,
        index,
        reference: reference.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blanks_and_comments() {
        let links = parse_links("  a \n\n# note\nb\r\n   \nc", false);
        let refs: Vec<_> = links.iter().map(|l| l.reference.as_str()).collect();
        assert_eq!(refs, ["a", "b", "c"]);
        assert_eq!(links[2].index, 2);
    }

    #[test]
    fn reverse_renumbers_from_the_bottom() {
        let links = parse_links("a\nb\nc\n", true);
        assert_eq!(
            links[0],
            PendingLink {
                index: 0,
                reference: "c".into()
            }
        );
        assert_eq!(links[2].reference, "a");
    }

    #[test]
    fn pending_excludes_completed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "a\nb\nc\n").unwrap();

        let completed: HashSet<String> = ["b".to_string()].into_iter().collect();
        let pending = LinkFile::new(&path, false).read_pending(&completed).unwrap();
        assert_eq!(
            pending,
            vec![
                PendingLink {
                    index: 0,
                    reference: "a".into()
                },
                PendingLink {
                    index: 2,
                    reference: "c".into()
                },
            ]
        );
    }

    #[test]
    fn missing_links_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = LinkFile::new(dir.path().join("nope.txt"), false).read_all();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn progress_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = ProgressLog::new(dir.path().join("state").join("progress.log"));
        assert!(log.completed().unwrap().is_empty());

        log.append(0, "https://youtu.be/a").unwrap();
        log.append(3, "https://youtu.be/d").unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].index, 3);
        assert!(log.completed().unwrap().contains("https://youtu.be/a"));
    }

    #[test]
    fn malformed_progress_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.log");
        std::fs::write(
            &path,
            "garbage\n2024-03-01T10:00:00+00:00\t1\thttps://youtu.be/b\n2024-03-01T10:00:00+00:00\tx\ty\n",
        )
        .unwrap();

        let entries = ProgressLog::new(&path).entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reference, "https://youtu.be/b");
    }
}

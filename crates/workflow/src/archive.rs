//! Output archive for generated newsletters and social posts.
//!
//! Layout under the output root:
//!
//! ```text
//! newsletters/newsletter_day_<n>_<YYYYmmdd>.txt
//! social/social_<YYYYmmdd_HHMMSS>.txt
//! ```
//!
//! Saving is best-effort: a write failure (read-only filesystem, missing
//! permissions) is logged and reported as [`SaveLocation::NotSaved`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const NEWSLETTERS_DIR: &str = "newsletters";
const SOCIAL_DIR: &str = "social";

/// Where a generated text ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveLocation {
    Saved(PathBuf),
    NotSaved,
}

impl SaveLocation {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Saved(p) => Some(p),
            Self::NotSaved => None,
        }
    }
}

impl fmt::Display for SaveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(p) => write!(f, "{}", p.display()),
            Self::NotSaved => f.write_str("Not saved"),
        }
    }
}

impl Serialize for SaveLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One archived newsletter in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub filename: String,
    /// First line of the file, or the file name when empty
    pub title: String,
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Newsletter not found: {0}")]
    NotFound(String),

    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct OutputArchive {
    root: PathBuf,
}

impl OutputArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn newsletters_dir(&self) -> PathBuf {
        self.root.join(NEWSLETTERS_DIR)
    }

    pub fn social_dir(&self) -> PathBuf {
        self.root.join(SOCIAL_DIR)
    }

    pub fn save_newsletter(&self, text: &str, day_number: i64, date: NaiveDate) -> SaveLocation {
        let filename = format!("newsletter_day_{day_number}_{}.txt", date.format("%Y%m%d"));
        write_best_effort(&self.newsletters_dir(), &filename, text)
    }

    pub fn save_social(&self, text: &str, at: NaiveDateTime) -> SaveLocation {
        let filename = format!("social_{}.txt", at.format("%Y%m%d_%H%M%S"));
        write_best_effort(&self.social_dir(), &filename, text)
    }

    /// All archived newsletters, newest first by the date and day number in
    /// the file name. Names that do not follow the pattern sort last.
    pub fn list_newsletters(&self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let dir = self.newsletters_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut listing = Vec::new();
        for entry in entries {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(".txt") {
                continue;
            }
            let path = entry.path();
            let first_line = match std::fs::read_to_string(&path) {
                Ok(content) => content.lines().next().map(str::to_string),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable newsletter, titling by file name");
                    None
                }
            };
            let title = first_line
                .filter(|line| !line.is_empty())
                .unwrap_or_else(|| filename.clone());
            listing.push(ArchiveEntry { filename, title, path });
        }

        listing.sort_by(|a, b| {
            newsletter_sort_key(&b.filename)
                .cmp(&newsletter_sort_key(&a.filename))
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(listing)
    }

    /// Read one archived newsletter by bare file name.
    pub fn read_newsletter(&self, filename: &str) -> Result<String, ArchiveError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(ArchiveError::InvalidName(filename.to_string()));
        }

        let path = self.newsletters_dir().join(filename);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `(date, day)` parsed from `newsletter_day_<n>_<YYYYmmdd>.txt`.
fn newsletter_sort_key(filename: &str) -> Option<(NaiveDate, i64)> {
    let stem = filename.strip_prefix("newsletter_day_")?.strip_suffix(".txt")?;
    let (day, date) = stem.rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    Some((date, day.parse().ok()?))
}

fn write_best_effort(dir: &Path, filename: &str, text: &str) -> SaveLocation {
    let path = dir.join(filename);
    let result = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, text));
    match result {
        Ok(()) => {
            debug!(path = %path.display(), "Saved output");
            SaveLocation::Saved(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to save output");
            SaveLocation::NotSaved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn newsletter_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive = OutputArchive::new(dir.path());

        let saved = archive.save_newsletter("Day 61\nbody", 61, date(2026, 3, 2));
        let path = saved.path().unwrap();
        assert!(path.ends_with("newsletters/newsletter_day_61_20260302.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Day 61\nbody");
    }

    #[test]
    fn social_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive = OutputArchive::new(dir.path());
        let at = date(2026, 3, 2).and_hms_opt(9, 5, 7).unwrap();

        let saved = archive.save_social("ZM post", at);
        assert!(saved.path().unwrap().ends_with("social/social_20260302_090507.txt"));
    }

    #[test]
    fn unwritable_root_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("output");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let saved = OutputArchive::new(&blocker).save_newsletter("x", 1, date(2026, 1, 1));
        assert_eq!(saved, SaveLocation::NotSaved);
        assert_eq!(saved.to_string(), "Not saved");
        assert_eq!(serde_json::to_string(&saved).unwrap(), "\"Not saved\"");
    }

    #[test]
    fn listing_is_newest_first_with_titles() {
        let dir = tempfile::tempdir().unwrap();
        let archive = OutputArchive::new(dir.path());
        archive.save_newsletter("Day 1 title\nbody", 1, date(2026, 1, 1));
        archive.save_newsletter("Day 2 title\nbody", 2, date(2026, 1, 2));
        archive.save_newsletter("", 3, date(2026, 1, 3));
        std::fs::write(archive.newsletters_dir().join("notes.md"), "skip").unwrap();

        let listing = archive.list_newsletters().unwrap();
        let names: Vec<_> = listing.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(
            names,
            [
                "newsletter_day_3_20260103.txt",
                "newsletter_day_2_20260102.txt",
                "newsletter_day_1_20260101.txt",
            ]
        );
        assert_eq!(listing[0].title, "newsletter_day_3_20260103.txt");
        assert_eq!(listing[1].title, "Day 2 title");
    }

    #[test]
    fn listing_orders_by_date_not_text() {
        let dir = tempfile::tempdir().unwrap();
        let archive = OutputArchive::new(dir.path());
        archive.save_newsletter("Day 9", 9, date(2026, 1, 9));
        archive.save_newsletter("Day 100", 100, date(2026, 4, 10));
        archive.save_newsletter("Day 10", 10, date(2026, 1, 10));
        std::fs::write(archive.newsletters_dir().join("draft.txt"), "Draft").unwrap();

        let listing = archive.list_newsletters().unwrap();
        let names: Vec<_> = listing.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(
            names,
            [
                "newsletter_day_100_20260410.txt",
                "newsletter_day_10_20260110.txt",
                "newsletter_day_9_20260109.txt",
                "draft.txt",
            ]
        );
    }

    #[test]
    fn non_utf8_entry_does_not_fail_listing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = OutputArchive::new(dir.path());
        archive.save_newsletter("Day 5 title", 5, date(2026, 1, 5));
        let broken = archive.newsletters_dir().join("newsletter_day_4_20260104.txt");
        std::fs::write(&broken, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let listing = archive.list_newsletters().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].title, "Day 5 title");
        assert_eq!(listing[1].title, "newsletter_day_4_20260104.txt");
    }

    #[test]
    fn missing_archive_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(OutputArchive::new(dir.path()).list_newsletters().unwrap().is_empty());
    }

    #[test]
    fn read_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let archive = OutputArchive::new(dir.path());

        for name in ["../secret.txt", "a/b.txt", "..", "a\\b.txt", ""] {
            assert!(
                matches!(archive.read_newsletter(name), Err(ArchiveError::InvalidName(_))),
                "{name} should be rejected"
            );
        }
        assert!(matches!(
            archive.read_newsletter("newsletter_day_9_20260109.txt"),
            Err(ArchiveError::NotFound(_))
        ));

        archive.save_newsletter("Day 9", 9, date(2026, 1, 9));
        assert_eq!(archive.read_newsletter("newsletter_day_9_20260109.txt").unwrap(), "Day 9");
    }
}

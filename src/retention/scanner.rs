//! Directory scanning.
//!
//! Lists the direct children of a target directory, filters them by entry
//! kind and dotfile visibility, and snapshots each survivor's paths and
//! modification time. A scan either yields a complete snapshot or fails as a
//! whole; partial results are never returned.

use std::{
    ffi::OsStr,
    fs, io,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Which kind of directory child a scan considers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryKind {
    /// Anything that is not a directory (regular files, symlinks, ...).
    #[default]
    File,
    /// Directories only. Symlinks to directories are not followed.
    Directory,
}

impl EntryKind {
    pub fn from_directories_flag(directories: bool) -> Self {
        if directories {
            Self::Directory
        } else {
            Self::File
        }
    }

    fn matches(self, file_type: fs::FileType) -> bool {
        match self {
            Self::File => !file_type.is_dir(),
            Self::Directory => file_type.is_dir(),
        }
    }
}

/// Filter applied to the children of the scanned directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub entry_kind: EntryKind,
    pub include_dotfiles: bool,
}

/// One scanned child of the target directory.
///
/// Records are immutable snapshots; nothing re-reads the filesystem after the
/// scan completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryRecord {
    /// The caller's directory argument joined with the child name. Display only.
    pub relative_path: PathBuf,
    /// Canonical directory joined with the child name. Used for all I/O.
    pub full_path: PathBuf,
    /// Last modification time, the sole ordering key.
    pub modified: DateTime<Utc>,
}

impl DirEntryRecord {
    pub fn new(
        relative_path: impl Into<PathBuf>,
        full_path: impl Into<PathBuf>,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            full_path: full_path.into(),
            modified,
        }
    }
}

/// Errors that abort a scan before any retention decision is made.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Could not find directory path: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Could not read contents of directory at \"{}\": {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File \"{name}\" removed after reading dir: {}", dir.display())]
    EntryVanished {
        name: String,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Scan the direct children of `dir` that pass `options`.
///
/// Entries are returned in directory-listing order.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn scan_directory(dir: &Path, options: ScanOptions) -> Result<Vec<DirEntryRecord>, ScanError> {
    let full_dir = fs::canonicalize(dir).map_err(|source| ScanError::NotFound {
        path: dir.to_path_buf(),
        source,
    })?;

    let metadata = fs::metadata(&full_dir).map_err(|source| ScanError::NotFound {
        path: full_dir.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(full_dir));
    }

    let read_dir_error = |source| ScanError::ReadDir {
        path: full_dir.clone(),
        source,
    };

    let mut records = Vec::new();
    let mut scanned = 0usize;
    for dir_entry in fs::read_dir(&full_dir).map_err(read_dir_error)? {
        let dir_entry = dir_entry.map_err(read_dir_error)?;
        scanned += 1;

        let name = dir_entry.file_name();
        let display_name = name.to_string_lossy().into_owned();
        let vanished = |source| ScanError::EntryVanished {
            name: display_name.clone(),
            dir: full_dir.clone(),
            source,
        };

        let file_type = dir_entry.file_type().map_err(vanished)?;
        if !options.entry_kind.matches(file_type) {
            trace!(entry = %display_name, "Skipping entry of another kind");
            continue;
        }

        if display_name.starts_with('.') && !options.include_dotfiles {
            trace!(entry = %display_name, "Skipping dotfile");
            continue;
        }

        // DirEntry::metadata does not traverse symlinks.
        let modified = modified_time(dir_entry.metadata(), &display_name, &full_dir)?;

        records.push(DirEntryRecord {
            relative_path: display_path(dir, &name),
            full_path: full_dir.join(&name),
            modified,
        });
    }

    debug!(scanned, matched = records.len(), "Directory scan complete");
    Ok(records)
}

/// Modification time from an entry's metadata. Any failure means the entry
/// went away (or became unreadable) after the listing.
fn modified_time(
    metadata: io::Result<fs::Metadata>,
    name: &str,
    dir: &Path,
) -> Result<DateTime<Utc>, ScanError> {
    metadata
        .and_then(|metadata| metadata.modified())
        .map(DateTime::<Utc>::from)
        .map_err(|source| ScanError::EntryVanished {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            source,
        })
}

/// Join the caller's directory argument with a child name, dropping leading
/// `.` components so `.` lists `a.log` rather than `./a.log`.
fn display_path(dir: &Path, name: &OsStr) -> PathBuf {
    dir.components()
        .skip_while(|component| matches!(component, Component::CurDir))
        .collect::<PathBuf>()
        .join(name)
}

#[cfg(test)]
mod tests {
    use std::{
        fs::File,
        time::{Duration, SystemTime},
    };

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn names(records: &[DirEntryRecord]) -> Vec<String> {
        let mut names: Vec<String> = records
            .iter()
            .map(|r| {
                r.full_path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    fn populated_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("a.log")).unwrap();
        File::create(dir.path().join("b.log")).unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        dir
    }

    #[rstest]
    #[case::files(EntryKind::File, false, &["a.log", "b.log"])]
    #[case::files_with_dotfiles(EntryKind::File, true, &[".hidden", "a.log", "b.log"])]
    #[case::directories(EntryKind::Directory, false, &["nested"])]
    #[case::directories_with_dotfiles(EntryKind::Directory, true, &[".git", "nested"])]
    fn test_scan_filters(
        #[case] entry_kind: EntryKind,
        #[case] include_dotfiles: bool,
        #[case] expected: &[&str],
    ) {
        let dir = populated_dir();
        let records = scan_directory(
            dir.path(),
            ScanOptions {
                entry_kind,
                include_dotfiles,
            },
        )
        .unwrap();
        assert_eq!(names(&records), expected);
    }

    #[test]
    fn test_scan_ignores_grandchildren() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("deep.txt")).unwrap();
        File::create(dir.path().join("top.txt")).unwrap();

        let records = scan_directory(dir.path(), ScanOptions::default()).unwrap();
        assert_eq!(names(&records), ["top.txt"]);
    }

    #[test]
    fn test_scan_paths() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("one.txt")).unwrap();

        let records = scan_directory(dir.path(), ScanOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.relative_path, dir.path().join("one.txt"));
        assert!(record.full_path.is_absolute());
        assert_eq!(
            record.full_path,
            fs::canonicalize(dir.path()).unwrap().join("one.txt")
        );
    }

    #[test]
    fn test_scan_reads_modification_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dated.txt");
        let file = File::create(&path).unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        file.set_modified(mtime).unwrap();
        drop(file);

        let records = scan_directory(dir.path(), ScanOptions::default()).unwrap();
        assert_eq!(records[0].modified.timestamp(), 1_600_000_000);
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = TempDir::new().unwrap();
        let records = scan_directory(dir.path(), ScanOptions::default()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = scan_directory(&dir.path().join("missing"), ScanOptions::default()).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }), "got {err:?}");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_scan_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        File::create(&file).unwrap();

        let err = scan_directory(&file, ScanOptions::default()).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)), "got {err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_symlink_to_directory_counts_as_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let files = scan_directory(dir.path(), ScanOptions::default()).unwrap();
        assert_eq!(names(&files), ["link"]);

        let dirs = scan_directory(
            dir.path(),
            ScanOptions {
                entry_kind: EntryKind::Directory,
                include_dotfiles: false,
            },
        )
        .unwrap();
        assert_eq!(names(&dirs), ["real"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        File::create(locked.join("a.log")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root.
        let readable = fs::read_dir(&locked).is_ok();
        let result = scan_directory(&locked, ScanOptions::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        let err = result.unwrap_err();
        assert!(matches!(err, ScanError::ReadDir { .. }), "got {err:?}");
    }

    #[test]
    fn test_missing_metadata_is_vanished_entry() {
        let err = modified_time(
            Err(io::Error::from(io::ErrorKind::NotFound)),
            "gone.log",
            Path::new("/data"),
        )
        .unwrap_err();

        match err {
            ScanError::EntryVanished { name, dir, source } => {
                assert_eq!(name, "gone.log");
                assert_eq!(dir, PathBuf::from("/data"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected vanished entry, got {other:?}"),
        }
    }

    #[test]
    fn test_modified_time_from_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dated.txt");
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
            .unwrap();
        drop(file);

        let modified = modified_time(fs::metadata(&path), "dated.txt", dir.path()).unwrap();
        assert_eq!(modified.timestamp(), 1_700_000_000);
    }

    #[rstest]
    #[case::current_dir(".", "a.log")]
    #[case::dot_prefixed("./logs", "logs/a.log")]
    #[case::nested_dots("././logs", "logs/a.log")]
    #[case::plain("logs", "logs/a.log")]
    #[case::absolute("/var/log", "/var/log/a.log")]
    #[case::parent("../logs", "../logs/a.log")]
    fn test_display_path(#[case] dir: &str, #[case] expected: &str) {
        assert_eq!(
            display_path(Path::new(dir), OsStr::new("a.log")),
            PathBuf::from(expected)
        );
    }

    #[test]
    fn test_entry_kind_from_flag() {
        assert_eq!(EntryKind::from_directories_flag(false), EntryKind::File);
        assert_eq!(EntryKind::from_directories_flag(true), EntryKind::Directory);
    }
}

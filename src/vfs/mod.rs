//! Host Filesystem Layer
//!
//! Thin wrapper over `std::fs` that speaks in the shell's own terms:
//! a small `FsError` classification instead of raw `io::Error`, and
//! `DirEntry` values carrying exactly what a DOS listing needs.
//!
//! Directory streams and file handles are opened right before use and
//! dropped on every return path.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::SystemTime;

use crate::dos;

// ============================================================================
// Error Types
// ============================================================================

/// Filesystem error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// File or directory not found
    NotFound,
    /// Permission denied
    PermissionDenied,
    /// File or directory already exists
    AlreadyExists,
    /// Path is not a directory
    NotADirectory,
    /// Path is a directory
    IsADirectory,
    /// Directory is not empty
    DirectoryNotEmpty,
    /// Any other I/O failure
    IoError,
}

impl core::fmt::Display for FsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FsError::NotFound => write!(f, "Not found"),
            FsError::PermissionDenied => write!(f, "Permission denied"),
            FsError::AlreadyExists => write!(f, "Already exists"),
            FsError::NotADirectory => write!(f, "Not a directory"),
            FsError::IsADirectory => write!(f, "Is a directory"),
            FsError::DirectoryNotEmpty => write!(f, "Directory not empty"),
            FsError::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for FsError {}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => FsError::NotFound,
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied,
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists,
            io::ErrorKind::NotADirectory => FsError::NotADirectory,
            io::ErrorKind::IsADirectory => FsError::IsADirectory,
            io::ErrorKind::DirectoryNotEmpty => FsError::DirectoryNotEmpty,
            _ => match e.raw_os_error() {
                Some(libc::ENOTEMPTY) => FsError::DirectoryNotEmpty,
                Some(libc::EISDIR) => FsError::IsADirectory,
                _ => FsError::IoError,
            },
        }
    }
}

// ============================================================================
// Directory Entry
// ============================================================================

/// What kind of object an entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Device nodes, sockets, fifos, dangling symlinks
    Other,
}

/// Directory entry information
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Name of the file or directory, decoded for matching and display
    pub name: String,
    /// Name exactly as the host stores it
    pub raw_name: OsString,
    /// Regular file, directory or anything else
    pub kind: EntryKind,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: Option<SystemTime>,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

fn kind_of(meta: &fs::Metadata) -> EntryKind {
    if meta.is_dir() {
        EntryKind::Directory
    } else if meta.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

/// Describe one path. Symlinks are followed; a dangling link is `Other`.
pub fn entry(path: &Path, name: &OsStr) -> Result<DirEntry, FsError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => fs::symlink_metadata(path)?,
    };
    let kind = if meta.file_type().is_symlink() {
        EntryKind::Other
    } else {
        kind_of(&meta)
    };
    Ok(DirEntry {
        name: name.to_string_lossy().into_owned(),
        raw_name: name.to_os_string(),
        kind,
        size: meta.len(),
        modified: meta.modified().ok(),
    })
}

/// Kind of the object at `path`, or `NotFound`
pub fn kind(path: &Path) -> Result<EntryKind, FsError> {
    Ok(kind_of(&fs::metadata(path)?))
}

/// True if `path` names an existing directory
pub fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

// ============================================================================
// Directory Scanning
// ============================================================================

/// Enumerate `dir` in file-system order, keeping names that match `pattern`.
///
/// `.` and `..` are synthesized only when `include_dots` is set, since the
/// host iterator never yields them. Entries that vanish or cannot be stat'ed
/// between readdir and stat are skipped.
pub fn scan_dir(dir: &Path, pattern: &str, include_dots: bool) -> Result<Vec<DirEntry>, FsError> {
    let reader = fs::read_dir(dir)?;
    let mut entries = Vec::new();

    if include_dots {
        for (name, path) in [(".", dir.to_path_buf()), ("..", dir.join(".."))] {
            if dos::matches(pattern, name) {
                if let Ok(entry) = entry(&path, OsStr::new(name)) {
                    entries.push(entry);
                }
            }
        }
    }

    for item in reader {
        let Ok(item) = item else { continue };
        let name = item.file_name();
        if !dos::matches(pattern, &name.to_string_lossy()) {
            continue;
        }
        match entry(&item.path(), &name) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::debug!("skipping {}: {}", item.path().display(), e),
        }
    }

    Ok(entries)
}

// ============================================================================
// File Operations
// ============================================================================

/// How a copy opens its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// Open a file for reading
pub fn open_read(path: &Path) -> Result<File, FsError> {
    Ok(File::open(path)?)
}

/// Open (creating if needed) a file for writing
pub fn open_write(path: &Path, mode: WriteMode) -> Result<File, FsError> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Truncate => options.write(true).truncate(true),
        WriteMode::Append => options.append(true),
    };
    Ok(options.open(path)?)
}

/// Copy `src` into `dst` byte-for-byte; returns bytes written.
///
/// A failure after `dst` was opened leaves whatever was already written.
pub fn copy_file(src: &Path, dst: &Path, mode: WriteMode) -> Result<u64, FsError> {
    let mut input = open_read(src)?;
    let mut output = open_write(dst, mode)?;
    copy_stream(&mut input, &mut output)
}

/// Pump a reader into a writer
pub fn copy_stream(input: &mut dyn Read, output: &mut dyn Write) -> Result<u64, FsError> {
    let n = io::copy(input, output)?;
    output.flush()?;
    Ok(n)
}

/// True if both paths exist and are the same inode
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

pub fn remove_file(path: &Path) -> Result<(), FsError> {
    Ok(fs::remove_file(path)?)
}

pub fn create_dir(path: &Path) -> Result<(), FsError> {
    Ok(fs::create_dir(path)?)
}

pub fn remove_dir(path: &Path) -> Result<(), FsError> {
    Ok(fs::remove_dir(path)?)
}

pub fn rename(from: &Path, to: &Path) -> Result<(), FsError> {
    Ok(fs::rename(from, to)?)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let e = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(FsError::from(e), FsError::NotFound);
        let e = io::Error::from_raw_os_error(libc::ENOTEMPTY);
        assert_eq!(FsError::from(e), FsError::DirectoryNotEmpty);
        let e = io::Error::other("boom");
        assert_eq!(FsError::from(e), FsError::IoError);
    }

    #[test]
    fn test_scan_filters_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.TXT"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        fs::write(dir.path().join("C.DAT"), b"c").unwrap();
        fs::create_dir(dir.path().join("SUB.TXT")).unwrap();

        let mut names: Vec<_> = scan_dir(dir.path(), "*.txt", false)
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.kind))
            .collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            names,
            vec![
                (String::from("A.TXT"), EntryKind::File),
                (String::from("SUB.TXT"), EntryKind::Directory),
                (String::from("b.txt"), EntryKind::File),
            ]
        );
    }

    #[test]
    fn test_scan_keeps_undecodable_names() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let raw = OsStr::from_bytes(b"\xff.TXT");
        fs::write(dir.path().join(raw), b"x").unwrap();

        let entries = scan_dir(dir.path(), "*.TXT", false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_name.as_os_str(), raw);
        assert_eq!(entries[0].name, "\u{FFFD}.TXT");
        assert!(dir.path().join(&entries[0].raw_name).is_file());
    }

    #[test]
    fn test_scan_dot_entries_only_on_request() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_dir(dir.path(), "*", false).unwrap().is_empty());
        let dots: Vec<_> = scan_dir(dir.path(), "*", true)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(dots, vec![String::from("."), String::from("..")]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_dir(&dir.path().join("nope"), "*", false).unwrap_err();
        assert_eq!(err, FsError::NotFound);
    }

    #[test]
    fn test_copy_truncate_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let out = dir.path().join("out");
        fs::write(&a, b"hello ").unwrap();
        fs::write(&b, b"world").unwrap();
        fs::write(&out, b"stale contents").unwrap();

        assert_eq!(copy_file(&a, &out, WriteMode::Truncate).unwrap(), 6);
        assert_eq!(copy_file(&b, &out, WriteMode::Append).unwrap(), 5);
        assert_eq!(fs::read(&out).unwrap(), b"hello world");
    }

    #[test]
    fn test_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, b"x").unwrap();
        assert!(same_file(&a, &dir.path().join(".").join("a")));
        assert!(!same_file(&a, &dir.path().join("missing")));
    }
}

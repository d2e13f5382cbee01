//! Directory Spec Splitting
//!
//! Every wildcard-capable builtin (DIR, DEL, COPY) turns its translated
//! argument into a (directory, pattern) pair the same way.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// True if the final segment of `spec` contains `*` or `?`
pub fn has_wildcard(spec: &str) -> bool {
    let (_, last) = split_spec(spec);
    last.contains(['*', '?'])
}

/// Split a POSIX spec at its last `/` into (directory, pattern).
///
/// - no separator: `(".", spec)`, or `(".", "*")` for an empty spec
/// - separator at position 0: directory is `/`
/// - empty trailing pattern becomes `*`
/// - `*.*` is the DOS spelling of "everything" and becomes `*`
pub fn split_spec(spec: &str) -> (&str, &str) {
    let (dir, pattern) = match spec.rfind('/') {
        None => (".", spec),
        Some(0) => ("/", &spec[1..]),
        Some(idx) => (&spec[..idx], &spec[idx + 1..]),
    };

    (dir, everything(pattern))
}

fn everything(pattern: &str) -> &str {
    match pattern {
        "" | "*.*" => "*",
        p => p,
    }
}

/// [`split_spec`] over a host path. The directory keeps its exact bytes;
/// only the pattern is decoded.
pub fn split_path(path: &Path) -> (&Path, Cow<'_, str>) {
    let bytes = path.as_os_str().as_bytes();
    let (dir, pattern) = match bytes.iter().rposition(|&b| b == b'/') {
        None => (&b"."[..], bytes),
        Some(0) => (&b"/"[..], &bytes[1..]),
        Some(idx) => (&bytes[..idx], &bytes[idx + 1..]),
    };

    let pattern = match String::from_utf8_lossy(pattern) {
        Cow::Borrowed(p) => Cow::Borrowed(everything(p)),
        Cow::Owned(p) => Cow::Owned(p),
    };
    (Path::new(OsStr::from_bytes(dir)), pattern)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_with_dir() {
        assert_eq!(split_spec("/a/b/*.TXT"), ("/a/b", "*.TXT"));
        assert_eq!(split_spec("sub/x?.c"), ("sub", "x?.c"));
    }

    #[test]
    fn test_split_no_separator() {
        assert_eq!(split_spec("*.TXT"), (".", "*.TXT"));
        assert_eq!(split_spec(""), (".", "*"));
    }

    #[test]
    fn test_split_root_dir() {
        assert_eq!(split_spec("/*.SYS"), ("/", "*.SYS"));
        assert_eq!(split_spec("/"), ("/", "*"));
    }

    #[test]
    fn test_split_trailing_separator() {
        assert_eq!(split_spec("/a/b/"), ("/a/b", "*"));
    }

    #[test]
    fn test_star_dot_star() {
        assert_eq!(split_spec("/a/*.*"), ("/a", "*"));
    }

    #[test]
    fn test_has_wildcard_checks_last_segment() {
        assert!(has_wildcard("/a/*.txt"));
        assert!(has_wildcard("FILE?.DAT"));
        assert!(!has_wildcard("/a*/b.txt"));
        assert!(!has_wildcard("plain.txt"));
    }

    #[test]
    fn test_split_path_keeps_directory_bytes() {
        let path = Path::new(OsStr::from_bytes(b"/srv/\xff dir/*.TXT"));
        let (dir, pattern) = split_path(path);
        assert_eq!(dir.as_os_str().as_bytes(), b"/srv/\xff dir");
        assert_eq!(pattern, "*.TXT");

        assert_eq!(split_path(Path::new("/a/*.*")), (Path::new("/a"), Cow::from("*")));
        assert_eq!(split_path(Path::new("/a/")), (Path::new("/a"), Cow::from("*")));
        assert_eq!(split_path(Path::new("/X?")), (Path::new("/"), Cow::from("X?")));
    }
}

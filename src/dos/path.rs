//! DOS <-> POSIX Path Translation
//!
//! The emulated `C:` drive is a single POSIX directory (the fixed root).
//! Absolute DOS paths are re-homed under that root, relative paths only
//! get their separators rewritten and are resolved later against the
//! session's current directory.
//!
//! The mapping is a pure string transform. It is reversible for display
//! but does not round-trip exactly: case and trailing separators are lost.

use std::path::Path;

use crate::config;

/// The only drive letter the shell knows about
pub const DRIVE_LETTER: u8 = b'C';

/// Display form of the fixed root
pub const DRIVE_ROOT: &str = "C:\\";

// ============================================================================
// Errors
// ============================================================================

/// Reasons a DOS path cannot be translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Nothing left after trimming (callers report a missing argument)
    #[error("Required parameter missing")]
    Empty,
    /// Drive prefix other than `C:`
    #[error("Invalid drive specification")]
    InvalidDrive,
    /// Result would not fit in `PATH_MAX`
    #[error("The filename or extension is too long.")]
    TooLong,
}

// ============================================================================
// DOS -> POSIX
// ============================================================================

/// True for both DOS and POSIX separators
pub fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Returns the drive letter if `s` starts with `<letter>:`
pub fn drive_prefix(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(bytes[0] as char)
    } else {
        None
    }
}

/// Translate a DOS path into a POSIX path.
///
/// Accepts `\FOO\BAR`, `FOO\BAR` (relative), `C:\FOO`, `C:FOO` (relative)
/// and `/` as a synonym for `\`. A bare `C:` means the current directory.
pub fn dos_to_posix(root: &Path, dos: &str) -> Result<String, PathError> {
    let mut rest = dos.trim_start_matches([' ', '\t']);
    if rest.is_empty() {
        return Err(PathError::Empty);
    }

    if let Some(letter) = drive_prefix(rest) {
        if !letter.eq_ignore_ascii_case(&(DRIVE_LETTER as char)) {
            return Err(PathError::InvalidDrive);
        }
        rest = &rest[2..];
    }

    let translated = if rest.starts_with(is_separator) {
        let tail = rest.trim_start_matches(is_separator).replace('\\', "/");
        let root = root.to_string_lossy();
        let base = root.trim_end_matches('/');
        match (base.is_empty(), tail.is_empty()) {
            (true, true) => String::from("/"),
            (true, false) => format!("/{}", tail),
            (false, true) => String::from(base),
            (false, false) => format!("{}/{}", base, tail),
        }
    } else if rest.is_empty() {
        String::from(".")
    } else {
        rest.replace('\\', "/")
    };

    if translated.len() >= config::PATH_MAX {
        return Err(PathError::TooLong);
    }
    Ok(translated)
}

// ============================================================================
// POSIX -> DOS
// ============================================================================

/// Render a POSIX directory as a DOS path.
///
/// Anything outside the fixed root is shown as `C:\`.
pub fn posix_to_dos(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => {
            let rel = rel.to_string_lossy();
            if rel.is_empty() {
                String::from(DRIVE_ROOT)
            } else {
                format!("{}{}", DRIVE_ROOT, rel.replace('/', "\\"))
            }
        }
        Err(_) => String::from(DRIVE_ROOT),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> &'static Path {
        Path::new("/srv/c")
    }

    #[test]
    fn test_absolute_backslash_path() {
        assert_eq!(dos_to_posix(root(), "\\FOO\\BAR").unwrap(), "/srv/c/FOO/BAR");
    }

    #[test]
    fn test_absolute_with_drive() {
        assert_eq!(dos_to_posix(root(), "c:\\dos\\x.txt").unwrap(), "/srv/c/dos/x.txt");
        assert_eq!(dos_to_posix(root(), "C:/dos").unwrap(), "/srv/c/dos");
    }

    #[test]
    fn test_leading_separators_collapse() {
        assert_eq!(dos_to_posix(root(), "\\\\/\\FOO").unwrap(), "/srv/c/FOO");
    }

    #[test]
    fn test_bare_root() {
        assert_eq!(dos_to_posix(root(), "\\").unwrap(), "/srv/c");
        assert_eq!(dos_to_posix(root(), "C:\\").unwrap(), "/srv/c");
        assert_eq!(dos_to_posix(Path::new("/"), "\\").unwrap(), "/");
        assert_eq!(dos_to_posix(Path::new("/"), "\\BIN").unwrap(), "/BIN");
    }

    #[test]
    fn test_relative_stays_relative() {
        assert_eq!(dos_to_posix(root(), "FOO\\BAR").unwrap(), "FOO/BAR");
        assert_eq!(dos_to_posix(root(), "C:FOO").unwrap(), "FOO");
        assert_eq!(dos_to_posix(root(), "..\\x").unwrap(), "../x");
    }

    #[test]
    fn test_bare_drive_is_current_dir() {
        assert_eq!(dos_to_posix(root(), "C:").unwrap(), ".");
    }

    #[test]
    fn test_leading_whitespace_skipped() {
        assert_eq!(dos_to_posix(root(), "  \t\\A").unwrap(), "/srv/c/A");
    }

    #[test]
    fn test_other_drive_rejected() {
        assert_eq!(dos_to_posix(root(), "D:\\FOO"), Err(PathError::InvalidDrive));
        assert_eq!(dos_to_posix(root(), "a:"), Err(PathError::InvalidDrive));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(dos_to_posix(root(), ""), Err(PathError::Empty));
        assert_eq!(dos_to_posix(root(), "   "), Err(PathError::Empty));
    }

    #[test]
    fn test_too_long_rejected() {
        let long = "A".repeat(config::PATH_MAX);
        assert_eq!(dos_to_posix(root(), &long), Err(PathError::TooLong));
    }

    #[test]
    fn test_posix_to_dos() {
        assert_eq!(posix_to_dos(root(), Path::new("/srv/c")), "C:\\");
        assert_eq!(posix_to_dos(root(), Path::new("/srv/c/DOS/BIN")), "C:\\DOS\\BIN");
        assert_eq!(posix_to_dos(Path::new("/"), Path::new("/usr/lib")), "C:\\usr\\lib");
    }

    #[test]
    fn test_posix_to_dos_outside_root() {
        assert_eq!(posix_to_dos(root(), Path::new("/etc")), "C:\\");
        // Component-wise, not a string prefix
        assert_eq!(posix_to_dos(root(), Path::new("/srv/cx/y")), "C:\\");
    }
}

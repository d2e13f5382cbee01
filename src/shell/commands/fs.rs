//! Filesystem Commands
//!
//! Commands for single-object file operations: type, del, ren, md, rd.
//! COPY has its own module.

use std::io::Write;
use std::path::Path;

use super::split_first_word;
use crate::dos;
use crate::shell::{Command, ShellContext, ShellError};
use crate::vfs::{self, EntryKind, FsError};

fn has_wildcard(arg: &str) -> bool {
    arg.contains(['*', '?'])
}

/// A REN target names a location only if it has a separator or drive
fn is_location(arg: &str) -> bool {
    arg.contains(dos::is_separator) || dos::path::drive_prefix(arg).is_some()
}

// ============================================================================
// Type Command
// ============================================================================

/// Type command - display file contents
pub struct TypeCommand;

impl Command for TypeCommand {
    fn name(&self) -> &'static str {
        "TYPE"
    }
    fn description(&self) -> &'static str {
        "Displays the contents of a text file."
    }
    fn usage(&self) -> &'static str {
        "TYPE <file>"
    }

    fn execute(
        &self,
        args: &str,
        out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let path = ctx.translate(args)?;
        match vfs::kind(&path) {
            Ok(EntryKind::Directory) => return Err(ShellError::AccessDenied),
            Ok(_) => {}
            Err(_) => return Err(ShellError::NotFound),
        }

        let mut file = vfs::open_read(&path).map_err(|_| ShellError::NotFound)?;
        vfs::copy_stream(&mut file, out).map_err(|e| {
            log::warn!("type {}: {}", path.display(), e);
            ShellError::AccessDenied
        })?;
        Ok(())
    }
}

/// Static instance
pub static TYPE_CMD: TypeCommand = TypeCommand;

// ============================================================================
// Del Command
// ============================================================================

/// Del command - delete files
pub struct DelCommand;

impl DelCommand {
    /// Delete every regular file in `dir` matching `pattern`
    fn delete_matching(dir: &Path, pattern: &str) -> Result<(), ShellError> {
        let entries = vfs::scan_dir(dir, pattern, false).map_err(|_| ShellError::NotFound)?;

        let mut deleted = 0usize;
        let mut failed = 0usize;
        for entry in entries.iter().filter(|e| e.is_file()) {
            let path = dir.join(&entry.raw_name);
            match vfs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("deleted {}", path.display());
                    deleted += 1;
                }
                Err(e) => {
                    log::warn!("cannot delete {}: {}", path.display(), e);
                    failed += 1;
                }
            }
        }

        match (deleted, failed) {
            (0, 0) => Err(ShellError::NotFound),
            (0, _) => Err(ShellError::AccessDenied),
            _ => Ok(()),
        }
    }

    fn delete_one(path: &Path) -> Result<(), ShellError> {
        match vfs::kind(path) {
            Ok(EntryKind::File) => {}
            Ok(_) => return Err(ShellError::AccessDenied),
            Err(_) => return Err(ShellError::NotFound),
        }
        vfs::remove_file(path).map_err(|e| match e {
            FsError::NotFound => ShellError::NotFound,
            _ => ShellError::AccessDenied,
        })?;
        log::debug!("deleted {}", path.display());
        Ok(())
    }
}

impl Command for DelCommand {
    fn name(&self) -> &'static str {
        "DEL"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["ERASE"]
    }
    fn description(&self) -> &'static str {
        "Deletes one or more files."
    }
    fn usage(&self) -> &'static str {
        "DEL <filespec>\nERASE <filespec>"
    }

    fn execute(
        &self,
        args: &str,
        _out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let path = ctx.translate(args)?;
        let (dir, pattern) = dos::split_path(&path);
        if pattern.contains(['*', '?']) {
            Self::delete_matching(dir, &pattern)
        } else {
            Self::delete_one(&path)
        }
    }
}

/// Static instance
pub static DEL_CMD: DelCommand = DelCommand;

// ============================================================================
// Ren Command
// ============================================================================

/// Ren command - rename a file or directory
pub struct RenCommand;

impl Command for RenCommand {
    fn name(&self) -> &'static str {
        "REN"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["RENAME"]
    }
    fn description(&self) -> &'static str {
        "Renames a file."
    }
    fn usage(&self) -> &'static str {
        "REN <src> <dst>\nRENAME <src> <dst>\n\nA bare <dst> name lands in the current directory."
    }

    fn execute(
        &self,
        args: &str,
        _out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let (src, dst) = split_first_word(args);
        if src.is_empty() {
            return Err(ShellError::RequiredParameterMissing);
        }
        if dst.is_empty() || has_wildcard(src) || has_wildcard(dst) {
            return Err(ShellError::SyntaxError);
        }

        let from = ctx.translate(src)?;
        match vfs::kind(&from) {
            Ok(EntryKind::Directory) => return Err(ShellError::AccessDenied),
            Ok(_) => {}
            Err(_) => return Err(ShellError::NotFound),
        }

        let to = if is_location(dst) {
            ctx.translate(dst)?
        } else {
            ctx.cwd().join(dst)
        };
        if std::fs::symlink_metadata(&to).is_ok() {
            return Err(ShellError::DuplicateFileName);
        }

        vfs::rename(&from, &to).map_err(|e| {
            log::warn!("rename {} -> {}: {}", from.display(), to.display(), e);
            ShellError::AccessDenied
        })?;
        log::debug!("renamed {} -> {}", from.display(), to.display());
        Ok(())
    }
}

/// Static instance
pub static REN_CMD: RenCommand = RenCommand;

// ============================================================================
// Md Command
// ============================================================================

/// Md command - create a directory
pub struct MdCommand;

impl Command for MdCommand {
    fn name(&self) -> &'static str {
        "MD"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["MKDIR"]
    }
    fn description(&self) -> &'static str {
        "Creates a directory."
    }
    fn usage(&self) -> &'static str {
        "MD <dir>\nMKDIR <dir>"
    }

    fn execute(
        &self,
        args: &str,
        _out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let path = ctx.translate(args)?;
        vfs::create_dir(&path).map_err(|e| match e {
            FsError::AlreadyExists => ShellError::AlreadyExists(String::from(args)),
            _ => ShellError::AccessDenied,
        })?;
        log::debug!("created {}", path.display());
        Ok(())
    }
}

/// Static instance
pub static MD_CMD: MdCommand = MdCommand;

// ============================================================================
// Rd Command
// ============================================================================

/// Rd command - remove an empty directory
pub struct RdCommand;

impl Command for RdCommand {
    fn name(&self) -> &'static str {
        "RD"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["RMDIR"]
    }
    fn description(&self) -> &'static str {
        "Removes an empty directory."
    }
    fn usage(&self) -> &'static str {
        "RD <dir>\nRMDIR <dir>"
    }

    fn execute(
        &self,
        args: &str,
        _out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let path = ctx.translate(args)?;
        if ctx.is_root(&path) {
            return Err(ShellError::AccessDenied);
        }
        match vfs::kind(&path) {
            Ok(EntryKind::Directory) => {}
            Ok(_) => return Err(ShellError::AccessDenied),
            Err(_) => return Err(ShellError::CannotFindFile),
        }
        // The session would be left standing in a deleted directory
        if std::fs::canonicalize(&path).is_ok_and(|p| p == ctx.cwd()) {
            return Err(ShellError::AccessDenied);
        }

        vfs::remove_dir(&path).map_err(|e| match e {
            FsError::DirectoryNotEmpty => ShellError::DirectoryNotEmpty,
            _ => ShellError::AccessDenied,
        })?;
        log::debug!("removed {}", path.display());
        Ok(())
    }
}

/// Static instance
pub static RD_CMD: RdCommand = RdCommand;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> (tempfile::TempDir, ShellContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ShellContext::new(dir.path());
        (dir, ctx)
    }

    fn run(cmd: &dyn Command, args: &str, ctx: &mut ShellContext) -> Result<String, ShellError> {
        let mut out = Vec::new();
        cmd.execute(args, &mut out, ctx)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_type_streams_bytes() {
        let (dir, mut ctx) = setup();
        fs::write(dir.path().join("A.TXT"), b"line one\r\nline two").unwrap();
        assert_eq!(run(&TYPE_CMD, "A.TXT", &mut ctx).unwrap(), "line one\r\nline two");
    }

    #[test]
    fn test_type_errors() {
        let (dir, mut ctx) = setup();
        fs::create_dir(dir.path().join("SUB")).unwrap();
        assert!(matches!(run(&TYPE_CMD, "SUB", &mut ctx), Err(ShellError::AccessDenied)));
        assert!(matches!(run(&TYPE_CMD, "NOPE", &mut ctx), Err(ShellError::NotFound)));
        assert!(matches!(run(&TYPE_CMD, "", &mut ctx), Err(ShellError::RequiredParameterMissing)));
    }

    #[test]
    fn test_del_single() {
        let (dir, mut ctx) = setup();
        fs::write(dir.path().join("A.TXT"), b"a").unwrap();
        fs::create_dir(dir.path().join("SUB")).unwrap();

        run(&DEL_CMD, "A.TXT", &mut ctx).unwrap();
        assert!(!dir.path().join("A.TXT").exists());
        assert!(matches!(run(&DEL_CMD, "A.TXT", &mut ctx), Err(ShellError::NotFound)));
        assert!(matches!(run(&DEL_CMD, "SUB", &mut ctx), Err(ShellError::AccessDenied)));
    }

    #[test]
    fn test_del_wildcard_skips_directories() {
        let (dir, mut ctx) = setup();
        fs::write(dir.path().join("A.TXT"), b"a").unwrap();
        fs::create_dir(dir.path().join("D.TXT")).unwrap();

        run(&DEL_CMD, "*.TXT", &mut ctx).unwrap();
        assert!(!dir.path().join("A.TXT").exists());
        assert!(dir.path().join("D.TXT").is_dir());

        // Only a directory matches now
        assert!(matches!(run(&DEL_CMD, "*.TXT", &mut ctx), Err(ShellError::NotFound)));
    }

    #[test]
    fn test_del_wildcard_undecodable_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (dir, mut ctx) = setup();
        let raw = OsStr::from_bytes(b"\xff.TXT");
        fs::write(dir.path().join(raw), b"x").unwrap();
        fs::write(dir.path().join("KEEP.DAT"), b"k").unwrap();

        run(&DEL_CMD, "*.TXT", &mut ctx).unwrap();
        assert!(!dir.path().join(raw).exists());
        assert!(dir.path().join("KEEP.DAT").exists());
    }

    #[test]
    fn test_ren_into_current_directory() {
        let (dir, mut ctx) = setup();
        fs::create_dir(dir.path().join("SUB")).unwrap();
        fs::write(dir.path().join("SUB").join("OLD.TXT"), b"x").unwrap();

        run(&REN_CMD, "SUB\\OLD.TXT NEW.TXT", &mut ctx).unwrap();
        assert!(dir.path().join("NEW.TXT").exists());
        assert!(!dir.path().join("SUB").join("OLD.TXT").exists());
    }

    #[test]
    fn test_ren_with_location() {
        let (dir, mut ctx) = setup();
        fs::create_dir(dir.path().join("SUB")).unwrap();
        fs::write(dir.path().join("A.TXT"), b"x").unwrap();

        run(&REN_CMD, "A.TXT \\SUB\\B.TXT", &mut ctx).unwrap();
        assert!(dir.path().join("SUB").join("B.TXT").exists());
    }

    #[test]
    fn test_ren_errors() {
        let (dir, mut ctx) = setup();
        fs::write(dir.path().join("A.TXT"), b"a").unwrap();
        fs::write(dir.path().join("B.TXT"), b"b").unwrap();
        fs::create_dir(dir.path().join("SUB")).unwrap();

        assert!(matches!(run(&REN_CMD, "", &mut ctx), Err(ShellError::RequiredParameterMissing)));
        assert!(matches!(run(&REN_CMD, "A.TXT", &mut ctx), Err(ShellError::SyntaxError)));
        assert!(matches!(run(&REN_CMD, "*.TXT X", &mut ctx), Err(ShellError::SyntaxError)));
        assert!(matches!(run(&REN_CMD, "SUB X", &mut ctx), Err(ShellError::AccessDenied)));
        assert!(matches!(run(&REN_CMD, "A.TXT B.TXT", &mut ctx), Err(ShellError::DuplicateFileName)));
        assert!(matches!(run(&REN_CMD, "NOPE X", &mut ctx), Err(ShellError::NotFound)));
        assert_eq!(fs::read(dir.path().join("B.TXT")).unwrap(), b"b");
    }

    #[test]
    fn test_md_and_rd() {
        let (dir, mut ctx) = setup();
        run(&MD_CMD, "GAMES", &mut ctx).unwrap();
        assert!(dir.path().join("GAMES").is_dir());

        let err = run(&MD_CMD, "GAMES", &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "A subdirectory or file GAMES already exists.");

        run(&RD_CMD, "GAMES", &mut ctx).unwrap();
        assert!(!dir.path().join("GAMES").exists());
    }

    #[test]
    fn test_md_without_parent() {
        let (_dir, mut ctx) = setup();
        assert!(matches!(run(&MD_CMD, "A\\B", &mut ctx), Err(ShellError::AccessDenied)));
    }

    #[test]
    fn test_rd_errors() {
        let (dir, mut ctx) = setup();
        fs::create_dir(dir.path().join("FULL")).unwrap();
        fs::write(dir.path().join("FULL").join("X"), b"x").unwrap();
        fs::write(dir.path().join("FILE"), b"x").unwrap();

        assert!(matches!(run(&RD_CMD, "\\", &mut ctx), Err(ShellError::AccessDenied)));
        assert!(matches!(run(&RD_CMD, "FULL", &mut ctx), Err(ShellError::DirectoryNotEmpty)));
        assert!(matches!(run(&RD_CMD, "NOPE", &mut ctx), Err(ShellError::CannotFindFile)));
        assert!(matches!(run(&RD_CMD, "FILE", &mut ctx), Err(ShellError::AccessDenied)));
        assert!(dir.path().join("FILE").is_file());
    }

    #[test]
    fn test_rd_current_directory_refused() {
        let (dir, mut ctx) = setup();
        fs::create_dir(dir.path().join("HERE")).unwrap();
        ctx.change_dir("HERE").unwrap();
        assert!(matches!(run(&RD_CMD, ".", &mut ctx), Err(ShellError::AccessDenied)));
        assert!(dir.path().join("HERE").is_dir());
    }
}

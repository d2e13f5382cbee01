//! Copy Command
//!
//! Four shapes share one verb:
//! - `COPY <src> [dst]`: one file
//! - `COPY <dir\*.EXT> <dst>`: wildcard fan-out (a directory source means `dir\*`)
//! - `COPY <a>+<b>[+...] <dst>`: concatenation
//! - `COPY CON <dst>`: type a file in on the console, `^Z` ends it
//!
//! Nothing is rolled back: a copy that fails halfway leaves whatever was
//! already written.

use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::dos;
use crate::shell::{Command, ShellContext, ShellError};
use crate::terminal::{RawModeGuard, keys};
use crate::vfs::{self, EntryKind, WriteMode};

/// Console device name
const CON: &str = "CON";

// ============================================================================
// Argument Parsing
// ============================================================================

/// Split COPY arguments into at most two tokens, gluing `+` sequences so
/// that `A + B C` and `A+B C` both give `["A+B", "C"]`.
pub fn split_copy_args(args: &str) -> Result<Vec<String>, ShellError> {
    let mut tokens: Vec<String> = Vec::new();

    for word in args.split_whitespace() {
        match tokens.last_mut() {
            Some(last) if last.ends_with('+') || word.starts_with('+') => last.push_str(word),
            _ => tokens.push(String::from(word)),
        }
    }

    match tokens.len() {
        0 => Err(ShellError::RequiredParameterMissing),
        1 | 2 => Ok(tokens),
        _ => Err(ShellError::InvalidParameters),
    }
}

fn is_con(token: &str) -> bool {
    token.eq_ignore_ascii_case(CON)
}

fn base_name(path: &Path) -> Result<&std::ffi::OsStr, ShellError> {
    path.file_name().ok_or(ShellError::SyntaxError)
}

fn report(out: &mut dyn Write, copied: usize) -> Result<(), ShellError> {
    writeln!(out, "{:>9} file(s) copied.", copied)?;
    Ok(())
}

fn copy_failed(src: &Path, dst: &Path, e: vfs::FsError) -> ShellError {
    log::warn!("copy {} -> {}: {}", src.display(), dst.display(), e);
    ShellError::AccessDenied
}

// ============================================================================
// Single and Wildcard Copy
// ============================================================================

/// Copy one file. Without `dst` the copy lands in the current directory.
fn copy_single(
    ctx: &ShellContext,
    src: &Path,
    dst: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    if dst.is_some_and(is_con) {
        let mut file = vfs::open_read(src).map_err(|_| ShellError::NotFound)?;
        vfs::copy_stream(&mut file, out).map_err(|e| copy_failed(src, Path::new(CON), e))?;
        return report(out, 1);
    }

    let mut target = match dst {
        Some(dst) => ctx.translate(dst)?,
        None => ctx.cwd().to_path_buf(),
    };
    if vfs::is_dir(&target) {
        target.push(base_name(src)?);
    }
    if vfs::same_file(src, &target) {
        return Err(ShellError::CopyOntoItself);
    }

    vfs::copy_file(src, &target, WriteMode::Truncate).map_err(|e| copy_failed(src, &target, e))?;
    log::debug!("copied {} -> {}", src.display(), target.display());
    report(out, 1)
}

/// Copy every regular file in `dir` matching `pattern`.
///
/// The destination is required. A directory takes each match under its own
/// name; anything else can take at most one match.
fn copy_wildcard(
    ctx: &ShellContext,
    dir: &Path,
    pattern: &str,
    dst: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    let dst = dst.ok_or(ShellError::InvalidParameters)?;
    let dst = ctx.translate(dst)?;
    let dst_is_dir = vfs::is_dir(&dst);

    let matches: Vec<_> = vfs::scan_dir(dir, pattern, false)
        .map_err(|_| ShellError::NotFound)?
        .into_iter()
        .filter(|e| e.is_file())
        .collect();
    if matches.is_empty() {
        return Err(ShellError::NotFound);
    }
    if !dst_is_dir && matches.len() > 1 {
        return Err(ShellError::InvalidParameters);
    }

    let mut copied = 0;
    for entry in &matches {
        let src = dir.join(&entry.raw_name);
        let target = if dst_is_dir { dst.join(&entry.raw_name) } else { dst.clone() };
        writeln!(out, "{}", entry.name)?;

        if vfs::same_file(&src, &target) {
            writeln!(out, "{}", ShellError::CopyOntoItself)?;
            continue;
        }
        vfs::copy_file(&src, &target, WriteMode::Truncate)
            .map_err(|e| copy_failed(&src, &target, e))?;
        log::debug!("copied {} -> {}", src.display(), target.display());
        copied += 1;
    }

    report(out, copied)
}

// ============================================================================
// Concatenation
// ============================================================================

/// `A+B+C dst`: the first source truncates `dst`, later ones append
fn concatenate(
    ctx: &ShellContext,
    sources: &str,
    dst: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    let dst = dst.ok_or(ShellError::RequiredParameterMissing)?;
    let names: Vec<&str> = sources.split('+').collect();
    if names.iter().any(|n| n.is_empty()) || names.iter().any(|n| n.contains(['*', '?'])) {
        return Err(ShellError::SyntaxError);
    }

    let sources = names
        .iter()
        .map(|n| ctx.translate(n))
        .collect::<Result<Vec<PathBuf>, _>>()?;
    let mut target = ctx.translate(dst)?;
    if vfs::is_dir(&target) {
        target.push(base_name(&sources[0])?);
    }
    if sources.iter().any(|src| vfs::same_file(src, &target)) {
        return Err(ShellError::CopyOntoItself);
    }

    for (i, src) in sources.iter().enumerate() {
        match vfs::kind(src) {
            Ok(EntryKind::Directory) | Err(_) => return Err(ShellError::NotFound),
            Ok(_) => {}
        }
        let mode = if i == 0 { WriteMode::Truncate } else { WriteMode::Append };
        vfs::copy_file(src, &target, mode).map_err(|e| copy_failed(src, &target, e))?;
        log::debug!("appended {} -> {}", src.display(), target.display());
    }

    report(out, sources.len())
}

// ============================================================================
// COPY CON
// ============================================================================

/// What the line editor wants done after one byte
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Keep reading
    Continue,
    /// A finished line (newline included) to append to the file
    Commit(Vec<u8>),
    /// `^Z`: input is over
    End,
}

/// Minimal line editor for typing a file in on a raw console.
///
/// Bytes to show the user are appended to the caller's echo buffer.
#[derive(Debug, Default)]
pub struct LineEditor {
    line: Vec<u8>,
    /// Last byte was CR, so a following LF is part of the same Enter
    after_cr: bool,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, byte: u8, echo: &mut Vec<u8>) -> Step {
        let after_cr = std::mem::replace(&mut self.after_cr, false);

        match byte {
            keys::END_OF_INPUT => {
                echo.extend_from_slice(b"^Z\n");
                Step::End
            }
            keys::LF if after_cr => Step::Continue,
            keys::CR | keys::LF => {
                self.after_cr = byte == keys::CR;
                echo.push(b'\n');
                let mut line = std::mem::take(&mut self.line);
                line.push(b'\n');
                Step::Commit(line)
            }
            keys::BACKSPACE | keys::DELETE => {
                if self.erase_char() {
                    echo.extend_from_slice(keys::ERASE);
                }
                Step::Continue
            }
            keys::TAB => self.insert(byte, echo),
            b if b < 0x20 => Step::Continue,
            b => self.insert(b, echo),
        }
    }

    /// Whatever was typed after the last Enter
    pub fn take_partial(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.line)
    }

    fn insert(&mut self, byte: u8, echo: &mut Vec<u8>) -> Step {
        self.line.push(byte);
        echo.push(byte);
        Step::Continue
    }

    /// Drop the last UTF-8 character; false if the line was empty
    fn erase_char(&mut self) -> bool {
        while let Some(b) = self.line.pop() {
            if b & 0xC0 != 0x80 {
                return true;
            }
        }
        false
    }
}

/// Next byte from the console; `None` at end of input or on a read error
fn read_byte(input: &mut dyn Read) -> Option<u8> {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return None,
            Ok(_) => return Some(byte[0]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("console read failed: {}", e);
                return None;
            }
        }
    }
}

/// `COPY CON <dst>`. End of input counts as `^Z`.
fn copy_from_console(
    ctx: &mut ShellContext,
    dst: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    let dst = dst.ok_or(ShellError::RequiredParameterMissing)?;
    let target = ctx.translate(dst)?;
    if vfs::is_dir(&target) {
        return Err(ShellError::AccessDenied);
    }
    let mut file = vfs::open_write(&target, WriteMode::Truncate).map_err(|e| {
        log::warn!("cannot create {}: {}", target.display(), e);
        ShellError::AccessDenied
    })?;

    let guard = ctx.input_fd().and_then(|fd| match RawModeGuard::enter(fd) {
        Ok(guard) => Some(guard),
        Err(e) => {
            log::warn!("raw mode unavailable on fd {}: {}", fd, e);
            None
        }
    });
    // In cooked mode the terminal already echoes
    let echo_on = guard.is_some();

    let mut editor = LineEditor::new();
    let mut echo = Vec::new();
    let written = loop {
        let Some(byte) = read_byte(ctx.input()) else {
            break Ok(());
        };
        let step = editor.feed(byte, &mut echo);
        if echo_on && !echo.is_empty() {
            out.write_all(&echo)?;
            out.flush()?;
        }
        echo.clear();

        match step {
            Step::Continue => {}
            Step::Commit(line) => {
                if let Err(e) = file.write_all(&line) {
                    break Err(e);
                }
            }
            Step::End => break Ok(()),
        }
    };
    let written = written
        .and_then(|()| file.write_all(&editor.take_partial()))
        .and_then(|()| file.flush());
    drop(guard);

    written.map_err(|e: io::Error| {
        log::warn!("write to {} failed: {}", target.display(), e);
        ShellError::AccessDenied
    })?;
    log::debug!("typed in {}", target.display());
    report(out, 1)
}

// ============================================================================
// Copy Command
// ============================================================================

/// Copy command - copy, concatenate or type in files
pub struct CopyCommand;

impl Command for CopyCommand {
    fn name(&self) -> &'static str {
        "COPY"
    }
    fn description(&self) -> &'static str {
        "Copies one or more files to another location."
    }
    fn usage(&self) -> &'static str {
        "COPY <src> [dst]\nCOPY <src1>+<src2>[+...] <dst>\nCOPY CON <dst>\n\n\
         Wildcards in <src> need an explicit <dst>. End COPY CON input with Ctrl+Z."
    }

    fn execute(
        &self,
        args: &str,
        out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let tokens = split_copy_args(args)?;
        let src = tokens[0].as_str();
        let dst = tokens.get(1).map(String::as_str);

        if is_con(src) {
            return copy_from_console(ctx, dst, out);
        }
        if src.contains('+') {
            return concatenate(ctx, src, dst, out);
        }

        let src_path = ctx.translate(src)?;
        let (dir, pattern) = dos::split_path(&src_path);
        if pattern.contains(['*', '?']) {
            return copy_wildcard(ctx, dir, &pattern, dst, out);
        }

        match vfs::kind(&src_path) {
            Ok(EntryKind::Directory) => copy_wildcard(ctx, &src_path, "*", dst, out),
            Ok(_) => copy_single(ctx, &src_path, dst, out),
            Err(_) => Err(ShellError::NotFound),
        }
    }
}

/// Static instance
pub static COPY_CMD: CopyCommand = CopyCommand;

// ============================================================================
// Unit Tests
// ============================================================================

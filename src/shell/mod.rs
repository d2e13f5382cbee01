//! Shell Module
//!
//! Synchronous command execution for the console prompt. Commands implement
//! the `Command` trait and are registered in a `CommandRegistry`; one
//! `ShellContext` carries the session state between them.
//!
//! A line is dispatched as:
//! - blank: nothing
//! - `X:` alone: drive switch (only `C:` exists)
//! - otherwise the leading alphanumeric run is the verb and the trimmed
//!   remainder is handed to the command as one argument string

pub mod commands;

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};

use crate::config;
use crate::dos::{self, PathError};

// Re-export commonly used items
pub use commands::{CommandRegistry, create_default_registry};

// ============================================================================
// Shell Error Types
// ============================================================================

/// Errors a builtin can end with. `Display` is the text shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("File not found")]
    NotFound,
    #[error("Invalid drive specification")]
    InvalidDrive,
    #[error("Access denied")]
    AccessDenied,
    #[error("Invalid number of parameters")]
    InvalidParameters,
    #[error("Required parameter missing")]
    RequiredParameterMissing,
    #[error("The syntax of the command is incorrect.")]
    SyntaxError,
    #[error("Invalid switch - {0}")]
    InvalidSwitch(String),
    #[error("Invalid parameter - {0}")]
    InvalidParameter(String),
    #[error("The system cannot find the path specified.")]
    PathNotFound,
    #[error("The system cannot find the file specified.")]
    CannotFindFile,
    #[error("A subdirectory or file {0} already exists.")]
    AlreadyExists(String),
    #[error("The directory is not empty.")]
    DirectoryNotEmpty,
    #[error("A duplicate file name exists, or the file cannot be found.")]
    DuplicateFileName,
    #[error("The file cannot be copied onto itself.")]
    CopyOntoItself,
    #[error("The filename or extension is too long.")]
    PathTooLong,
    #[error("Bad command or file name")]
    BadCommand,
    /// Writing to the console itself failed
    #[error("Write fault error writing device CON")]
    Console(#[from] io::Error),
    /// Leave the prompt loop
    #[error("exit")]
    Exit,
    /// Power the machine off
    #[error("poweroff")]
    PowerOff,
    /// Restart the machine
    #[error("reboot")]
    Reboot,
}

impl From<PathError> for ShellError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::Empty => ShellError::RequiredParameterMissing,
            PathError::InvalidDrive => ShellError::InvalidDrive,
            PathError::TooLong => ShellError::PathTooLong,
        }
    }
}

// ============================================================================
// Shell Context (per-session state)
// ============================================================================

/// Per-session shell context: where we are, how the console looks, and
/// where interactive input comes from.
///
/// The current directory is owned here rather than being the process cwd,
/// so every path goes through [`ShellContext::resolve`].
pub struct ShellContext {
    /// Canonical fixed root (`C:\`)
    root: PathBuf,
    /// Canonical current directory, always under `root`
    cwd: PathBuf,
    /// Prompt shown (`ECHO ON`)
    echo: bool,
    /// Current DOS color attribute
    color: u8,
    /// Where `COLOR` persists the attribute; `None` keeps it in memory
    color_file: Option<PathBuf>,
    /// Running as PID 1
    init: bool,
    /// Source for `COPY CON`
    input: Box<dyn Read>,
    /// Terminal fd behind `input`, switched to raw mode while typing
    input_fd: Option<RawFd>,
}

impl ShellContext {
    /// Create a context rooted at `root`, starting in the root
    pub fn new(root: &Path) -> Self {
        let root = fs::canonicalize(root).unwrap_or_else(|e| {
            log::warn!("cannot canonicalize root {}: {}", root.display(), e);
            root.to_path_buf()
        });
        let stdin = io::stdin();
        let input_fd = stdin.is_terminal().then_some(libc::STDIN_FILENO);
        Self {
            cwd: root.clone(),
            root,
            echo: true,
            color: config::DEFAULT_COLOR,
            color_file: None,
            init: false,
            input: Box::new(stdin),
            input_fd,
        }
    }

    /// Replace the `COPY CON` input; `fd` is set only for a real terminal
    pub fn set_input(&mut self, input: Box<dyn Read>, fd: Option<RawFd>) {
        self.input = input;
        self.input_fd = fd;
    }

    pub fn input(&mut self) -> &mut dyn Read {
        &mut *self.input
    }

    pub fn input_fd(&self) -> Option<RawFd> {
        self.input_fd
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn echo(&self) -> bool {
        self.echo
    }

    pub fn set_echo(&mut self, on: bool) {
        self.echo = on;
    }

    pub fn color(&self) -> u8 {
        self.color
    }

    pub fn set_color(&mut self, attr: u8) {
        self.color = attr;
    }

    pub fn color_file(&self) -> Option<&Path> {
        self.color_file.as_deref()
    }

    pub fn set_color_file(&mut self, path: Option<PathBuf>) {
        self.color_file = path;
    }

    pub fn is_init(&self) -> bool {
        self.init
    }

    pub fn set_init(&mut self, init: bool) {
        self.init = init;
    }

    /// Make a translated POSIX path absolute against the current directory
    pub fn resolve(&self, posix: &str) -> PathBuf {
        let path = Path::new(posix);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Translate a DOS path and resolve it
    pub fn translate(&self, dos_path: &str) -> Result<PathBuf, ShellError> {
        let posix = dos::dos_to_posix(&self.root, dos_path)?;
        Ok(self.resolve(&posix))
    }

    /// Current directory in DOS form
    pub fn dos_cwd(&self) -> String {
        dos::posix_to_dos(&self.root, &self.cwd)
    }

    /// DOS form of an arbitrary directory
    pub fn dos_display(&self, path: &Path) -> String {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        dos::posix_to_dos(&self.root, &path)
    }

    /// Prompt text, e.g. `C:\> ` or `C:\DOS> `
    pub fn prompt(&self) -> String {
        format!("{}> ", self.dos_cwd())
    }

    /// Change the current directory.
    ///
    /// `..` above the root lands on the root.
    pub fn change_dir(&mut self, dos_path: &str) -> Result<(), ShellError> {
        let target = self.translate(dos_path)?;
        let target = fs::canonicalize(&target).map_err(|_| ShellError::PathNotFound)?;
        if !target.is_dir() {
            return Err(ShellError::PathNotFound);
        }
        if target.starts_with(&self.root) {
            self.cwd = target;
        } else {
            log::debug!("{} is outside the root, staying at C:\\", target.display());
            self.cwd = self.root.clone();
        }
        Ok(())
    }

    /// True if `path` is the fixed root itself
    pub fn is_root(&self, path: &Path) -> bool {
        match fs::canonicalize(path) {
            Ok(path) => path == self.root,
            Err(_) => false,
        }
    }
}

// ============================================================================
// Command Trait
// ============================================================================

/// A command that can be executed by the shell
///
/// Commands are stateless and implemented as unit structs; everything that
/// must outlive one invocation lives in the `ShellContext`.
pub trait Command: Sync {
    /// The primary name of the command
    fn name(&self) -> &'static str;

    /// Alternative names for the command (aliases)
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-line description for help text
    fn description(&self) -> &'static str;

    /// Detailed usage information
    fn usage(&self) -> &'static str {
        ""
    }

    /// Execute the command
    ///
    /// - `args`: verb-stripped, trimmed argument string
    /// - `out`: console output
    /// - `ctx`: session state
    fn execute(&self, args: &str, out: &mut dyn Write, ctx: &mut ShellContext)
    -> Result<(), ShellError>;
}

// ============================================================================
// Line Parsing
// ============================================================================

/// Split a command line into (verb, argument).
///
/// The verb is the leading run of ASCII alphanumerics, so `CD\` and
/// `DIR/W` need no space.
pub fn split_verb(line: &str) -> (&str, &str) {
    let line = line.trim();
    let end = line
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(line.len());
    (&line[..end], line[end..].trim())
}

/// `X:` on its own
fn drive_switch(line: &str) -> Option<char> {
    let letter = dos::path::drive_prefix(line)?;
    (line.len() == 2).then_some(letter)
}

// ============================================================================
// Dispatcher
// ============================================================================

/// What the prompt loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
    PowerOff,
    Reboot,
}

/// Result of executing one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether the command succeeded
    pub success: bool,
    /// What the prompt loop should do next
    pub flow: Flow,
}

impl ExecutionResult {
    const fn ok() -> Self {
        Self {
            success: true,
            flow: Flow::Continue,
        }
    }

    const fn failed() -> Self {
        Self {
            success: false,
            flow: Flow::Continue,
        }
    }
}

/// Execute one command line, writing all output (errors included) to `out`
pub fn execute_line(
    line: &str,
    registry: &CommandRegistry,
    ctx: &mut ShellContext,
    out: &mut dyn Write,
) -> ExecutionResult {
    let line = line.trim();
    if line.is_empty() {
        return ExecutionResult::ok();
    }

    let outcome = match drive_switch(line) {
        Some(letter) if letter.eq_ignore_ascii_case(&(dos::path::DRIVE_LETTER as char)) => Ok(()),
        Some(_) => Err(ShellError::InvalidDrive),
        None => dispatch(line, registry, ctx, out),
    };

    let result = match outcome {
        Ok(()) => ExecutionResult::ok(),
        Err(ShellError::Exit) => ExecutionResult {
            success: true,
            flow: Flow::Exit,
        },
        Err(ShellError::PowerOff) => ExecutionResult {
            success: true,
            flow: Flow::PowerOff,
        },
        Err(ShellError::Reboot) => ExecutionResult {
            success: true,
            flow: Flow::Reboot,
        },
        Err(e) => {
            log::debug!("{:?} from {:?}", e, line);
            if let Err(write_err) = writeln!(out, "{}", e) {
                log::warn!("console write failed: {}", write_err);
            }
            ExecutionResult::failed()
        }
    };

    if let Err(e) = out.flush() {
        log::warn!("console flush failed: {}", e);
    }
    result
}

fn dispatch(
    line: &str,
    registry: &CommandRegistry,
    ctx: &mut ShellContext,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    let (verb, args) = split_verb(line);
    let cmd = registry.find(verb).ok_or(ShellError::BadCommand)?;

    if args.contains("/?") {
        return write_usage(cmd, out);
    }
    cmd.execute(args, out, ctx)
}

/// Print a command's usage block
pub fn write_usage(cmd: &dyn Command, out: &mut dyn Write) -> Result<(), ShellError> {
    writeln!(out, "{}", cmd.description())?;
    if !cmd.usage().is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", cmd.usage())?;
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(line: &str, ctx: &mut ShellContext) -> (ExecutionResult, String) {
        let registry = create_default_registry();
        let mut out = Vec::new();
        let result = execute_line(line, &registry, ctx, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_split_verb() {
        assert_eq!(split_verb("dir /w"), ("dir", "/w"));
        assert_eq!(split_verb("CD\\"), ("CD", "\\"));
        assert_eq!(split_verb("cd.."), ("cd", ".."));
        assert_eq!(split_verb("  copy  a.txt   b.txt "), ("copy", "a.txt   b.txt"));
        assert_eq!(split_verb("\\x"), ("", "\\x"));
    }

    #[test]
    fn test_drive_switch() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ShellContext::new(dir.path());

        let (result, out) = run("c:", &mut ctx);
        assert!(result.success);
        assert!(out.is_empty());

        let (result, out) = run("D:", &mut ctx);
        assert!(!result.success);
        assert_eq!(out, "Invalid drive specification\n");
    }

    #[test]
    fn test_unknown_verb() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ShellContext::new(dir.path());
        let (result, out) = run("frobnicate now", &mut ctx);
        assert!(!result.success);
        assert_eq!(out, "Bad command or file name\n");
    }

    #[test]
    fn test_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ShellContext::new(dir.path());
        let (result, out) = run("   ", &mut ctx);
        assert_eq!(result.flow, Flow::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn test_usage_switch_does_not_execute() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ShellContext::new(dir.path());
        let (result, out) = run("md /?", &mut ctx);
        assert!(result.success);
        assert!(out.contains("MD <dir>"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_prompt_tracks_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("DOS")).unwrap();
        let mut ctx = ShellContext::new(dir.path());
        assert_eq!(ctx.prompt(), "C:\\> ");
        ctx.change_dir("DOS").unwrap();
        assert_eq!(ctx.prompt(), "C:\\DOS> ");
    }

    #[test]
    fn test_change_dir_clamps_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ShellContext::new(dir.path());
        ctx.change_dir("..").unwrap();
        assert_eq!(ctx.dos_cwd(), "C:\\");
        assert!(ctx.is_root(ctx.cwd()));
    }

    #[test]
    fn test_change_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("FILE"), b"x").unwrap();
        let mut ctx = ShellContext::new(dir.path());
        assert!(matches!(ctx.change_dir("NOPE"), Err(ShellError::PathNotFound)));
        assert!(matches!(ctx.change_dir("FILE"), Err(ShellError::PathNotFound)));
        assert!(matches!(ctx.change_dir("Q:\\"), Err(ShellError::InvalidDrive)));
    }

    #[test]
    fn test_translate_resolves_against_session_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("SUB")).unwrap();
        let mut ctx = ShellContext::new(dir.path());
        ctx.change_dir("\\SUB").unwrap();

        let root = ctx.root().to_path_buf();
        assert_eq!(ctx.translate("A.TXT").unwrap(), root.join("SUB").join("A.TXT"));
        assert_eq!(ctx.translate("C:\\B.TXT").unwrap(), root.join("B.TXT"));
        assert!(matches!(ctx.translate("  "), Err(ShellError::RequiredParameterMissing)));
    }

    #[test]
    fn test_exit_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ShellContext::new(dir.path());
        let (result, _) = run("exit", &mut ctx);
        assert_eq!(result.flow, Flow::Exit);

        ctx.set_init(true);
        let (result, out) = run("EXIT", &mut ctx);
        assert_eq!(result.flow, Flow::Continue);
        assert!(!out.is_empty());
    }
}

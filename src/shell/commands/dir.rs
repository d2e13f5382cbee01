//! Directory Listing
//!
//! `DIR [filespec] [/W] [/A]`: enumerate one directory in file-system order,
//! filter by a wildcard pattern and render the classic DOS layout:
//!
//! ```text
//!
//!  Directory of C:\DOS
//!
//! 01-31-25  09:05PM    <DIR>          GAMES
//! 01-31-25  09:07PM           12345 README.TXT
//!
//!        1 File(s)          12345 bytes
//!        1 Dir(s)
//!
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

use crate::config::{WIDE_COLUMNS, WIDE_COLUMN_WIDTH};
use crate::dos;
use crate::shell::{Command, ShellContext, ShellError};
use crate::vfs::{self, DirEntry};

// ============================================================================
// Arguments
// ============================================================================

/// Parsed `DIR` arguments
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DirArgs<'a> {
    /// `/W`: names only, several per row
    pub wide: bool,
    /// `/A`: include `.` and `..`
    pub all: bool,
    /// Path or pattern to list
    pub spec: Option<&'a str>,
}

/// A token is a switch group if every `/`-separated piece is one letter
/// (`/W`, `/a`, `/W/A`); anything else starting with `/` is a path.
fn switch_letters(token: &str) -> Option<Vec<char>> {
    let body = token.strip_prefix('/')?;
    let mut letters = Vec::new();
    for piece in body.split('/') {
        let mut chars = piece.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => letters.push(c),
            _ => return None,
        }
    }
    Some(letters)
}

pub fn parse_args(args: &str) -> Result<DirArgs<'_>, ShellError> {
    let mut parsed = DirArgs::default();

    for token in args.split_whitespace() {
        if let Some(letters) = switch_letters(token) {
            for letter in letters {
                match letter.to_ascii_uppercase() {
                    'W' => parsed.wide = true,
                    'A' => parsed.all = true,
                    _ => return Err(ShellError::InvalidSwitch(format!("/{}", letter))),
                }
            }
        } else if parsed.spec.is_some() {
            return Err(ShellError::InvalidParameters);
        } else {
            parsed.spec = Some(token);
        }
    }

    Ok(parsed)
}

/// Turn the filespec into the directory to scan and the pattern to keep
fn target(ctx: &ShellContext, spec: Option<&str>) -> Result<(PathBuf, String), ShellError> {
    let Some(spec) = spec else {
        return Ok((ctx.cwd().to_path_buf(), String::from("*")));
    };

    let path = ctx.translate(spec)?;
    let (dir, pattern) = dos::split_path(&path);
    if !pattern.contains(['*', '?']) && vfs::is_dir(&path) {
        return Ok((path.clone(), String::from("*")));
    }
    Ok((dir.to_path_buf(), pattern.into_owned()))
}

// ============================================================================
// Listing
// ============================================================================

/// Matching entries plus the summary counts
#[derive(Debug)]
pub struct Listing {
    pub entries: Vec<DirEntry>,
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
}

/// Scan `dir` for `pattern`. No matches at all is `NotFound`, as is a
/// directory that cannot be opened.
pub fn list(dir: &Path, pattern: &str, include_dots: bool) -> Result<Listing, ShellError> {
    let entries = vfs::scan_dir(dir, pattern, include_dots).map_err(|e| {
        log::debug!("cannot list {}: {}", dir.display(), e);
        ShellError::NotFound
    })?;
    if entries.is_empty() {
        return Err(ShellError::NotFound);
    }

    let mut listing = Listing {
        entries: Vec::new(),
        files: 0,
        dirs: 0,
        bytes: 0,
    };
    for entry in &entries {
        if entry.is_dir() {
            listing.dirs += 1;
        } else {
            listing.files += 1;
            listing.bytes += entry.size;
        }
    }
    listing.entries = entries;
    Ok(listing)
}

/// One long-format line (without the newline)
pub fn format_long<Tz: TimeZone>(entry: &DirEntry, when: &DateTime<Tz>) -> String {
    let (pm, hour) = when.hour12();
    let stamp = format!(
        "{:02}-{:02}-{:02}  {:02}:{:02}{}",
        when.month(),
        when.day(),
        when.year().rem_euclid(100),
        hour,
        when.minute(),
        if pm { "PM" } else { "AM" }
    );
    if entry.is_dir() {
        format!("{}    <DIR>          {}", stamp, entry.name)
    } else {
        format!("{} {:>14} {}", stamp, entry.size, entry.name)
    }
}

/// Wide-format rows: fixed columns, directories in brackets
pub fn format_wide(entries: &[DirEntry]) -> Vec<String> {
    entries
        .chunks(WIDE_COLUMNS)
        .map(|row| {
            let mut line = String::new();
            for entry in row {
                let label = if entry.is_dir() {
                    format!("[{}]", entry.name)
                } else {
                    entry.name.clone()
                };
                line.push_str(&format!("{:<width$}", label, width = WIDE_COLUMN_WIDTH - 1));
                line.push(' ');
            }
            line.trim_end().to_string()
        })
        .collect()
}

fn local_time(modified: Option<SystemTime>) -> DateTime<Local> {
    DateTime::<Local>::from(modified.unwrap_or(SystemTime::UNIX_EPOCH))
}

/// Render a whole listing: header, body and summary
pub fn render(
    out: &mut dyn Write,
    heading: &str,
    listing: &Listing,
    wide: bool,
) -> Result<(), ShellError> {
    write!(out, "\n Directory of {}\n\n", heading)?;

    if wide {
        for row in format_wide(&listing.entries) {
            writeln!(out, "{}", row)?;
        }
    } else {
        for entry in &listing.entries {
            writeln!(out, "{}", format_long(entry, &local_time(entry.modified)))?;
        }
    }

    write!(
        out,
        "\n{:>8} File(s) {:>14} bytes\n{:>8} Dir(s)\n\n",
        listing.files, listing.bytes, listing.dirs
    )?;
    Ok(())
}

// ============================================================================
// Dir Command
// ============================================================================

/// Dir command - list directory contents
pub struct DirCommand;

impl Command for DirCommand {
    fn name(&self) -> &'static str {
        "DIR"
    }
    fn description(&self) -> &'static str {
        "Displays a list of files and subdirectories in a directory."
    }
    fn usage(&self) -> &'static str {
        "DIR [filespec] [/W] [/A]\n\n  /W  Wide list format.\n  /A  Include the . and .. entries."
    }

    fn execute(
        &self,
        args: &str,
        out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let args = parse_args(args)?;
        let (dir, pattern) = target(ctx, args.spec)?;
        let listing = list(&dir, &pattern, args.all)?;
        render(out, &ctx.dos_display(&dir), &listing, args.wide)
    }
}

/// Static instance
pub static DIR_CMD: DirCommand = DirCommand;

// ============================================================================
// Unit Tests
// ============================================================================

//! Terminal control
//!
//! Raw-mode switching for the console (used by `COPY CON`), the control
//! bytes the line editor reacts to, and ANSI renderings of DOS color
//! attributes.

use std::io;
use std::mem::MaybeUninit;
use std::os::fd::RawFd;

/// Control bytes understood by the type-in editor
pub mod keys {
    /// Ctrl+Z, end of input
    pub const END_OF_INPUT: u8 = 0x1A;
    pub const BACKSPACE: u8 = 0x08;
    pub const DELETE: u8 = 0x7F;
    pub const TAB: u8 = b'\t';
    pub const CR: u8 = b'\r';
    pub const LF: u8 = b'\n';

    /// Visually erase one character
    pub const ERASE: &[u8] = b"\x08 \x08";
}

/// Clear screen and home the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Reset all attributes
pub const RESET_ATTRIBUTES: &str = "\x1b[0m";

// ============================================================================
// Raw Mode
// ============================================================================

/// Console in raw mode; the saved attributes come back when dropped.
///
/// Raw here means no canonical line editing, no echo and no signal
/// generation. Output processing is left alone so `\n` still moves to
/// the start of the next line.
pub struct RawModeGuard {
    fd: RawFd,
    saved: libc::termios,
}

impl RawModeGuard {
    /// Switch `fd` to raw mode
    pub fn enter(fd: RawFd) -> io::Result<Self> {
        let mut saved = MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr fully initializes `saved` when it returns 0
        let saved = unsafe {
            if libc::tcgetattr(fd, saved.as_mut_ptr()) != 0 {
                return Err(io::Error::last_os_error());
            }
            saved.assume_init()
        };

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG | libc::IEXTEN);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        // SAFETY: `raw` is a valid termios derived from the current settings
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        log::debug!("fd {} in raw mode", fd);
        Ok(Self { fd, saved })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // SAFETY: restoring attributes previously read from the same fd
        if unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &self.saved) } != 0 {
            log::warn!(
                "failed to restore terminal mode on fd {}: {}",
                self.fd,
                io::Error::last_os_error()
            );
        }
    }
}

// ============================================================================
// Colors
// ============================================================================

/// DOS palette index -> ANSI color number
const DOS_TO_ANSI: [u8; 8] = [0, 4, 2, 6, 1, 5, 3, 7];

/// Parse a `COLOR` attribute: two hex digits, background then foreground.
/// A single digit sets the foreground on black.
pub fn parse_color(text: &str) -> Option<u8> {
    if text.is_empty() || text.len() > 2 || !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(text, 16).ok()
}

/// ANSI escape sequence selecting a DOS color attribute
pub fn color_escape(attr: u8) -> String {
    let fg = attr & 0x0F;
    let bg = attr >> 4;
    let ansi_fg = (if fg >= 8 { 90 } else { 30 }) + DOS_TO_ANSI[(fg & 7) as usize];
    let ansi_bg = (if bg >= 8 { 100 } else { 40 }) + DOS_TO_ANSI[(bg & 7) as usize];
    format!("\x1b[0;{};{}m", ansi_fg, ansi_bg)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("1F"), Some(0x1F));
        assert_eq!(parse_color("a"), Some(0x0A));
        assert_eq!(parse_color(""), None);
        assert_eq!(parse_color("123"), None);
        assert_eq!(parse_color("zz"), None);
    }

    #[test]
    fn test_color_escape() {
        // Default grey on black
        assert_eq!(color_escape(0x07), "\x1b[0;37;40m");
        // Bright white on blue
        assert_eq!(color_escape(0x1F), "\x1b[0;97;44m");
        // Yellow (DOS 6) on bright red (DOS C)
        assert_eq!(color_escape(0xC6), "\x1b[0;33;101m");
    }

    #[test]
    fn test_raw_mode_on_non_tty_fails() {
        let file = tempfile::tempfile().unwrap();
        let fd = std::os::fd::AsRawFd::as_raw_fd(&file);
        assert!(RawModeGuard::enter(fd).is_err());
    }
}

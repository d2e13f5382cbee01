//! DOS-modern: a DOS-style `C:\>` init shell over a POSIX file tree.
//!
//! - [`dos`]: DOS path grammar, wildcards and filespec splitting
//! - [`vfs`]: host filesystem access in DOS terms
//! - [`shell`]: session state, command registry and the builtins
//! - [`terminal`]: raw console mode and color escapes
//! - [`boot`]: PID 1 duties (console, mounts, reaping, power)

pub mod boot;
pub mod config;
pub mod console;
pub mod dos;
pub mod shell;
pub mod terminal;
pub mod vfs;

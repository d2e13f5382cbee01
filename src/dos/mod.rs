//! DOS Path Grammar
//!
//! Everything that understands DOS-flavoured path text lives here:
//! - [`path`]: `C:\FOO\BAR` <-> POSIX translation under a fixed root
//! - [`wildcard`]: case-insensitive `*` / `?` segment matching
//! - [`filespec`]: splitting a path-with-pattern into (directory, pattern)

pub mod filespec;
pub mod path;
pub mod wildcard;

pub use filespec::{has_wildcard, split_path, split_spec};
pub use path::{PathError, dos_to_posix, is_separator, posix_to_dos};
pub use wildcard::matches;

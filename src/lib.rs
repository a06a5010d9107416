//! Directory listing with brace and glob expansion of its arguments.
//!
//! The whole pipeline lives in [`app`]: patterns are expanded, each path is
//! stat'ed, directories are read, filtered, sorted and formatted one line per
//! entry. [`app::run`] wraps it for the `lister` binary.

pub mod app;

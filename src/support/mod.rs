//! Shared utilities: color and dimension conversion, case conversion,
//! similarity hints, glob matching, and reference extraction.

pub mod casing;
pub mod color;
pub mod dimension;
pub mod globs;
pub mod refs;
pub mod suggest;

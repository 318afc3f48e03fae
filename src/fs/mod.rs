//! Filesystem utilities for docfill.

pub mod atomic;

pub use atomic::{atomic_write, atomic_write_file};

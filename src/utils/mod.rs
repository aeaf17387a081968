//! Generic utility primitives with zero domain knowledge.
//!
//! - `case` - Casing helpers for template paths
//! - `io` - File I/O with consistent error handling

pub mod case;
pub mod io;

//! Deterministic JSON serialization for the session file and command output.

mod json;

pub use json::*;

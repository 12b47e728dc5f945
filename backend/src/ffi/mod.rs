//! Python bindings
//!
//! The FFI boundary is minimal and safe: engines are built from JSON
//! scenario text, and all results cross into Python as plain dicts and
//! lists.

pub mod engine;
pub mod types;

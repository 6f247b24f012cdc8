//! Integration tests for the extraction pipeline
//!
//! Tests complete runs over synthetic solver log directories.

pub mod error_handling;

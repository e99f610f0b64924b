//! Tests for source parsing
//!
//! Organized by component

mod args_tests;
mod literal_tests;

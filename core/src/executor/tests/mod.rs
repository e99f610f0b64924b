//! Tests for the evaluation engine
//!
//! Organized by feature area

mod helpers;

mod condition_tests;
mod resolver_tests;
mod try_tests;

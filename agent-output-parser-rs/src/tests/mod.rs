//! Cross-module tests for the output parser
//!
//! These exercise extraction, classification and configuration together.

pub mod property_tests;

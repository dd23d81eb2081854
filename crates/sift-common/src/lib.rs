//! Common utilities for the Sift markup parser.
//!
//! This crate provides shared infrastructure used by the parsing crates:
//! - **Warning System** - deduplicated warnings routed through the `log` facade

pub mod warning;

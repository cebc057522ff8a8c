//! License identifier helpers.
//!
//! - [`spdx`] — detects the "found but unclassifiable" sentinel and normalizes
//!   common non-SPDX labels scraped from registry pages.

pub mod spdx;

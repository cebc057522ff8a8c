//! Report renderers for resolution results.
//!
//! - [`terminal`] — colored summary box and tables of missing (and, with
//!   `--verbose`, resolved) dependencies; respects `--quiet`.

pub mod terminal;

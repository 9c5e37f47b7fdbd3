//! Various configuration options to control tagsmith
//!
//! Options are always passed explicitly, either to a codec or to a
//! [`TagEngine`](crate::engine::TagEngine). There is no process-wide configuration.

mod parse_options;
mod write_options;

pub use parse_options::{ParseOptions, ParsingMode};
pub use write_options::WriteOptions;

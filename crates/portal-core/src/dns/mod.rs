//! DNS module: query parsing and spoofed answer construction.

pub mod answer;
pub mod query;

pub use answer::build_answer;
pub use query::{DnsParseError, DnsQuery};

/// Length of the fixed DNS message header in bytes.  The question section
/// starts immediately after it.
pub const HEADER_LEN: usize = 12;

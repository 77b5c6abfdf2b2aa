//! Output module for run summaries and review export
//!
//! This module handles:
//! - The `RunSummary` returned to the caller when a run ends
//! - Writing emitted reviews as a JSON array or JSON lines
//! - Printing the summary at the end of a CLI run

mod summary;
mod writer;

pub use summary::{print_summary, RunSummary};
pub use writer::{
    create_writer, JsonArrayWriter, JsonLinesWriter, OutputError, OutputResult, ReviewWriter,
};

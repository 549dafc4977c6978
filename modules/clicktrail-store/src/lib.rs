//! Append-only event log.
//!
//! One event per line, appended with a single write on a file opened in append
//! mode. Lines are never rewritten; reads return the file verbatim.

pub mod error;
pub mod line;
pub mod store;

pub use error::{Result, StoreError};
pub use line::render_line;
pub use store::{Appended, EventLog};

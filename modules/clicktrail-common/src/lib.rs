pub mod config;
pub mod types;

pub use config::{ClientConfig, ServerConfig};
pub use types::{Environment, EventKind, EventRecord, IngestAck};

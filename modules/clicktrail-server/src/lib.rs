pub mod ingest;
pub mod routes;

pub use routes::{build_router, serve, AppState};

//! HTTP surface for meetscan: a trigger that runs one ingestion cycle and a
//! read-only listing of stored messages.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;

pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod platform;
pub mod progress;
pub mod protocol;
pub mod share;
pub mod store;

pub use client::{Backend, HttpBackend};
pub use config::{Config, ProtocolKind};
pub use error::{ErrorKind, LookupError};
pub use orchestrator::{Orchestrator, RunEvent, RunHandle, RunId, RunOutcome, RunSink};
pub use protocol::FinalResult;
pub use store::{FileStore, HistoryEntry, MemoryStore, Store};

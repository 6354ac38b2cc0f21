//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-memory local store with JSON snapshot persistence
//! - **credentials**: JSON-file credential store
//! - **http**: reqwest-backed shop, directory, and ledger clients
//! - **notify**: tracing-backed notifier and telemetry sinks
//! - **network**: TCP connectivity probe
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

mod cap_fs;
pub mod credentials;
pub mod http;
pub mod memory;
pub mod network;
pub mod notify;

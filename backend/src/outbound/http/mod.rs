//! Reqwest-backed remote source adapters.
//!
//! Adapters own transport details only: request building, timeout and HTTP
//! error mapping, and JSON decoding into domain records.

mod commerce;
mod directory;
mod dto;
mod ledger;

pub use commerce::{CommerceCredentials, CommerceHttpClient};
pub use directory::DirectoryHttpClient;
pub use ledger::LedgerHttpClient;

use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("membership-sync/", env!("CARGO_PKG_VERSION"));

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

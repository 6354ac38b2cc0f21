//! Membership directory adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::dto::MemberDto;
use super::{body_preview, build_client};
use crate::domain::entities::Member;
use crate::domain::ports::{DirectorySource, DirectorySourceError};

/// Directory adapter reading the full member list from one endpoint.
pub struct DirectoryHttpClient {
    client: Client,
    endpoint: Url,
}

impl DirectoryHttpClient {
    /// Build an adapter for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }
}

#[async_trait]
impl DirectorySource for DirectoryHttpClient {
    async fn fetch_members(&self) -> Result<Vec<Member>, DirectorySourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| DirectorySourceError::transport(error.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| DirectorySourceError::transport(error.to_string()))?;
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %body_preview(body.as_ref()),
                "directory request rejected"
            );
            return Err(DirectorySourceError::status(status.as_u16()));
        }
        parse_members(body.as_ref())
    }
}

fn parse_members(body: &[u8]) -> Result<Vec<Member>, DirectorySourceError> {
    let decoded: Vec<MemberDto> = serde_json::from_slice(body).map_err(|error| {
        DirectorySourceError::decode(format!("invalid directory payload: {error}"))
    })?;
    Ok(decoded.into_iter().map(Member::from).collect())
}

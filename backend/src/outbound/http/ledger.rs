//! Personal ledger website adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use super::dto::{LedgerPageDto, LoginResponseDto};
use super::{body_preview, build_client};
use crate::domain::entities::PersonalLedger;
use crate::domain::ports::{Account, AuthToken, LedgerPage, LedgerSource, LedgerSourceError};

#[derive(Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
    password: &'a str,
}

/// Ledger adapter: `POST login` for a token, `GET ledger` for the page.
pub struct LedgerHttpClient {
    client: Client,
    login_url: Url,
    ledger_url: Url,
}

impl LedgerHttpClient {
    /// Build an adapter for the site rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or
    /// the endpoint paths cannot be resolved against `base_url`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, LedgerSourceError> {
        let client =
            build_client(timeout).map_err(|error| LedgerSourceError::transport(error.to_string()))?;
        let resolve = |path: &str| {
            base_url.join(path).map_err(|error| {
                LedgerSourceError::transport(format!("invalid ledger url for {path}: {error}"))
            })
        };
        Ok(Self {
            client,
            login_url: resolve("login")?,
            ledger_url: resolve("ledger")?,
        })
    }
}

#[async_trait]
impl LedgerSource for LedgerHttpClient {
    async fn login(&self, name: &str, secret: &str) -> Result<AuthToken, LedgerSourceError> {
        let response = self
            .client
            .post(self.login_url.clone())
            .json(&LoginRequest {
                name,
                password: secret,
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        check_status(status, body.as_ref())?;
        let decoded: LoginResponseDto = serde_json::from_slice(body.as_ref())
            .map_err(|error| LedgerSourceError::parse(format!("invalid login payload: {error}")))?;
        Ok(AuthToken::new(decoded.token))
    }

    async fn fetch_page(&self, token: &AuthToken) -> Result<LedgerPage, LedgerSourceError> {
        let response = self
            .client
            .get(self.ledger_url.clone())
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        check_status(status, body.as_bytes())?;
        Ok(LedgerPage::new(body))
    }

    fn parse(
        &self,
        page: &LedgerPage,
        account: &Account,
    ) -> Result<PersonalLedger, LedgerSourceError> {
        parse_ledger(page, account)
    }
}

fn parse_ledger(page: &LedgerPage, account: &Account) -> Result<PersonalLedger, LedgerSourceError> {
    let decoded: LedgerPageDto = serde_json::from_str(&page.body)
        .map_err(|error| LedgerSourceError::parse(format!("invalid ledger payload: {error}")))?;
    decoded.into_ledger(account).map_err(LedgerSourceError::parse)
}

fn check_status(status: StatusCode, body: &[u8]) -> Result<(), LedgerSourceError> {
    match status {
        _ if status.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(LedgerSourceError::unauthorized(format!("status {}", status.as_u16())))
        }
        _ => Err(LedgerSourceError::transport(format!(
            "status {}: {}",
            status.as_u16(),
            body_preview(body)
        ))),
    }
}

fn map_transport_error(error: reqwest::Error) -> LedgerSourceError {
    LedgerSourceError::transport(error.to_string())
}

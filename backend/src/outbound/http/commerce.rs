//! Shop REST API adapter (WooCommerce `wc/v3`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{CustomerDto, OrderDto, PaymentGatewayDto, ProductDto};
use super::{body_preview, build_client};
use crate::domain::entities::{Customer, Event, Order, PaymentMethod};
use crate::domain::ports::{CommerceSource, CommerceSourceError, FetchProgress};

const PAGE_SIZE: usize = 100;
const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// API key pair issued by the shop.
#[derive(Clone)]
pub struct CommerceCredentials {
    /// Consumer key.
    pub key: String,
    /// Consumer secret.
    pub secret: String,
}

impl std::fmt::Debug for CommerceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Shop adapter paging through `wp-json/wc/v3` collections.
pub struct CommerceHttpClient {
    client: Client,
    api_root: Url,
    credentials: CommerceCredentials,
}

impl CommerceHttpClient {
    /// Build an adapter for the shop at `shop_url`.
    /// ```rust,ignore
    /// let client = CommerceHttpClient::new(shop_url, credentials, Duration::from_secs(30))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        shop_url: Url,
        credentials: CommerceCredentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            api_root: api_root(shop_url),
            credentials,
        })
    }

    async fn fetch_all<D: DeserializeOwned>(
        &self,
        resource: &str,
        filters: &[(&str, String)],
        on_progress: FetchProgress<'_>,
    ) -> Result<Vec<D>, CommerceSourceError> {
        let url = self.api_root.join(resource).map_err(|error| {
            CommerceSourceError::transport(format!("invalid resource {resource}: {error}"))
        })?;
        let mut items = Vec::new();
        let mut page = 1_usize;
        loop {
            let response = self
                .client
                .get(url.clone())
                .basic_auth(&self.credentials.key, Some(&self.credentials.secret))
                .query(filters)
                .query(&[("per_page", PAGE_SIZE), ("page", page)])
                .send()
                .await
                .map_err(map_transport_error)?;
            let total_pages = total_pages(&response);
            let mut batch: Vec<D> = decode(response).await?;
            let fetched = batch.len();
            items.append(&mut batch);
            on_progress(page, total_pages.unwrap_or(page));
            debug!(resource, page, fetched, "commerce page fetched");

            let more = match total_pages {
                Some(total) => page < total,
                None => fetched == PAGE_SIZE,
            };
            if !more {
                return Ok(items);
            }
            page += 1;
        }
    }
}

fn api_root(mut shop_url: Url) -> Url {
    if !shop_url.path().ends_with('/') {
        let path = format!("{}/", shop_url.path());
        shop_url.set_path(&path);
    }
    shop_url
        .join("wp-json/wc/v3/")
        .unwrap_or(shop_url)
}

fn total_pages(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(TOTAL_PAGES_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

async fn decode<D: DeserializeOwned>(response: Response) -> Result<D, CommerceSourceError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    serde_json::from_slice(body.as_ref())
        .map_err(|error| CommerceSourceError::decode(format!("invalid shop payload: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> CommerceSourceError {
    CommerceSourceError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CommerceSourceError {
    CommerceSourceError::status(status.as_u16(), body_preview(body))
}

fn ignore_progress(_current: usize, _total: usize) {}

#[async_trait]
impl CommerceSource for CommerceHttpClient {
    async fn fetch_customers(&self) -> Result<Vec<Customer>, CommerceSourceError> {
        let customers: Vec<CustomerDto> = self
            .fetch_all("customers", &[("role", "all".to_owned())], &ignore_progress)
            .await?;
        Ok(customers.into_iter().map(Customer::from).collect())
    }

    async fn fetch_payments(&self) -> Result<Vec<PaymentMethod>, CommerceSourceError> {
        let gateways: Vec<PaymentGatewayDto> = self
            .fetch_all("payment_gateways", &[], &ignore_progress)
            .await?;
        Ok(gateways.into_iter().map(PaymentMethod::from).collect())
    }

    async fn fetch_orders(
        &self,
        customer_id: Option<i64>,
    ) -> Result<Vec<Order>, CommerceSourceError> {
        let filters: Vec<(&str, String)> = customer_id
            .map(|id| ("customer", id.to_string()))
            .into_iter()
            .collect();
        let orders: Vec<OrderDto> = self
            .fetch_all("orders", &filters, &ignore_progress)
            .await?;
        orders
            .into_iter()
            .map(OrderDto::into_domain)
            .collect::<Result<_, _>>()
            .map_err(CommerceSourceError::decode)
    }

    async fn fetch_events(
        &self,
        on_progress: FetchProgress<'_>,
    ) -> Result<Vec<Event>, CommerceSourceError> {
        let products: Vec<ProductDto> = self.fetch_all("products", &[], on_progress).await?;
        products
            .into_iter()
            .map(ProductDto::into_domain)
            .collect::<Result<_, _>>()
            .map_err(CommerceSourceError::decode)
    }
}

use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};

use crate::{
    error::{ResolveError, TransportError},
    model::{Coordinate, Forecast},
};

pub mod nominatim;
pub mod nws;

pub use nominatim::NominatimClient;
pub use nws::NwsClient;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal GET transport used by the live clients.
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let transport_error =
            |e: reqwest::Error| TransportError { url: url.to_string(), message: e.to_string() };

        let mut req = self.http.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let res = req.send().await.map_err(transport_error)?;
        let status = res.status().as_u16();
        let body = res.text().await.map_err(transport_error)?;

        Ok(HttpResponse { status, body })
    }
}

/// Pause applied after each successful live call.
#[async_trait]
pub trait Throttle: Send + Sync + Debug {
    async fn pause(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Throttle for FixedDelay {
    async fn pause(&self) {
        tokio::time::sleep(self.0).await;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn pause(&self) {}
}

/// Forward and reverse geocoding.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn forward(&self, query: &str) -> Result<Coordinate, ResolveError>;

    /// Address description of a coordinate, `Address Not Found` when the
    /// service knows none.
    async fn reverse(&self, at: Coordinate) -> Result<String, ResolveError>;
}

/// Hourly forecast retrieval.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    /// The forecast covering `at` together with the centroid of its area.
    async fn hourly(&self, at: Coordinate) -> Result<(Forecast, Coordinate), ResolveError>;
}

/// Issue a GET and map transport failures and non-200 statuses onto the
/// failure taxonomy. The returned body still needs decoding.
pub(crate) async fn fetch(
    transport: &dyn HttpTransport,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<String, ResolveError> {
    tracing::debug!(url, "GET");

    let res = transport.get(url, headers).await.map_err(|e| {
        tracing::debug!(error = %e, "request failed");
        ResolveError::network(url)
    })?;

    if res.status != 200 {
        tracing::debug!(status = res.status, body = %truncate_body(&res.body), "unexpected status");
        return Err(ResolveError::not_ok(res.status, url));
    }

    Ok(res.body)
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;

use crate::{
    config::NominatimConfig,
    error::ResolveError,
    model::{Coordinate, PlaceRecord, display_name},
};

use super::{Geocoder, HttpTransport, Throttle, fetch};

/// OpenStreetMap Nominatim geocoder.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    transport: Arc<dyn HttpTransport>,
    throttle: Arc<dyn Throttle>,
    base_url: String,
    referer: String,
}

impl NominatimClient {
    pub fn new(
        config: &NominatimConfig,
        transport: Arc<dyn HttpTransport>,
        throttle: Arc<dyn Throttle>,
    ) -> Self {
        Self {
            transport,
            throttle,
            base_url: config.base_url.clone(),
            referer: config.referer.clone(),
        }
    }

    fn endpoint(&self, name: &str, params: &[(&str, &str)]) -> Result<String, ResolveError> {
        let base = format!("{}/{name}", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(&base, params)
            .map(String::from)
            .map_err(|_| ResolveError::network(base))
    }

    async fn get(&self, url: &str) -> Result<serde_json::Value, ResolveError> {
        let headers = [("Referer", self.referer.as_str())];
        let body = fetch(self.transport.as_ref(), url, &headers).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(url, error = %e, "undecodable Nominatim response");
            ResolveError::format(url)
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn forward(&self, query: &str) -> Result<Coordinate, ResolveError> {
        let url = self.endpoint("search", &[("q", query), ("format", "jsonv2")])?;
        let results = self.get(&url).await?;

        let coordinate = serde_json::from_value::<Vec<PlaceRecord>>(results)
            .ok()
            .and_then(|records| records.first().and_then(PlaceRecord::coordinate))
            .ok_or_else(|| ResolveError::format(&url))?;

        tracing::debug!(query, ?coordinate, "forward geocoded");
        self.throttle.pause().await;
        Ok(coordinate)
    }

    async fn reverse(&self, at: Coordinate) -> Result<String, ResolveError> {
        let (lat, lon) = (at.latitude.to_string(), at.longitude.to_string());
        let url = self.endpoint(
            "reverse",
            &[("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "jsonv2")],
        )?;
        let record = self.get(&url).await?;

        let address = display_name(&record).ok_or_else(|| ResolveError::format(&url))?;

        tracing::debug!(?at, address, "reverse geocoded");
        self.throttle.pause().await;
        Ok(address)
    }
}

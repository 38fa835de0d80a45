use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::NwsConfig,
    error::ResolveError,
    model::{Coordinate, Forecast},
};

use super::{ForecastSource, HttpTransport, Throttle, fetch};

/// National Weather Service hourly forecast client.
///
/// Retrieval is two requests: `/points/{lat},{lon}` yields the URL of the
/// hourly forecast for the grid cell, which is then fetched.
#[derive(Debug, Clone)]
pub struct NwsClient {
    transport: Arc<dyn HttpTransport>,
    throttle: Arc<dyn Throttle>,
    base_url: String,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    forecast_hourly: String,
}

impl NwsClient {
    pub fn new(
        config: &NwsConfig,
        transport: Arc<dyn HttpTransport>,
        throttle: Arc<dyn Throttle>,
    ) -> Self {
        Self {
            transport,
            throttle,
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn points_url(&self, at: Coordinate) -> String {
        format!("{}/points/{},{}", self.base_url.trim_end_matches('/'), at.latitude, at.longitude)
    }

    async fn get(&self, url: &str) -> Result<String, ResolveError> {
        fetch(self.transport.as_ref(), url, &[("User-Agent", self.user_agent.as_str())]).await
    }
}

#[async_trait]
impl ForecastSource for NwsClient {
    async fn hourly(&self, at: Coordinate) -> Result<(Forecast, Coordinate), ResolveError> {
        let points_url = self.points_url(at);
        let body = self.get(&points_url).await?;
        let points: PointsResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(url = %points_url, error = %e, "undecodable points response");
            ResolveError::format(&points_url)
        })?;

        let forecast_url = points.properties.forecast_hourly;
        let body = self.get(&forecast_url).await?;
        let forecast = Forecast::from_json(&body).map_err(|e| {
            tracing::debug!(url = %forecast_url, error = %e, "undecodable hourly forecast");
            ResolveError::format(&forecast_url)
        })?;

        let center = forecast.distinct_centroid();
        tracing::debug!(periods = forecast.periods.len(), ?center, "hourly forecast loaded");

        self.throttle.pause().await;
        Ok((forecast, center))
    }
}

//! Execution of a parsed script.
//!
//! The immediate directives run first, in input order, threading the
//! resolved coordinate and forecast through [`Session`]. The first failure
//! aborts the run. Statistics then run against the final forecast, queue by
//! queue, followed by the attribution banners.

use chrono::{DateTime, Utc};
use std::io::Write;

use crate::{
    directive::{Directive, Script, Source},
    error::{ResolveError, RunError},
    files,
    model::{Coordinate, Forecast},
    provider::{ForecastSource, Geocoder},
    report, stats,
};

/// Which live services produced the data that ended up being used.
///
/// Each flag reflects the most recent directive of its kind, so a later
/// file-sourced directive clears what an earlier live one set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attribution {
    pub forward_geocoding: bool,
    pub reverse_geocoding: bool,
    pub live_weather: bool,
}

/// State carried between directives of one run.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub coordinate: Option<Coordinate>,
    pub forecast: Option<Forecast>,
    pub attribution: Attribution,
}

/// Runs scripts against a geocoder and a forecast source.
#[derive(Debug)]
pub struct Interpreter {
    geocoder: Box<dyn Geocoder>,
    forecasts: Box<dyn ForecastSource>,
}

impl Interpreter {
    pub fn new(geocoder: Box<dyn Geocoder>, forecasts: Box<dyn ForecastSource>) -> Self {
        Self { geocoder, forecasts }
    }

    /// Execute `script`, writing every output line to `out`.
    ///
    /// Statistic horizons are measured from `now`.
    pub async fn run<W: Write>(
        &self,
        script: &Script,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<Session, RunError> {
        let mut session = Session::default();

        for directive in &script.immediate {
            tracing::debug!(directive = directive.name(), "executing");
            self.execute(directive, &mut session, out).await?;
        }

        match &session.forecast {
            Some(forecast) => write_statistics(script, forecast, now, out)?,
            None if script.statistic_count() > 0 => {
                tracing::warn!(
                    count = script.statistic_count(),
                    "no forecast loaded, skipping statistics"
                );
            }
            None => {}
        }

        write_attribution(session.attribution, out)?;
        Ok(session)
    }

    async fn execute<W: Write>(
        &self,
        directive: &Directive,
        session: &mut Session,
        out: &mut W,
    ) -> Result<(), RunError> {
        match directive {
            Directive::Target(source) => {
                let coordinate = match source {
                    Source::File(path) => files::resolve_from_file(path)?,
                    Source::Live(query) => self.geocoder.forward(query).await?,
                };
                writeln!(out, "{}", report::target_line(coordinate))?;
                session.coordinate = Some(coordinate);
                session.attribution.forward_geocoding = matches!(source, Source::Live(_));
            }

            Directive::Weather(Source::File(path)) => {
                let forecast = files::load_from_file(path)?;
                writeln!(out, "{}", report::file_forecast_line(forecast.centroid()))?;
                session.forecast = Some(forecast);
                session.attribution.live_weather = false;
            }

            Directive::Weather(Source::Live(_)) => {
                let at = session
                    .coordinate
                    .ok_or(ResolveError::NoCoordinates { directive: directive.name() })?;
                let (forecast, center) = self.forecasts.hourly(at).await?;
                writeln!(out, "{}", report::live_forecast_line(center))?;
                session.forecast = Some(forecast);
                session.attribution.live_weather = true;

                // Unlike every other lookup, a failure here does not end the run.
                match self.geocoder.reverse(center).await {
                    Ok(address) => {
                        writeln!(out, "{}", report::location_line(&address))?;
                        session.attribution.reverse_geocoding = true;
                    }
                    Err(e) => tracing::warn!(error = %e, "forecast area lookup failed"),
                }
            }

            Directive::Reverse(Source::File(path)) => {
                let address = files::describe_reverse_from_file(path)?;
                writeln!(out, "{address}")?;
                session.attribution.reverse_geocoding = false;
            }

            Directive::Reverse(Source::Live(_)) => {
                let at = session
                    .coordinate
                    .ok_or(ResolveError::NoCoordinates { directive: directive.name() })?;
                let address = self.geocoder.reverse(at).await?;
                writeln!(out, "{address}")?;
                session.attribution.reverse_geocoding = true;
            }
        }

        Ok(())
    }
}

fn write_statistics<W: Write>(
    script: &Script,
    forecast: &Forecast,
    now: DateTime<Utc>,
    out: &mut W,
) -> std::io::Result<()> {
    for query in &script.temperature {
        writeln!(out, "{}", stats::temperature(forecast, *query, now))?;
    }
    for query in &script.feels_like {
        writeln!(out, "{}", stats::feels_like(forecast, *query, now))?;
    }
    for window in &script.humidity {
        writeln!(out, "{}", stats::humidity(forecast, *window, now))?;
    }
    for window in &script.wind {
        writeln!(out, "{}", stats::wind(forecast, *window, now))?;
    }
    for window in &script.precipitation {
        writeln!(out, "{}", stats::precipitation(forecast, *window, now))?;
    }
    Ok(())
}

fn write_attribution<W: Write>(attribution: Attribution, out: &mut W) -> std::io::Result<()> {
    if attribution.forward_geocoding {
        writeln!(out, "{}", report::FORWARD_GEOCODING_ATTRIBUTION)?;
    }
    if attribution.reverse_geocoding {
        writeln!(out, "{}", report::REVERSE_GEOCODING_ATTRIBUTION)?;
    }
    if attribution.live_weather {
        writeln!(out, "{}", report::LIVE_WEATHER_ATTRIBUTION)?;
    }
    Ok(())
}

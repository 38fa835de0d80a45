//! Output lines and the failure report.

use std::io::{self, Write};

use crate::{error::ResolveError, model::Coordinate};

pub const FORWARD_GEOCODING_ATTRIBUTION: &str = "**Forward geocoding data from OpenStreetMap";
pub const REVERSE_GEOCODING_ATTRIBUTION: &str = "**Reverse geocoding data from OpenStreetMap";
pub const LIVE_WEATHER_ATTRIBUTION: &str =
    "**Real-time weather data from National Weather Service, United States Department of Commerce";

/// Magnitude of a degree value in shortest round-trip form, always with a
/// fractional part: `34.0`, `118.2437`.
pub fn degrees(value: f64) -> String {
    let text = value.abs().to_string();
    if text.contains(['.', 'e', 'E']) || !value.is_finite() { text } else { format!("{text}.0") }
}

/// `TARGET 34.0/N 118.0/W`
pub fn target_line(at: Coordinate) -> String {
    format!(
        "TARGET {}/{} {}/{}",
        degrees(at.latitude),
        at.lat_hemisphere(),
        degrees(at.longitude),
        at.lon_hemisphere()
    )
}

/// Centroid of a forecast loaded from a file: `FORECAST 34.4°N 117.6°W`.
pub fn file_forecast_line(center: Coordinate) -> String {
    format!(
        "FORECAST {}°{} {}°{}",
        degrees(center.latitude),
        center.lat_hemisphere(),
        degrees(center.longitude),
        center.lon_hemisphere()
    )
}

/// Centroid of a live forecast. The hemisphere letters are always `N` and
/// `W`, whatever the sign; only magnitudes are printed.
pub fn live_forecast_line(center: Coordinate) -> String {
    format!("FORECAST {:.6}/N {:.6}/W", center.latitude.abs(), center.longitude.abs())
}

/// Address line printed after a live forecast.
pub fn location_line(address: &str) -> String {
    format!("Location: {address}")
}

/// Message for a dependent directive that ran without a resolved coordinate.
/// Printed instead of the standard failure report.
pub fn no_coordinates_line(directive: &str) -> String {
    format!("Error: No coordinates available from TARGET for {directive}.")
}

/// Write the report for a fatal failure.
///
/// Standard failures print `FAILED`, the resource, a status line for
/// non-200 responses, and the kind token. A missing coordinate prints a
/// single error line instead.
pub fn write_failure(out: &mut impl Write, err: &ResolveError) -> io::Result<()> {
    if let ResolveError::NoCoordinates { directive } = err {
        return writeln!(out, "{}", no_coordinates_line(directive));
    }

    writeln!(out, "FAILED")?;
    writeln!(out, "{}", err.resource())?;
    if let Some(detail) = err.detail() {
        writeln!(out, "{detail}")?;
    }
    writeln!(out, "{}", err.kind_token())
}

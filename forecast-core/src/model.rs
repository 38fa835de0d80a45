use anyhow::{Context, Result, anyhow, ensure};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Description printed when a reverse-geocoding record carries no address.
pub const ADDRESS_NOT_FOUND: &str = "Address Not Found";

/// A point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// `N` for positive latitudes, `S` otherwise (the equator reads as south).
    pub fn lat_hemisphere(&self) -> char {
        if self.latitude > 0.0 { 'N' } else { 'S' }
    }

    /// `W` for negative longitudes, `E` otherwise.
    pub fn lon_hemisphere(&self) -> char {
        if self.longitude < 0.0 { 'W' } else { 'E' }
    }
}

/// One hourly forecast record.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPeriod {
    /// Start time exactly as it appeared in the source document.
    pub start_text: String,
    pub start: DateTime<FixedOffset>,
    pub temperature_f: f64,
    pub relative_humidity: f64,
    pub wind_mph: i64,
    pub precipitation_probability: Option<f64>,
}

/// An hourly forecast: periods in source order plus the forecast area boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub periods: Vec<ForecastPeriod>,
    pub boundary: Vec<Coordinate>,
}

impl Forecast {
    /// Decode a National Weather Service hourly forecast document.
    pub fn from_json(body: &str) -> Result<Self> {
        let doc: wire::ForecastDocument =
            serde_json::from_str(body).context("Failed to parse forecast JSON")?;
        Self::try_from(doc)
    }

    /// Mean of every boundary vertex, repeated vertices included.
    pub fn centroid(&self) -> Coordinate {
        mean(self.boundary.iter())
    }

    /// Mean of the distinct boundary vertices; a closing vertex that repeats
    /// the first one is counted once.
    pub fn distinct_centroid(&self) -> Coordinate {
        let mut seen = HashSet::new();
        mean(
            self.boundary
                .iter()
                .filter(|c| seen.insert((c.latitude.to_bits(), c.longitude.to_bits()))),
        )
    }
}

fn mean<'a>(points: impl Iterator<Item = &'a Coordinate>) -> Coordinate {
    let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.latitude;
        lon += p.longitude;
        n += 1;
    }
    let n = n.max(1) as f64;
    Coordinate::new(lat / n, lon / n)
}

/// Parse the leading integer of a wind speed such as `"10 mph"` or `"5 to 10 mph"`.
pub fn parse_wind_speed(raw: &str) -> Option<i64> {
    raw.split_whitespace().next()?.parse().ok()
}

impl TryFrom<wire::ForecastDocument> for Forecast {
    type Error = anyhow::Error;

    fn try_from(doc: wire::ForecastDocument) -> Result<Self> {
        let ring = doc
            .geometry
            .coordinates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Forecast geometry has no polygon ring"))?;
        ensure!(!ring.is_empty(), "Forecast polygon ring is empty");

        let boundary = ring
            .into_iter()
            .map(|vertex| match vertex.as_slice() {
                [lon, lat, ..] => Ok(Coordinate::new(*lat, *lon)),
                _ => Err(anyhow!("Forecast polygon vertex has fewer than two values")),
            })
            .collect::<Result<Vec<_>>>()?;

        let periods = doc
            .properties
            .periods
            .into_iter()
            .map(|p| {
                let start = DateTime::parse_from_rfc3339(&p.start_time)
                    .with_context(|| format!("Invalid period start time '{}'", p.start_time))?;
                let relative_humidity = p
                    .relative_humidity
                    .value
                    .ok_or_else(|| anyhow!("Period {} has no relative humidity", p.start_time))?;
                let wind_mph = parse_wind_speed(&p.wind_speed)
                    .ok_or_else(|| anyhow!("Invalid wind speed '{}'", p.wind_speed))?;

                Ok(ForecastPeriod {
                    start_text: p.start_time,
                    start,
                    temperature_f: p.temperature,
                    relative_humidity,
                    wind_mph,
                    precipitation_probability: p.probability_of_precipitation.and_then(|q| q.value),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { periods, boundary })
    }
}

/// Wire shapes of the hourly forecast document.
pub mod wire {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastDocument {
        pub geometry: Geometry,
        pub properties: Properties,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        pub coordinates: Vec<Vec<Vec<f64>>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Properties {
        pub periods: Vec<Period>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Period {
        pub start_time: String,
        pub temperature: f64,
        pub relative_humidity: Quantity,
        pub wind_speed: String,
        #[serde(default)]
        pub probability_of_precipitation: Option<Quantity>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Quantity {
        pub value: Option<f64>,
    }
}

/// Record shape shared by forward-geocoding files and search results.
#[derive(Debug, Deserialize)]
pub(crate) struct PlaceRecord {
    pub lat: serde_json::Value,
    pub lon: serde_json::Value,
}

impl PlaceRecord {
    /// Coordinates may be encoded as strings (`"34.05"`) or as numbers.
    pub fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(degrees(&self.lat)?, degrees(&self.lon)?))
    }
}

/// `display_name` of a reverse-geocoding record. Arrays resolve to their first element.
pub(crate) fn display_name(record: &serde_json::Value) -> Option<String> {
    let object = match record {
        serde_json::Value::Array(items) => items.first()?.as_object()?,
        other => other.as_object()?,
    };
    Some(
        object
            .get("display_name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(ADDRESS_NOT_FOUND)
            .to_string(),
    )
}

fn degrees(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_document() -> serde_json::Value {
        serde_json::json!({
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [-118.0, 34.0],
                    [-118.0, 35.0],
                    [-117.0, 35.0],
                    [-117.0, 34.0],
                    [-118.0, 34.0]
                ]]
            },
            "properties": {
                "periods": [
                    {
                        "startTime": "2024-06-01T10:00:00-07:00",
                        "temperature": 75,
                        "relativeHumidity": { "unitCode": "wmoUnit:percent", "value": 40 },
                        "windSpeed": "5 mph",
                        "probabilityOfPrecipitation": { "unitCode": "wmoUnit:percent", "value": 10 }
                    },
                    {
                        "startTime": "2024-06-01T11:00:00-07:00",
                        "temperature": 80,
                        "relativeHumidity": { "value": 35 },
                        "windSpeed": "5 to 10 mph",
                        "probabilityOfPrecipitation": { "value": null }
                    }
                ]
            }
        })
    }

    #[test]
    fn decodes_forecast_document() {
        let forecast = Forecast::from_json(&sample_document().to_string()).expect("decodes");

        assert_eq!(forecast.periods.len(), 2);
        assert_eq!(forecast.boundary.len(), 5);

        let first = &forecast.periods[0];
        assert_eq!(first.start_text, "2024-06-01T10:00:00-07:00");
        assert_eq!(first.temperature_f, 75.0);
        assert_eq!(first.relative_humidity, 40.0);
        assert_eq!(first.wind_mph, 5);
        assert_eq!(first.precipitation_probability, Some(10.0));

        assert_eq!(forecast.periods[1].wind_mph, 5);
        assert_eq!(forecast.periods[1].precipitation_probability, None);
    }

    #[test]
    fn centroids_differ_on_closing_vertex() {
        let forecast = Forecast::from_json(&sample_document().to_string()).expect("decodes");

        let all = forecast.centroid();
        assert!((all.latitude - 34.4).abs() < 1e-9);
        assert!((all.longitude - -117.6).abs() < 1e-9);

        let distinct = forecast.distinct_centroid();
        assert!((distinct.latitude - 34.5).abs() < 1e-9);
        assert!((distinct.longitude - -117.5).abs() < 1e-9);
    }

    #[test]
    fn missing_humidity_is_rejected() {
        let mut doc = sample_document();
        doc["properties"]["periods"][0]["relativeHumidity"]["value"] = serde_json::Value::Null;
        assert!(Forecast::from_json(&doc.to_string()).is_err());
    }

    #[test]
    fn empty_ring_is_rejected() {
        let mut doc = sample_document();
        doc["geometry"]["coordinates"] = serde_json::json!([[]]);
        assert!(Forecast::from_json(&doc.to_string()).is_err());
    }

    #[test]
    fn zero_periods_is_a_valid_forecast() {
        let mut doc = sample_document();
        doc["properties"]["periods"] = serde_json::json!([]);
        let forecast = Forecast::from_json(&doc.to_string()).expect("decodes");
        assert!(forecast.periods.is_empty());
    }

    #[test]
    fn wind_speed_takes_leading_integer() {
        assert_eq!(parse_wind_speed("12 mph"), Some(12));
        assert_eq!(parse_wind_speed("5 to 10 mph"), Some(5));
        assert_eq!(parse_wind_speed("calm"), None);
        assert_eq!(parse_wind_speed(""), None);
    }

    #[test]
    fn hemispheres_follow_sign() {
        let la = Coordinate::new(34.0, -118.0);
        assert_eq!((la.lat_hemisphere(), la.lon_hemisphere()), ('N', 'W'));

        let sydney = Coordinate::new(-33.9, 151.2);
        assert_eq!((sydney.lat_hemisphere(), sydney.lon_hemisphere()), ('S', 'E'));

        let origin = Coordinate::new(0.0, 0.0);
        assert_eq!((origin.lat_hemisphere(), origin.lon_hemisphere()), ('S', 'E'));
    }

    #[test]
    fn display_name_falls_back_to_sentinel() {
        let named = serde_json::json!({ "display_name": "Los Angeles" });
        assert_eq!(display_name(&named).as_deref(), Some("Los Angeles"));

        let unnamed = serde_json::json!({ "place_id": 1 });
        assert_eq!(display_name(&unnamed).as_deref(), Some(ADDRESS_NOT_FOUND));

        let listed = serde_json::json!([{ "lat": "34.0", "lon": "-118.0" }]);
        assert_eq!(display_name(&listed).as_deref(), Some(ADDRESS_NOT_FOUND));

        assert_eq!(display_name(&serde_json::json!("text")), None);
        assert_eq!(display_name(&serde_json::json!([1])), None);
    }

    #[test]
    fn place_record_accepts_strings_and_numbers() {
        let rec: PlaceRecord = serde_json::from_str(r#"{"lat":"34.0","lon":-118.5}"#).unwrap();
        assert_eq!(rec.coordinate(), Some(Coordinate::new(34.0, -118.5)));

        let rec: PlaceRecord = serde_json::from_str(r#"{"lat":"north","lon":"1"}"#).unwrap();
        assert_eq!(rec.coordinate(), None);
    }
}

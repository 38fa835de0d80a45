//! Windowed extremum statistics over an hourly forecast.
//!
//! Every statistic considers the periods starting no later than
//! `now + hours`. Among equal values the first period in source order wins.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::{
    directive::{Extremum, Scale, TemperatureQuery, Window},
    model::{Forecast, ForecastPeriod},
};

/// Which quantity a statistic line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Temperature,
    FeelsLike,
    Humidity,
    Wind,
    Precipitation,
}

impl Statistic {
    fn label(&self) -> &'static str {
        match self {
            Statistic::Temperature => "temperature",
            Statistic::FeelsLike => "feels like temperature",
            Statistic::Humidity => "humidity",
            Statistic::Wind => "wind",
            Statistic::Precipitation => "precipitation",
        }
    }

    fn is_percentage(&self) -> bool {
        matches!(self, Statistic::Humidity | Statistic::Precipitation)
    }
}

/// Result of one statistic directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value { statistic: Statistic, start_time: String, value: f64 },
    NoData(Statistic),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value { statistic, start_time, value } => {
                let suffix = if statistic.is_percentage() { "%" } else { "" };
                write!(f, "{start_time} {value:.4}{suffix}")
            }
            Outcome::NoData(statistic) => write!(
                f,
                "No {} data available within the specified time range.",
                statistic.label()
            ),
        }
    }
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Rothfusz heat index regression, Fahrenheit and percent humidity.
pub fn heat_index(t: f64, rh: f64) -> f64 {
    -42.379 + 2.04901523 * t + 10.14333127 * rh
        - 0.22475541 * t * rh
        - 0.00683783 * t.powi(2)
        - 0.05481717 * rh.powi(2)
        + 0.00122874 * t.powi(2) * rh
        + 0.00085282 * t * rh.powi(2)
        - 0.00000199 * t.powi(2) * rh.powi(2)
}

/// NWS wind chill, Fahrenheit and mph.
pub fn wind_chill(t: f64, v: f64) -> f64 {
    let v16 = v.powf(0.16);
    35.74 + 0.6215 * t - 35.75 * v16 + 0.4275 * t * v16
}

/// Perceived temperature in Fahrenheit.
///
/// Heat index applies from 68°F up, wind chill at or below 50°F when the
/// wind is strictly above 3 mph. Everything else reads as the air temperature.
pub fn apparent_temperature(period: &ForecastPeriod) -> f64 {
    let t = period.temperature_f;
    let wind = period.wind_mph as f64;
    if t >= 68.0 {
        heat_index(t, period.relative_humidity)
    } else if t <= 50.0 && wind > 3.0 {
        wind_chill(t, wind)
    } else {
        t
    }
}

/// Periods starting no later than `now + hours`, in source order.
pub fn windowed(
    forecast: &Forecast,
    now: DateTime<Utc>,
    hours: i64,
) -> impl Iterator<Item = &ForecastPeriod> {
    // A horizon beyond chrono's range covers everything (or nothing, if negative).
    let end = Duration::try_hours(hours).and_then(|d| now.checked_add_signed(d));
    forecast.periods.iter().filter(move |p| match end {
        Some(end) => p.start <= end,
        None => hours > 0,
    })
}

/// First candidate holding the extreme value. Later candidates must be
/// strictly better to replace it.
fn select<T>(candidates: impl Iterator<Item = (T, f64)>, extremum: Extremum) -> Option<(T, f64)> {
    candidates.fold(None, |best, (item, value)| match best {
        Some((_, current)) if !beats(value, current, extremum) => best,
        _ => Some((item, value)),
    })
}

fn beats(candidate: f64, current: f64, extremum: Extremum) -> bool {
    match extremum {
        Extremum::Max => candidate > current,
        Extremum::Min => candidate < current,
    }
}

fn in_scale(fahrenheit: f64, scale: Scale) -> f64 {
    match scale {
        Scale::Fahrenheit => fahrenheit,
        Scale::Celsius => fahrenheit_to_celsius(fahrenheit),
    }
}

/// Air temperature extremum, reported with the forecast's first start time
/// rather than the selected period's.
pub fn temperature(forecast: &Forecast, query: TemperatureQuery, now: DateTime<Utc>) -> Outcome {
    let candidates = windowed(forecast, now, query.window.hours)
        .map(|p| ((), in_scale(p.temperature_f, query.scale)));

    match (select(candidates, query.window.extremum), forecast.periods.first()) {
        (Some(((), value)), Some(first)) => Outcome::Value {
            statistic: Statistic::Temperature,
            start_time: first.start_text.clone(),
            value,
        },
        _ => Outcome::NoData(Statistic::Temperature),
    }
}

/// Apparent values are rounded to four places before selection, so periods
/// that print the same value tie and the first one wins.
pub fn feels_like(forecast: &Forecast, query: TemperatureQuery, now: DateTime<Utc>) -> Outcome {
    let candidates = windowed(forecast, now, query.window.hours).map(|p| {
        let value = in_scale(apparent_temperature(p), query.scale);
        (p, (value * 1e4).round() / 1e4)
    });
    own_time(Statistic::FeelsLike, select(candidates, query.window.extremum))
}

pub fn humidity(forecast: &Forecast, window: Window, now: DateTime<Utc>) -> Outcome {
    let candidates = windowed(forecast, now, window.hours).map(|p| (p, p.relative_humidity));
    own_time(Statistic::Humidity, select(candidates, window.extremum))
}

pub fn wind(forecast: &Forecast, window: Window, now: DateTime<Utc>) -> Outcome {
    let candidates = windowed(forecast, now, window.hours).map(|p| (p, p.wind_mph as f64));
    own_time(Statistic::Wind, select(candidates, window.extremum))
}

/// Periods without a probability are left out before selection.
pub fn precipitation(forecast: &Forecast, window: Window, now: DateTime<Utc>) -> Outcome {
    let candidates = windowed(forecast, now, window.hours)
        .filter_map(|p| p.precipitation_probability.map(|value| (p, value)));
    own_time(Statistic::Precipitation, select(candidates, window.extremum))
}

fn own_time(statistic: Statistic, selected: Option<(&ForecastPeriod, f64)>) -> Outcome {
    match selected {
        Some((period, value)) => {
            Outcome::Value { statistic, start_time: period.start_text.clone(), value }
        }
        None => Outcome::NoData(statistic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn period(start: &str, t: f64, rh: f64, wind: i64, pop: Option<f64>) -> ForecastPeriod {
        ForecastPeriod {
            start_text: start.to_string(),
            start: DateTime::parse_from_rfc3339(start).unwrap(),
            temperature_f: t,
            relative_humidity: rh,
            wind_mph: wind,
            precipitation_probability: pop,
        }
    }

    fn forecast(periods: Vec<ForecastPeriod>) -> Forecast {
        Forecast { periods, boundary: vec![] }
    }

    /// Hourly periods from 12:00Z onwards.
    fn sample() -> Forecast {
        forecast(vec![
            period("2024-06-01T12:00:00+00:00", 70.0, 40.0, 5, Some(10.0)),
            period("2024-06-01T13:00:00+00:00", 80.0, 30.0, 12, None),
            period("2024-06-01T14:00:00+00:00", 60.0, 80.0, 2, Some(40.0)),
            period("2024-06-01T15:00:00+00:00", 95.0, 20.0, 12, Some(40.0)),
            period("2024-06-01T16:00:00+00:00", 40.0, 90.0, 20, Some(90.0)),
        ])
    }

    fn window(hours: i64, extremum: Extremum) -> Window {
        Window { hours, extremum }
    }

    fn temp(scale: Scale, hours: i64, extremum: Extremum) -> TemperatureQuery {
        TemperatureQuery { scale, window: window(hours, extremum) }
    }

    #[test]
    fn window_is_a_filter_not_a_prefix() {
        let f = forecast(vec![
            period("2024-06-01T20:00:00+00:00", 1.0, 1.0, 1, None),
            period("2024-06-01T12:00:00+00:00", 2.0, 1.0, 1, None),
            period("2024-06-01T23:00:00+00:00", 3.0, 1.0, 1, None),
            period("2024-06-01T13:00:00+00:00", 4.0, 1.0, 1, None),
        ]);
        let starts: Vec<_> = windowed(&f, now(), 2).map(|p| p.temperature_f).collect();
        assert_eq!(starts, vec![2.0, 4.0]);
    }

    #[test]
    fn huge_horizons_do_not_overflow() {
        let f = sample();
        assert_eq!(windowed(&f, now(), i64::MAX).count(), 5);
        assert_eq!(windowed(&f, now(), i64::MIN).count(), 0);
    }

    #[test]
    fn window_respects_utc_offsets() {
        // 06:00-07:00 is 13:00Z.
        let f = forecast(vec![period("2024-06-01T06:00:00-07:00", 50.0, 1.0, 1, None)]);
        assert_eq!(windowed(&f, now(), 0).count(), 0);
        assert_eq!(windowed(&f, now(), 1).count(), 1);
    }

    #[test]
    fn selected_period_lies_in_window_and_is_unbeaten() {
        let f = sample();
        for hours in 0..6 {
            for extremum in [Extremum::Max, Extremum::Min] {
                let outcome = humidity(&f, window(hours, extremum), now());
                let Outcome::Value { start_time, value, .. } = outcome else {
                    panic!("expected a value for {hours}h");
                };
                let chosen = f.periods.iter().find(|p| p.start_text == start_time).unwrap();
                assert!(chosen.start <= now() + Duration::hours(hours));
                assert!(
                    windowed(&f, now(), hours).all(|p| !beats(p.relative_humidity, value, extremum))
                );
            }
        }
    }

    #[test]
    fn temperature_reports_first_period_time() {
        let f = sample();
        let out = temperature(&f, temp(Scale::Fahrenheit, 4, Extremum::Max), now());
        assert_eq!(out.to_string(), "2024-06-01T12:00:00+00:00 95.0000");

        let out = temperature(&f, temp(Scale::Celsius, 4, Extremum::Min), now());
        assert_eq!(out.to_string(), "2024-06-01T12:00:00+00:00 4.4444");
    }

    #[test]
    fn other_statistics_report_their_own_time() {
        let f = sample();

        assert_eq!(
            humidity(&f, window(3, Extremum::Min), now()).to_string(),
            "2024-06-01T15:00:00+00:00 20.0000%"
        );
        assert_eq!(
            wind(&f, window(3, Extremum::Min), now()).to_string(),
            "2024-06-01T14:00:00+00:00 2.0000"
        );
        assert_eq!(
            precipitation(&f, window(4, Extremum::Max), now()).to_string(),
            "2024-06-01T16:00:00+00:00 90.0000%"
        );
    }

    #[test]
    fn ties_keep_the_first_period() {
        let f = sample();
        // 13:00 and 15:00 both blow at 12 mph.
        assert_eq!(
            wind(&f, window(3, Extremum::Max), now()).to_string(),
            "2024-06-01T13:00:00+00:00 12.0000"
        );
        // 14:00 and 15:00 both carry a 40% chance.
        assert_eq!(
            precipitation(&f, window(3, Extremum::Max), now()).to_string(),
            "2024-06-01T14:00:00+00:00 40.0000%"
        );
    }

    #[test]
    fn precipitation_skips_missing_probabilities() {
        let f = forecast(vec![
            period("2024-06-01T12:00:00+00:00", 70.0, 40.0, 5, None),
            period("2024-06-01T13:00:00+00:00", 70.0, 40.0, 5, Some(0.0)),
        ]);
        assert_eq!(
            precipitation(&f, window(5, Extremum::Max), now()).to_string(),
            "2024-06-01T13:00:00+00:00 0.0000%"
        );

        let f = forecast(vec![period("2024-06-01T12:00:00+00:00", 70.0, 40.0, 5, None)]);
        assert_eq!(
            precipitation(&f, window(5, Extremum::Max), now()),
            Outcome::NoData(Statistic::Precipitation)
        );
    }

    #[test]
    fn empty_window_yields_no_data_everywhere() {
        let empty = forecast(vec![]);
        let q = temp(Scale::Fahrenheit, 24, Extremum::Max);
        let w = window(24, Extremum::Max);

        assert_eq!(
            temperature(&empty, q, now()).to_string(),
            "No temperature data available within the specified time range."
        );
        assert_eq!(
            feels_like(&empty, q, now()).to_string(),
            "No feels like temperature data available within the specified time range."
        );
        assert_eq!(
            humidity(&empty, w, now()).to_string(),
            "No humidity data available within the specified time range."
        );
        assert_eq!(
            wind(&empty, w, now()).to_string(),
            "No wind data available within the specified time range."
        );
        assert_eq!(
            precipitation(&empty, w, now()).to_string(),
            "No precipitation data available within the specified time range."
        );

        // Periods exist but all start after the horizon.
        let late = sample();
        assert_eq!(
            humidity(&late, window(-1, Extremum::Max), now()),
            Outcome::NoData(Statistic::Humidity)
        );
        assert_eq!(
            temperature(&late, temp(Scale::Celsius, -1, Extremum::Min), now()),
            Outcome::NoData(Statistic::Temperature)
        );
    }

    #[test]
    fn scale_conversions_compose_to_identity() {
        for f in [-40.0, 0.0, 32.0, 68.0, 98.6, 451.0] {
            assert!((celsius_to_fahrenheit(fahrenheit_to_celsius(f)) - f).abs() < 1e-9);
        }
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn heat_index_at_ninety_and_fifty() {
        assert!((heat_index(90.0, 50.0) - 94.5969412).abs() < 1e-6);

        let p = period("2024-06-01T12:00:00+00:00", 90.0, 50.0, 0, None);
        assert!((apparent_temperature(&p) - 94.5969412).abs() < 1e-6);
    }

    #[test]
    fn wind_chill_needs_wind_above_three_mph() {
        let calm = period("2024-06-01T12:00:00+00:00", 30.0, 50.0, 3, None);
        assert_eq!(apparent_temperature(&calm), 30.0);

        let breezy = period("2024-06-01T12:00:00+00:00", 30.0, 50.0, 10, None);
        assert!((apparent_temperature(&breezy) - 21.248293255649617).abs() < 1e-9);
    }

    #[test]
    fn mild_band_reads_as_air_temperature() {
        for t in [50.5, 60.0, 67.9] {
            let p = period("2024-06-01T12:00:00+00:00", t, 90.0, 25, None);
            assert_eq!(apparent_temperature(&p), t);
        }
    }

    #[test]
    fn feels_like_selects_on_apparent_value() {
        let f = sample();
        // 95°F at 20% humidity has the highest heat index of the first four hours.
        let out = feels_like(&f, temp(Scale::Fahrenheit, 3, Extremum::Max), now());
        let expected = heat_index(95.0, 20.0);
        assert_eq!(out.to_string(), format!("2024-06-01T15:00:00+00:00 {expected:.4}"));

        let out = feels_like(&f, temp(Scale::Celsius, 4, Extremum::Min), now());
        let expected = fahrenheit_to_celsius(wind_chill(40.0, 20.0));
        assert_eq!(out.to_string(), format!("2024-06-01T16:00:00+00:00 {expected:.4}"));
    }

    #[test]
    fn feels_like_ties_at_printed_precision() {
        let f = forecast(vec![
            period("2024-06-01T12:00:00+00:00", 60.0, 50.0, 0, None),
            period("2024-06-01T12:30:00+00:00", 60.00001, 50.0, 0, None),
        ]);
        let out = feels_like(&f, temp(Scale::Fahrenheit, 5, Extremum::Max), now());
        assert_eq!(out.to_string(), "2024-06-01T12:00:00+00:00 60.0000");
    }
}

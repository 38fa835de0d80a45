//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - The directive language and its parser
//! - File-backed and live (Nominatim, National Weather Service) resolvers
//! - Windowed forecast statistics
//! - The interpreter that threads session state between directives
//! - Configuration handling
//!
//! It is used by `forecast-cli`, but can also be driven directly with any
//! [`Geocoder`] and [`ForecastSource`].

pub mod config;
pub mod directive;
pub mod error;
pub mod files;
pub mod model;
pub mod provider;
pub mod report;
pub mod session;
pub mod stats;

pub use config::{Config, NominatimConfig, NwsConfig};
pub use directive::{Directive, Script, Source, parse};
pub use error::{ResolveError, RunError, TransportError};
pub use model::{Coordinate, Forecast, ForecastPeriod};
pub use provider::{
    FixedDelay, ForecastSource, Geocoder, HttpTransport, NoDelay, NominatimClient, NwsClient,
    ReqwestTransport, Throttle,
};
pub use session::{Attribution, Interpreter, Session};

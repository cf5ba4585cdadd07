//! Upstream flight-tracking API access.

mod client;
mod probe;

pub use client::{DepartureFetcher, DepartureRequest, FlightRadarClient, Route};
pub use probe::DepartureProbe;

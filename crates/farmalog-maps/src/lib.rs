//! Typed client for the Google Maps web services the planner depends on:
//! place autocomplete, place details and directions.

pub mod client;
pub mod error;
pub mod types;

pub use client::MapsClient;
pub use error::MapsError;
pub use types::{PlaceLocation, RouteLegs};

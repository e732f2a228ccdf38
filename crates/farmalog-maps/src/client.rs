//! HTTP client for the Google Maps web services.
//!
//! Wraps `reqwest` with API key management, status-envelope checking and
//! typed response deserialization. Calls are made once; failures are
//! returned to the caller without retry.

use std::time::Duration;

use farmalog_core::{AppConfig, Coordinate, Suggestion};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::MapsError;
use crate::types::{
    ApiResponse, AutocompleteResponse, DirectionsResponse, PlaceDetailsResponse, PlaceLocation,
    RouteLegs,
};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

const AUTOCOMPLETE: &str = "place/autocomplete/json";
const PLACE_DETAILS: &str = "place/details/json";
const DIRECTIONS: &str = "directions/json";

/// Client for the Maps web services.
///
/// Use [`MapsClient::new`] for production or [`MapsClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct MapsClient {
    client: Client,
    api_key: String,
    base_url: Url,
    country: String,
}

impl std::fmt::Debug for MapsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapsClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .field("country", &self.country)
            .finish_non_exhaustive()
    }
}

impl MapsClient {
    /// Creates a client pointed at the production Maps API.
    ///
    /// # Errors
    ///
    /// Returns [`MapsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, country: &str) -> Result<Self, MapsError> {
        Self::with_base_url(api_key, timeout_secs, country, DEFAULT_BASE_URL)
    }

    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// See [`MapsClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, MapsError> {
        Self::with_base_url(
            &config.google_api_key,
            config.maps_timeout_secs,
            &config.maps_country,
            &config.maps_base_url,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`MapsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MapsError::InvalidBaseUrl`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        country: &str,
        base_url: &str,
    ) -> Result<Self, MapsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("farmalog/0.1 (delivery-planner)")
            .build()?;

        // Endpoint paths are joined relative to the base, so it must end
        // with exactly one slash.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| MapsError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            country: country.to_lowercase(),
        })
    }

    /// Address suggestions for free text, restricted to the configured
    /// country. An empty list when nothing matches.
    ///
    /// # Errors
    ///
    /// - [`MapsError::Api`] if the service returns an error status.
    /// - [`MapsError::Http`] on network failure or non-2xx HTTP status.
    /// - [`MapsError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn autocomplete(&self, input: &str) -> Result<Vec<Suggestion>, MapsError> {
        let components = format!("country:{}", self.country);
        let url = self.build_url(
            AUTOCOMPLETE,
            &[("input", input), ("components", &components)],
        )?;
        let envelope: ApiResponse<AutocompleteResponse> = self.get(AUTOCOMPLETE, url).await?;

        let suggestions: Vec<Suggestion> = envelope
            .data
            .predictions
            .into_iter()
            .map(|p| Suggestion {
                description: p.description,
                place_id: p.place_id,
            })
            .collect();
        tracing::debug!(count = suggestions.len(), "address autocomplete");
        Ok(suggestions)
    }

    /// Position of a place returned by [`MapsClient::autocomplete`].
    /// `None` when the id no longer resolves.
    ///
    /// # Errors
    ///
    /// - [`MapsError::Api`] if the service returns an error status.
    /// - [`MapsError::Http`] on network failure or non-2xx HTTP status.
    /// - [`MapsError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn place_location(&self, place_id: &str) -> Result<Option<PlaceLocation>, MapsError> {
        let url = self.build_url(
            PLACE_DETAILS,
            &[
                ("place_id", place_id),
                ("fields", "geometry/location,formatted_address"),
            ],
        )?;
        let envelope: ApiResponse<PlaceDetailsResponse> = self.get(PLACE_DETAILS, url).await?;

        Ok(envelope.data.result.map(|r| PlaceLocation {
            coordinate: r.geometry.location.into(),
            formatted_address: r.formatted_address,
        }))
    }

    /// Driving route origin → waypoints (in order) → destination. `None` when
    /// the service finds no route.
    ///
    /// # Errors
    ///
    /// - [`MapsError::Api`] if the service returns an error status.
    /// - [`MapsError::Http`] on network failure or non-2xx HTTP status.
    /// - [`MapsError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        waypoints: &[Coordinate],
    ) -> Result<Option<RouteLegs>, MapsError> {
        let origin = origin.to_query();
        let destination = destination.to_query();
        let waypoints = waypoints
            .iter()
            .map(Coordinate::to_query)
            .collect::<Vec<_>>()
            .join("|");

        let mut params = vec![
            ("origin", origin.as_str()),
            ("destination", destination.as_str()),
            ("mode", "driving"),
        ];
        if !waypoints.is_empty() {
            params.push(("waypoints", waypoints.as_str()));
        }

        let url = self.build_url(DIRECTIONS, &params)?;
        let envelope: ApiResponse<DirectionsResponse> = self.get(DIRECTIONS, url).await?;

        let route = envelope.data.routes.into_iter().next().map(RouteLegs::from);
        tracing::debug!(
            found = route.is_some(),
            legs = route.as_ref().map_or(0, |r| r.leg_meters.len()),
            "directions"
        );
        Ok(route)
    }

    /// Builds the endpoint URL with the API key and percent-encoded
    /// parameters.
    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Result<Url, MapsError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| MapsError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// Sends a GET request, asserts a 2xx HTTP status, parses the envelope
    /// and checks its `status`.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
    ) -> Result<ApiResponse<T>, MapsError> {
        // The request URL carries the API key; strip it from transport errors.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let response = response
            .error_for_status()
            .map_err(reqwest::Error::without_url)?;
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| MapsError::Deserialize {
                context: endpoint.to_string(),
                source: e,
            })?;
        Self::check_status(endpoint, &envelope.status, envelope.error_message.as_deref())?;
        Ok(envelope)
    }

    /// `OK` and `ZERO_RESULTS` are successes; anything else is an error.
    fn check_status(
        endpoint: &'static str,
        status: &str,
        message: Option<&str>,
    ) -> Result<(), MapsError> {
        match status {
            "OK" | "ZERO_RESULTS" => Ok(()),
            _ => {
                tracing::warn!(endpoint, status, "Maps API returned an error status");
                Err(MapsError::Api {
                    endpoint,
                    status: status.to_string(),
                    message: message.unwrap_or("no error message").to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> MapsClient {
        MapsClient::with_base_url("test-key", 30, "EC", base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_joins_endpoint_under_base_path() {
        let client = test_client("https://maps.googleapis.com/maps/api");
        let url = client
            .build_url(DIRECTIONS, &[("origin", "1,2")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://maps.googleapis.com/maps/api/directions/json?origin=1%2C2&key=test-key"
        );
    }

    #[test]
    fn build_url_tolerates_trailing_slashes() {
        let client = test_client("http://localhost:9000//");
        let url = client.build_url(AUTOCOMPLETE, &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/place/autocomplete/json?key=test-key"
        );
    }

    #[test]
    fn build_url_encodes_special_characters() {
        let client = test_client("https://maps.googleapis.com/maps/api/");
        let url = client
            .build_url(AUTOCOMPLETE, &[("input", "Av. 10 de Agosto & Colón")])
            .unwrap();
        assert!(
            url.as_str().contains("Av.+10+de+Agosto+%26+Col%C3%B3n"),
            "input should be form-encoded: {url}"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = MapsClient::with_base_url("k", 5, "ec", "not a url").unwrap_err();
        assert!(matches!(err, MapsError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn check_status_accepts_ok_and_zero_results() {
        assert!(MapsClient::check_status(DIRECTIONS, "OK", None).is_ok());
        assert!(MapsClient::check_status(DIRECTIONS, "ZERO_RESULTS", None).is_ok());
    }

    #[test]
    fn check_status_surfaces_message() {
        let err = MapsClient::check_status(
            DIRECTIONS,
            "REQUEST_DENIED",
            Some("The provided API key is invalid."),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("REQUEST_DENIED"), "got {msg}");
        assert!(msg.contains("API key is invalid"), "got {msg}");
    }

    #[test]
    fn debug_output_redacts_key() {
        let client = test_client("https://maps.googleapis.com/maps/api/");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("test-key"));
    }
}

//! Reverse geocoding: turning a clicked point into a country and address.
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{Coords, PinError, Place, Result};

/// Resolves coordinates to a human readable place.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, coords: Coords) -> Result<Place>;
}

/// Runs a lookup, optionally bounded by a timeout.
pub async fn lookup(
    geocoder: &dyn Geocoder,
    coords: Coords,
    timeout: Option<Duration>,
) -> Result<Place> {
    match timeout {
        None => geocoder.reverse_geocode(coords).await,
        Some(limit) => tokio::time::timeout(limit, geocoder.reverse_geocode(coords))
            .await
            .unwrap_or_else(|_| {
                warn!("Lookup for {} timed out after {:?}", coords, limit);
                Err(PinError::GeocodeTimeout {
                    secs: limit.as_secs(),
                })
            }),
    }
}

/// Response body of a Nominatim `/reverse?format=jsonv2` request
#[derive(Debug, Deserialize)]
pub struct NominatimResponse {
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    #[serde(default)]
    country: Option<String>,
}

impl NominatimResponse {
    /// An `error` field wins over anything else in the body.
    pub fn into_place(self) -> Result<Place> {
        if let Some(error) = self.error {
            let message = match &error {
                Value::String(message) => message.clone(),
                Value::Object(fields) => fields
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
                other => other.to_string(),
            };
            return Err(PinError::Geocode { message });
        }

        Ok(Place {
            country: self
                .address
                .and_then(|address| address.country)
                .unwrap_or_default(),
            description: self.display_name.unwrap_or_default(),
        })
    }
}

/// Geocoder backed by an OpenStreetMap Nominatim instance
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Creates a geocoder for `base_url`, e.g. `https://nominatim.openstreetmap.org/reverse`.
    ///
    /// Nominatim's usage policy requires an identifying user agent.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| PinError::ConfigError {
            message: format!("Invalid geocoder URL {}: {}", base_url, e),
        })?;

        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client, base_url })
    }

    fn request_url(&self, coords: Coords) -> Result<Url> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("format", "jsonv2".to_string()),
                ("lat", coords.lat.to_string()),
                ("lon", coords.lng.to_string()),
            ],
        )
        .map_err(|e| PinError::ConfigError {
            message: format!("Invalid geocoder URL {}: {}", self.base_url, e),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, coords: Coords) -> Result<Place> {
        let url = self.request_url(coords)?;
        debug!("Reverse geocoding {} via {}", coords, url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!("Geocoding request failed: {}", e);
            PinError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(status, &body).map_err(|e| {
            warn!("Lookup for {} failed: {}", coords, e);
            e
        })
    }
}

/// Turns a geocoder reply into a place; a non-2xx status or a body that is
/// not a Nominatim response is a [`PinError::Geocode`].
fn parse_response(status: StatusCode, body: &str) -> Result<Place> {
    if !status.is_success() {
        return Err(PinError::Geocode {
            message: format!("service answered {}", status),
        });
    }

    let parsed: NominatimResponse = serde_json::from_str(body).map_err(|e| PinError::Geocode {
        message: format!("malformed response: {}", e),
    })?;

    parsed.into_place()
}

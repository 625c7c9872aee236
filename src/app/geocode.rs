// PropVal - app/geocode.rs
//
// Address geocoding collaborator. The valuation core only ever sees the
// resulting coordinates; "no match" is a normal answer, not an error.

use crate::core::model::GeoPoint;
use crate::util::error::GeocodeError;
use serde::Deserialize;
use std::time::Duration;

/// Resolves a free-text address to coordinates.
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service knows no such address.
    fn resolve(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

/// Client for the Base Adresse Nationale search API (blocking).
#[derive(Debug, Clone)]
pub struct BanGeocoder {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl BanGeocoder {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("propval/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|source| GeocodeError::Network { source })?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

impl Geocoder for BanGeocoder {
    fn resolve(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query), ("limit", "1")])
            .send()
            .map_err(|source| GeocodeError::Network { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|source| GeocodeError::Network { source })?;
        parse_ban_response(&body)
    }
}

/// Geocoder with a preset answer, for callers that already know the
/// coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeocoder {
    answer: Option<GeoPoint>,
}

impl FixedGeocoder {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            answer: Some(point),
        }
    }

    /// A geocoder that never finds anything.
    pub fn not_found() -> Self {
        Self { answer: None }
    }
}

impl Geocoder for FixedGeocoder {
    fn resolve(&self, _query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        Ok(self.answer)
    }
}

#[derive(Debug, Deserialize)]
struct BanResponse {
    #[serde(default)]
    features: Vec<BanFeature>,
}

#[derive(Debug, Deserialize)]
struct BanFeature {
    geometry: BanGeometry,
}

#[derive(Debug, Deserialize)]
struct BanGeometry {
    /// GeoJSON order: longitude first.
    coordinates: Vec<f64>,
}

/// Extract the best match from a BAN GeoJSON answer.
pub fn parse_ban_response(body: &str) -> Result<Option<GeoPoint>, GeocodeError> {
    let response: BanResponse =
        serde_json::from_str(body).map_err(|source| GeocodeError::Parse { source })?;

    let Some(feature) = response.features.into_iter().next() else {
        return Ok(None);
    };
    match feature.geometry.coordinates.as_slice() {
        [longitude, latitude, ..] => Ok(Some(GeoPoint {
            latitude: *latitude,
            longitude: *longitude,
        })),
        _ => {
            tracing::warn!("Geocoder feature without usable coordinates");
            Ok(None)
        }
    }
}

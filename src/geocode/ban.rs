//! Client for the Base Adresse Nationale search API.
//!
//! One GET per lookup, no retry, no caching. The service replies with
//! GeoJSON whose coordinates are longitude-first; ingestion swaps them into
//! latitude-first order so the quirk never leaves this module.

use super::types::{GeocodeError, GeocodeMatch};
use super::Geocoder;
use crate::geo::Coordinate;
use serde::Deserialize;
use std::fmt::Write as _;
use std::time::Duration;

const SEARCH_ENDPOINT: &str = "https://api-adresse.data.gouv.fr/search/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str = "Geogate/0.3 (address-geofence)";

/// Blocking client for the national address index.
pub struct BanGeocoder {
    timeout: Duration,
}

impl BanGeocoder {
    pub fn new() -> Self {
        Self { timeout: DEFAULT_TIMEOUT }
    }

    /// Client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for BanGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for BanGeocoder {
    fn lookup(&self, address: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        let url = format!("{}?q={}", SEARCH_ENDPOINT, urlencode(address));

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .call()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        let body = response
            .into_string()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        parse_search_body(&body)
    }
}

// ─── Response decoding ──────────────────────────────────────────

// The subset of the GeoJSON FeatureCollection actually consumed.
#[derive(Deserialize)]
struct SearchResponse {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: Properties,
}

#[derive(Deserialize)]
struct Geometry {
    /// `[longitude, latitude]` on the wire.
    coordinates: [f64; 2],
}

#[derive(Deserialize)]
struct Properties {
    label: String,
    #[serde(default)]
    score: Option<f64>,
}

fn parse_search_body(body: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    Ok(parsed.features.into_iter().map(ingest_feature).collect())
}

/// Swap the wire's longitude-first pair into a latitude-first Coordinate.
fn ingest_feature(feature: Feature) -> GeocodeMatch {
    let [longitude, latitude] = feature.geometry.coordinates;
    GeocodeMatch {
        label: feature.properties.label,
        coordinate: Coordinate::new(latitude, longitude),
        score: feature.properties.score,
    }
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

/// Percent-encode a query value, byte-wise so multibyte UTF-8 survives.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

//! Core types for the geocoding boundary.

use crate::geo::Coordinate;
use serde::Serialize;
use std::fmt;

/// One ranked match from the address lookup service.
#[derive(Debug, Clone, Serialize)]
pub struct GeocodeMatch {
    /// The service's formatted label (e.g. "8 Boulevard du Port 80000 Amiens").
    /// Not used by the fence decision; kept for diagnostics.
    pub label: String,
    pub coordinate: Coordinate,
    /// Relevance score reported by the service, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Failures while querying the lookup service.
///
/// "No match" is not an error: a well-formed response with zero features
/// yields an empty match list.
#[derive(Debug)]
pub enum GeocodeError {
    /// Transport failure, timeout, or non-success HTTP status.
    Network(String),
    /// The service answered with a body we could not interpret.
    InvalidResponse(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid lookup response: {}", msg),
        }
    }
}

impl std::error::Error for GeocodeError {}

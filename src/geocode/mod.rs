//! Address lookup boundary.
//!
//! The external service is reached through the [`Geocoder`] trait so tests
//! can substitute stubs, and so the service's longitude-first coordinate
//! order stays contained in a single adapter.

pub mod ban;
pub mod types;

pub use ban::BanGeocoder;
pub use types::{GeocodeError, GeocodeMatch};

/// Forward geocoding: free-text address to ranked candidate coordinates.
pub trait Geocoder: Send + Sync {
    /// Look up an address, returning matches in the service's ranking order.
    ///
    /// An empty vector means the service answered and found nothing; errors
    /// are reserved for transport and protocol failures. The address text is
    /// expected to be trimmed and non-empty, and is sent verbatim.
    fn lookup(&self, address: &str) -> Result<Vec<GeocodeMatch>, GeocodeError>;
}

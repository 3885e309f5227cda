//! Geogate validates free-text postal addresses against a geographic fence.
//!
//! An address is resolved to coordinates through the BAN national address
//! index, then accepted or rejected based on its great-circle distance from
//! a configurable reference point. The default fence is 50 km around central
//! Paris.
//!
//! The crate exposes a library API ([`fence::GeofenceValidator`]), a CLI
//! binary, and an HTTP server ([`server`]).

pub mod fence;
pub mod geo;
pub mod geocode;
pub mod server;

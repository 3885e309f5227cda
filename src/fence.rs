//! Geofence validation: resolve an address, measure it against the anchor.
//!
//! The validator is stateless and reentrant. It holds only the immutable
//! reference point and a geocoder handle, so one instance can serve
//! concurrent callers without locks.

use crate::geo::{self, Coordinate};
use crate::geocode::{GeocodeMatch, Geocoder};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default anchor: central Paris.
pub const DEFAULT_ANCHOR: Coordinate = Coordinate::new(48.8566, 2.3522);

/// Default perimeter radius in kilometers.
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// The fixed anchor coordinate and the radius around it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReferencePoint {
    pub anchor: Coordinate,
    pub max_distance_km: f64,
}

impl ReferencePoint {
    pub const fn new(anchor: Coordinate, max_distance_km: f64) -> Self {
        Self { anchor, max_distance_km }
    }
}

impl Default for ReferencePoint {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR, DEFAULT_RADIUS_KM)
    }
}

/// Why an address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// The lookup service answered but found no match.
    AddressNotFound,
    /// The address resolved outside the perimeter.
    OutOfRange,
    /// The lookup service could not be reached or gave an unusable answer.
    LookupFailed,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressNotFound => write!(f, "AddressNotFound"),
            Self::OutOfRange => write!(f, "OutOfRange"),
            Self::LookupFailed => write!(f, "LookupFailed"),
        }
    }
}

/// Result of validating one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Valid,
    Invalid(InvalidReason),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "Valid"),
            Self::Invalid(reason) => write!(f, "Invalid({})", reason),
        }
    }
}

/// Full account of one validation, for callers that render diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    /// Top match from the lookup service, when one existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<GeocodeMatch>,
    /// Distance from the anchor to the match, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// The perimeter the address was measured against.
    pub reference: ReferencePoint,
}

impl ValidationReport {
    fn rejected(reason: InvalidReason, reference: ReferencePoint) -> Self {
        Self {
            outcome: ValidationOutcome::Invalid(reason),
            matched: None,
            distance_km: None,
            reference,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a validation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Validates addresses against a configured perimeter.
pub struct GeofenceValidator {
    reference: ReferencePoint,
    geocoder: Box<dyn Geocoder>,
}

impl GeofenceValidator {
    pub fn new(reference: ReferencePoint, geocoder: Box<dyn Geocoder>) -> Self {
        Self { reference, geocoder }
    }

    pub fn reference(&self) -> ReferencePoint {
        self.reference
    }

    /// Validate one address; the outcome alone.
    ///
    /// The address is expected to be trimmed and non-empty; it goes to the
    /// lookup service verbatim.
    pub fn validate(&self, address: &str) -> ValidationOutcome {
        self.evaluate(address).outcome
    }

    /// Validate one address with full diagnostics.
    ///
    /// Exactly one lookup round trip, no retry. Lookup failures of any kind
    /// collapse to `Invalid(LookupFailed)`; an answered-but-empty lookup is
    /// `Invalid(AddressNotFound)`. Of multiple matches only the first
    /// (highest-ranked) is measured; a distance exactly equal to the radius
    /// is still accepted.
    pub fn evaluate(&self, address: &str) -> ValidationReport {
        let matches = match self.geocoder.lookup(address) {
            Ok(matches) => matches,
            Err(_) => return ValidationReport::rejected(InvalidReason::LookupFailed, self.reference),
        };

        let Some(top) = matches.into_iter().next() else {
            return ValidationReport::rejected(InvalidReason::AddressNotFound, self.reference);
        };

        let distance_km = geo::distance_km(self.reference.anchor, top.coordinate);
        let outcome = if distance_km > self.reference.max_distance_km {
            ValidationOutcome::Invalid(InvalidReason::OutOfRange)
        } else {
            ValidationOutcome::Valid
        };

        ValidationReport {
            outcome,
            matched: Some(top),
            distance_km: Some(distance_km),
            reference: self.reference,
        }
    }

    /// Cancelable variant: once `cancel` trips, no report is delivered.
    ///
    /// The token is checked before dispatching the lookup and again before
    /// returning. The blocking request itself cannot be aborted mid-flight;
    /// the client timeout bounds how long a cancelled call lingers.
    pub fn evaluate_unless_cancelled(
        &self,
        address: &str,
        cancel: &CancelToken,
    ) -> Option<ValidationReport> {
        if cancel.is_cancelled() {
            return None;
        }
        let report = self.evaluate(address);
        if cancel.is_cancelled() {
            return None;
        }
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::GeocodeError;
    use std::sync::atomic::AtomicUsize;

    const VERSAILLES: Coordinate = Coordinate::new(48.8049, 2.1204);
    const LYON: Coordinate = Coordinate::new(45.7640, 4.8357);

    fn m(label: &str, coordinate: Coordinate) -> GeocodeMatch {
        GeocodeMatch { label: label.to_string(), coordinate, score: Some(0.9) }
    }

    struct FixedGeocoder(Vec<GeocodeMatch>);

    impl Geocoder for FixedGeocoder {
        fn lookup(&self, _address: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
            Ok(self.0.clone())
        }
    }

    struct FailingGeocoder;

    impl Geocoder for FailingGeocoder {
        fn lookup(&self, _address: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
            Err(GeocodeError::Network("connection refused".into()))
        }
    }

    struct CountingGeocoder(Arc<AtomicUsize>);

    impl Geocoder for CountingGeocoder {
        fn lookup(&self, _address: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(vec![])
        }
    }

    // Trips its token mid-lookup, then answers successfully.
    struct CancellingGeocoder(CancelToken);

    impl Geocoder for CancellingGeocoder {
        fn lookup(&self, _address: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
            self.0.cancel();
            Ok(vec![m("Versailles", VERSAILLES)])
        }
    }

    fn validator(geocoder: impl Geocoder + 'static) -> GeofenceValidator {
        GeofenceValidator::new(ReferencePoint::default(), Box::new(geocoder))
    }

    #[test]
    fn test_no_matches_is_address_not_found() {
        let v = validator(FixedGeocoder(vec![]));
        for address in ["12 nowhere lane", "xyzzy"] {
            assert_eq!(
                v.validate(address),
                ValidationOutcome::Invalid(InvalidReason::AddressNotFound)
            );
        }
        let report = v.evaluate("12 nowhere lane");
        assert!(report.matched.is_none());
        assert!(report.distance_km.is_none());
    }

    #[test]
    fn test_lookup_error_is_lookup_failed() {
        let v = validator(FailingGeocoder);
        assert_eq!(
            v.validate("8 Boulevard du Port Amiens"),
            ValidationOutcome::Invalid(InvalidReason::LookupFailed)
        );
    }

    #[test]
    fn test_within_radius_is_valid() {
        let v = validator(FixedGeocoder(vec![m("Versailles", VERSAILLES)]));
        let report = v.evaluate("Avenue de Paris Versailles");
        assert_eq!(report.outcome, ValidationOutcome::Valid);
        assert_eq!(report.matched.as_ref().unwrap().label, "Versailles");
        let d = report.distance_km.unwrap();
        assert!((d - 17.9).abs() < 0.2, "got {} km", d);
    }

    #[test]
    fn test_beyond_radius_is_out_of_range() {
        let v = validator(FixedGeocoder(vec![m("Lyon", LYON)]));
        let report = v.evaluate("Place Bellecour Lyon");
        assert_eq!(
            report.outcome,
            ValidationOutcome::Invalid(InvalidReason::OutOfRange)
        );
        let d = report.distance_km.unwrap();
        assert!((d - 392.0).abs() <= 2.0, "got {} km", d);
    }

    #[test]
    fn test_only_first_match_is_measured() {
        let v = validator(FixedGeocoder(vec![m("near", VERSAILLES), m("far", LYON)]));
        let report = v.evaluate("ambiguous query");
        assert_eq!(report.outcome, ValidationOutcome::Valid);
        assert_eq!(report.matched.as_ref().unwrap().label, "near");

        // Same matches, reversed ranking: the far one now decides.
        let v = validator(FixedGeocoder(vec![m("far", LYON), m("near", VERSAILLES)]));
        let report = v.evaluate("ambiguous query");
        assert_eq!(
            report.outcome,
            ValidationOutcome::Invalid(InvalidReason::OutOfRange)
        );
        assert_eq!(report.matched.as_ref().unwrap().label, "far");
    }

    #[test]
    fn test_distance_equal_to_radius_is_valid() {
        let exact = geo::distance_km(DEFAULT_ANCHOR, VERSAILLES);

        let at_limit = GeofenceValidator::new(
            ReferencePoint::new(DEFAULT_ANCHOR, exact),
            Box::new(FixedGeocoder(vec![m("Versailles", VERSAILLES)])),
        );
        assert_eq!(at_limit.validate("x"), ValidationOutcome::Valid);

        let just_under = GeofenceValidator::new(
            ReferencePoint::new(DEFAULT_ANCHOR, exact * 0.999),
            Box::new(FixedGeocoder(vec![m("Versailles", VERSAILLES)])),
        );
        assert_eq!(
            just_under.validate("x"),
            ValidationOutcome::Invalid(InvalidReason::OutOfRange)
        );
    }

    #[test]
    fn test_match_at_anchor_is_zero_distance() {
        let v = validator(FixedGeocoder(vec![m("anchor", DEFAULT_ANCHOR)]));
        let report = v.evaluate("x");
        assert_eq!(report.outcome, ValidationOutcome::Valid);
        assert_eq!(report.distance_km.unwrap(), 0.0);
    }

    #[test]
    fn test_validate_matches_evaluate_outcome() {
        let v = validator(FixedGeocoder(vec![m("Lyon", LYON)]));
        assert_eq!(v.validate("q"), v.evaluate("q").outcome);
    }

    #[test]
    fn test_cancelled_before_dispatch_skips_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let v = validator(CountingGeocoder(calls.clone()));

        let token = CancelToken::new();
        token.cancel();

        assert!(v.evaluate_unless_cancelled("q", &token).is_none());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_cancelled_during_lookup_delivers_nothing() {
        let token = CancelToken::new();
        let v = validator(CancellingGeocoder(token.clone()));
        // The lookup itself succeeded; the report must still be withheld.
        assert!(v.evaluate_unless_cancelled("q", &token).is_none());
    }

    #[test]
    fn test_uncancelled_token_delivers_report() {
        let v = validator(FixedGeocoder(vec![m("Versailles", VERSAILLES)]));
        let token = CancelToken::new();
        let report = v.evaluate_unless_cancelled("q", &token).unwrap();
        assert!(report.outcome.is_valid());
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(ValidationOutcome::Valid.is_valid());
        assert_eq!(ValidationOutcome::Valid.reason(), None);
        let invalid = ValidationOutcome::Invalid(InvalidReason::OutOfRange);
        assert!(!invalid.is_valid());
        assert_eq!(invalid.reason(), Some(InvalidReason::OutOfRange));
        assert_eq!(format!("{}", invalid), "Invalid(OutOfRange)");
    }
}

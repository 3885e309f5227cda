use crate::fence::GeofenceValidator;

/// Shared server state. The validator is stateless, so no lock is needed.
pub struct AppState {
    pub validator: GeofenceValidator,
}

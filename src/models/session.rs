//! Display session identity.

use uuid::Uuid;

/// Generate a unique session id for a connected display.
pub fn generate_session_id() -> String {
    format!("{}.{}", std::process::id(), Uuid::new_v4().as_simple())
}

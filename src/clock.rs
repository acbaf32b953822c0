//! Shared clock handle used by services and adapters.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

/// Reference-counted clock shared between services.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Returns a shared handle to the system clock.
#[must_use]
pub fn system_clock() -> SharedClock {
    Arc::new(DefaultClock)
}

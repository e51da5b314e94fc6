//! Contracts between the acquisition logic and the host platform.
//!
//! The host reports authorization changes and position updates
//! asynchronously. Nothing is delivered until [`LocationHost::run_events`]
//! is driven, and then every queued event is handed to a
//! [`LocationDelegate`] on the calling thread. The waits in
//! [`crate::authorization`] and [`crate::position`] are built on
//! [`poll_until`], which drives the host one quantum at a time.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::model::{AuthorizationState, NetworkIdentity, PositionFix};

/// Receives host notifications. Implementations must tolerate being called
/// while another part of the program is reading their state.
pub trait LocationDelegate {
    fn authorization_changed(&self, state: AuthorizationState);
    fn position_updated(&self, fix: PositionFix);
    fn position_failed(&self, reason: &str);
}

pub trait LocationHost {
    /// Current permission state, read synchronously.
    fn authorization_status(&self) -> AuthorizationState;

    /// Triggers the permission prompt. The outcome arrives later as an
    /// authorization-changed event.
    fn request_authorization(&mut self) -> Result<()>;

    /// Subscribes to position updates.
    fn start_updates(&mut self) -> Result<()>;

    /// Unsubscribes from position updates. Safe to call when not subscribed.
    fn stop_updates(&mut self);

    /// Processes host events for at most `slice`, delivering each one to
    /// `delegate`.
    fn run_events(&mut self, slice: Duration, delegate: &dyn LocationDelegate);
}

pub trait WirelessHost {
    /// The currently associated wireless interface, or `None` when there is none.
    fn active_interface(&self) -> Result<Option<NetworkIdentity>>;
}

/// Drives `host` one `quantum` at a time until `done` holds or `budget` runs
/// out. Returns whether `done` held before the deadline.
pub fn poll_until<H, F>(
    host: &mut H,
    delegate: &dyn LocationDelegate,
    budget: Duration,
    quantum: Duration,
    mut done: F,
) -> bool
where
    H: LocationHost + ?Sized,
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + budget;

    loop {
        if done() {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }

        host.run_events(quantum.min(deadline - now), delegate);
    }
}

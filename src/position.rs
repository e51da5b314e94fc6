//! Waits for a position fix from the host's update stream.

use std::time::Duration;

use crate::delegate::LocationWatch;
use crate::host::{LocationHost, poll_until};
use crate::model::PositionFix;

/// Stops updates when dropped, whichever way the acquisition ends.
struct Subscription<'a, H: LocationHost + ?Sized> {
    host: &'a mut H,
}

impl<H: LocationHost + ?Sized> Drop for Subscription<'_, H> {
    fn drop(&mut self) {
        self.host.stop_updates();
    }
}

/// Subscribes to position updates and waits up to `budget` for a fix.
///
/// Returns the most recent fix delivered by the time the wait ends. A
/// failure notification ends the wait early without retrying. Only call this
/// once authorization is granted.
pub fn acquire_position<H>(
    host: &mut H,
    watch: &LocationWatch,
    budget: Duration,
    quantum: Duration,
) -> Option<PositionFix>
where
    H: LocationHost + ?Sized,
{
    let mut sub = Subscription { host };

    if let Err(e) = sub.host.start_updates() {
        log::debug!("Could not start position updates: {:#}", e);
        return None;
    }

    let finished = poll_until(&mut *sub.host, watch, budget, quantum, || {
        watch.fix_received() || watch.failed()
    });
    if !finished {
        log::debug!("No position fix within {:?}", budget);
    }

    watch.latest_fix()
}

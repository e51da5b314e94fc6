//! Resolves location permission, asking the host when it is undetermined.

use std::time::Duration;

use crate::delegate::LocationWatch;
use crate::host::{LocationHost, poll_until};
use crate::model::AuthorizationState;

/// Outcome of [`resolve_authorization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationOutcome {
    pub state: AuthorizationState,
    pub was_requested: bool,
}

/// Reads the current permission state once, records it in `watch`, and, if
/// it is undetermined, requests it and waits up to `budget` for an answer.
///
/// A timeout is not an error: the last state the host reported is returned.
/// The host's event channel is left open so a following position request
/// can reuse it.
pub fn resolve_authorization<H>(
    host: &mut H,
    watch: &LocationWatch,
    budget: Duration,
    quantum: Duration,
) -> AuthorizationOutcome
where
    H: LocationHost + ?Sized,
{
    let current = host.authorization_status();
    watch.record_authorization(current);
    if !current.is_pending() {
        return AuthorizationOutcome {
            state: current,
            was_requested: false,
        };
    }

    if let Err(e) = host.request_authorization() {
        log::debug!("Authorization request could not be issued: {:#}", e);
        return AuthorizationOutcome {
            state: watch.authorization(),
            was_requested: true,
        };
    }

    let resolved = poll_until(host, watch, budget, quantum, || {
        watch.authorization_resolved()
    });
    if !resolved {
        log::debug!("Authorization not resolved within {:?}", budget);
    }

    AuthorizationOutcome {
        state: watch.authorization(),
        was_requested: true,
    }
}

//! Flags shared between host callbacks and the poll loops.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::host::LocationDelegate;
use crate::model::{AuthorizationState, PositionFix};

/// Records what the host has reported during one acquisition run.
#[derive(Debug)]
pub struct LocationWatch {
    authorization_resolved: AtomicBool,
    authorization: AtomicU8,
    fix_received: AtomicBool,
    failed: AtomicBool,
    latest_fix: Mutex<Option<PositionFix>>,
}

impl LocationWatch {
    pub fn new(initial: AuthorizationState) -> Self {
        LocationWatch {
            authorization_resolved: AtomicBool::new(false),
            authorization: AtomicU8::new(initial.to_u8()),
            fix_received: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            latest_fix: Mutex::new(None),
        }
    }

    /// Records a state read directly from the host. Does not count as an answer.
    pub fn record_authorization(&self, state: AuthorizationState) {
        self.authorization.store(state.to_u8(), Ordering::Release);
    }

    pub fn authorization_resolved(&self) -> bool {
        self.authorization_resolved.load(Ordering::Acquire)
    }

    /// Last state reported by the host, or the initial one.
    pub fn authorization(&self) -> AuthorizationState {
        AuthorizationState::from_u8(self.authorization.load(Ordering::Acquire))
    }

    pub fn fix_received(&self) -> bool {
        self.fix_received.load(Ordering::Acquire)
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// The most recent fix. Earlier fixes are overwritten.
    pub fn latest_fix(&self) -> Option<PositionFix> {
        match self.latest_fix.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl LocationDelegate for LocationWatch {
    fn authorization_changed(&self, state: AuthorizationState) {
        self.authorization.store(state.to_u8(), Ordering::Release);
        // The host may echo NotDetermined before the user answers.
        if !state.is_pending() {
            self.authorization_resolved.store(true, Ordering::Release);
        }
    }

    fn position_updated(&self, fix: PositionFix) {
        match self.latest_fix.lock() {
            Ok(mut guard) => *guard = Some(fix),
            Err(poisoned) => *poisoned.into_inner() = Some(fix),
        }
        self.fix_received.store(true, Ordering::Release);
    }

    fn position_failed(&self, reason: &str) {
        log::debug!("Position update failed: {}", reason);
        self.failed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64) -> PositionFix {
        PositionFix {
            latitude: lat,
            longitude: 0.0,
            altitude: None,
            horizontal_accuracy: 10.0,
            vertical_accuracy: None,
        }
    }

    #[test]
    fn test_pending_echo_does_not_resolve() {
        let watch = LocationWatch::new(AuthorizationState::NotDetermined);
        watch.authorization_changed(AuthorizationState::NotDetermined);
        assert!(!watch.authorization_resolved());

        watch.authorization_changed(AuthorizationState::Denied);
        assert!(watch.authorization_resolved());
        assert_eq!(watch.authorization(), AuthorizationState::Denied);
    }

    #[test]
    fn test_recorded_state_is_not_an_answer() {
        let watch = LocationWatch::new(AuthorizationState::NotDetermined);
        watch.record_authorization(AuthorizationState::Authorized);
        assert_eq!(watch.authorization(), AuthorizationState::Authorized);
        assert!(!watch.authorization_resolved());
    }

    #[test]
    fn test_last_fix_wins() {
        let watch = LocationWatch::new(AuthorizationState::Authorized);
        assert!(watch.latest_fix().is_none());

        watch.position_updated(fix(1.0));
        watch.position_updated(fix(2.0));
        assert!(watch.fix_received());
        assert_eq!(watch.latest_fix().unwrap().latitude, 2.0);
    }

    #[test]
    fn test_flags_visible_across_threads() {
        let watch = std::sync::Arc::new(LocationWatch::new(AuthorizationState::Authorized));
        let remote = watch.clone();
        std::thread::spawn(move || remote.position_failed("no signal"))
            .join()
            .unwrap();
        assert!(watch.failed());
        assert!(!watch.fix_received());
    }
}

//! Sequences one acquisition run: authorization, optional position, network.

use std::time::Duration;

use crate::authorization::resolve_authorization;
use crate::config::TimeoutConfig;
use crate::delegate::LocationWatch;
use crate::host::{LocationHost, WirelessHost};
use crate::interface::read_active_interface;
use crate::model::{AcquisitionResult, AuthorizationState};
use crate::position::acquire_position;

/// Time bounds for the two waits in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    pub authorization: Duration,
    pub position: Duration,
    pub quantum: Duration,
}

impl Default for Budgets {
    fn default() -> Self {
        Budgets::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for Budgets {
    fn from(timeouts: &TimeoutConfig) -> Self {
        Budgets {
            authorization: timeouts.authorization(),
            position: timeouts.position(),
            quantum: timeouts.poll_quantum(),
        }
    }
}

pub struct Orchestrator<'a, L: ?Sized, W: ?Sized> {
    location: &'a mut L,
    wireless: &'a W,
    budgets: Budgets,
}

impl<'a, L, W> Orchestrator<'a, L, W>
where
    L: LocationHost + ?Sized,
    W: WirelessHost + ?Sized,
{
    pub fn new(location: &'a mut L, wireless: &'a W, budgets: Budgets) -> Self {
        Orchestrator {
            location,
            wireless,
            budgets,
        }
    }

    /// Runs the acquisition sequence. Never fails: anything that goes wrong
    /// leaves the corresponding field empty.
    pub fn run(&mut self, request_position: bool) -> AcquisitionResult {
        let watch = LocationWatch::new(AuthorizationState::NotDetermined);

        let auth = resolve_authorization(
            &mut *self.location,
            &watch,
            self.budgets.authorization,
            self.budgets.quantum,
        );
        log::debug!("Authorization status: {}", auth.state);
        log::debug!("Authorization requested: {}", auth.was_requested);

        let position = if request_position && auth.state == AuthorizationState::Authorized {
            let fix = acquire_position(
                &mut *self.location,
                &watch,
                self.budgets.position,
                self.budgets.quantum,
            );
            match &fix {
                Some(f) => log::debug!(
                    "Location: {:.6}, {:.6} (accuracy {:.1}m)",
                    f.latitude,
                    f.longitude,
                    f.horizontal_accuracy
                ),
                None => log::debug!("Location: no fix"),
            }
            fix
        } else {
            None
        };

        let network = read_active_interface(self.wireless);

        AcquisitionResult {
            network,
            position,
            authorization: auth.state,
            authorization_was_requested: auth.was_requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocationDelegate;
    use crate::model::{NetworkIdentity, PositionFix};
    use anyhow::Result;
    use std::cell::Cell;

    struct FixedHost {
        status: AuthorizationState,
        status_reads: Cell<u32>,
        fix: Option<PositionFix>,
        updates_started: bool,
    }

    impl LocationHost for FixedHost {
        fn authorization_status(&self) -> AuthorizationState {
            self.status_reads.set(self.status_reads.get() + 1);
            self.status
        }

        fn request_authorization(&mut self) -> Result<()> {
            Ok(())
        }

        fn start_updates(&mut self) -> Result<()> {
            self.updates_started = true;
            Ok(())
        }

        fn stop_updates(&mut self) {}

        fn run_events(&mut self, slice: Duration, delegate: &dyn LocationDelegate) {
            match self.fix.take() {
                Some(fix) if self.updates_started => delegate.position_updated(fix),
                other => {
                    self.fix = other;
                    std::thread::sleep(slice);
                }
            }
        }
    }

    struct Associated;

    impl WirelessHost for Associated {
        fn active_interface(&self) -> Result<Option<NetworkIdentity>> {
            Ok(Some(NetworkIdentity {
                ssid: Some("MyNet".into()),
                bssid: Some("aa:bb:cc:dd:ee:ff".into()),
                interface_name: Some("wlan0".into()),
                found: true,
            }))
        }
    }

    fn budgets() -> Budgets {
        Budgets {
            authorization: Duration::from_millis(20),
            position: Duration::from_millis(50),
            quantum: Duration::from_millis(1),
        }
    }

    fn host(status: AuthorizationState) -> FixedHost {
        FixedHost {
            status,
            status_reads: Cell::new(0),
            fix: Some(PositionFix {
                latitude: 1.5,
                longitude: 2.5,
                altitude: None,
                horizontal_accuracy: 3.0,
                vertical_accuracy: None,
            }),
            updates_started: false,
        }
    }

    #[test]
    fn test_position_skipped_when_not_requested() {
        let mut location = host(AuthorizationState::Authorized);
        let result = Orchestrator::new(&mut location, &Associated, budgets()).run(false);

        assert!(result.position.is_none());
        assert!(result.network.found);
        assert!(!location.updates_started);
    }

    #[test]
    fn test_position_acquired_when_authorized() {
        let mut location = host(AuthorizationState::Authorized);
        let result = Orchestrator::new(&mut location, &Associated, budgets()).run(true);

        assert_eq!(result.position.map(|p| p.latitude), Some(1.5));
        assert_eq!(result.authorization, AuthorizationState::Authorized);
        assert!(!result.authorization_was_requested);
    }

    #[test]
    fn test_restricted_never_subscribes() {
        let mut location = host(AuthorizationState::Restricted);
        let result = Orchestrator::new(&mut location, &Associated, budgets()).run(true);

        assert!(result.position.is_none());
        assert!(!location.updates_started);
        assert_eq!(result.network.ssid.as_deref(), Some("MyNet"));
    }

    #[test]
    fn test_unanswered_prompt_still_reads_network() {
        let mut location = host(AuthorizationState::NotDetermined);
        let result = Orchestrator::new(&mut location, &Associated, budgets()).run(true);

        assert_eq!(result.authorization, AuthorizationState::NotDetermined);
        assert!(result.authorization_was_requested);
        assert!(result.position.is_none());
        assert!(result.network.found);
    }

    #[test]
    fn test_authorization_status_read_once_per_run() {
        for status in [AuthorizationState::Authorized, AuthorizationState::NotDetermined] {
            let mut location = host(status);
            Orchestrator::new(&mut location, &Associated, budgets()).run(true);
            assert_eq!(location.status_reads.get(), 1);
        }
    }
}

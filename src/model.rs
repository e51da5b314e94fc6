//! Data records produced by a single acquisition run.

use std::fmt;

/// Permission status for location access, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationState {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

impl AuthorizationState {
    /// Compact encoding used by the atomics in [`crate::delegate`].
    pub fn to_u8(self) -> u8 {
        match self {
            AuthorizationState::NotDetermined => 0,
            AuthorizationState::Restricted => 1,
            AuthorizationState::Denied => 2,
            AuthorizationState::Authorized => 3,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AuthorizationState::Restricted,
            2 => AuthorizationState::Denied,
            3 => AuthorizationState::Authorized,
            _ => AuthorizationState::NotDetermined,
        }
    }

    /// Whether the host still has to ask before the state is settled.
    pub fn is_pending(self) -> bool {
        self == AuthorizationState::NotDetermined
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthorizationState::NotDetermined => "NotDetermined",
            AuthorizationState::Restricted => "Restricted",
            AuthorizationState::Denied => "Denied",
            AuthorizationState::Authorized => "Authorized",
        };
        f.write_str(name)
    }
}

/// Identity of the currently associated wireless network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkIdentity {
    /// Network name. May be missing when the host hides it.
    pub ssid: Option<String>,

    /// Hardware address of the access point, lower-case colon notation.
    pub bssid: Option<String>,

    /// OS interface name (e.g. "wlan0").
    pub interface_name: Option<String>,

    /// False when no interface is associated. All string fields are then `None`.
    pub found: bool,
}

impl NetworkIdentity {
    pub fn absent() -> Self {
        Self::default()
    }
}

/// A single resolved position estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,

    /// Metres above sea level. `None` when the provider does not report it.
    pub altitude: Option<f64>,

    /// Radius of uncertainty in metres.
    pub horizontal_accuracy: f64,

    pub vertical_accuracy: Option<f64>,
}

/// Everything one run learned. Built once after all waits complete.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionResult {
    pub network: NetworkIdentity,

    /// Present only when a position was requested, authorization was granted,
    /// and a fix arrived within the time budget.
    pub position: Option<PositionFix>,

    pub authorization: AuthorizationState,
    pub authorization_was_requested: bool,
}

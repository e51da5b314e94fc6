use thiserror::Error;

#[derive(Error, Debug)]
pub enum WifiLocateError {
    #[error("Failed to execute nmcli: {0}")]
    NmcliExecution(String),

    #[error("No controlling terminal available to ask for location permission")]
    NoTerminal,

    #[error("Geolocation request failed: {0}")]
    Geolocate(String),

    #[error("Only {0} access point(s) visible, at least 2 are needed")]
    NotEnoughAccessPoints(usize),

    #[error("Failed to initialize host bindings: {0}")]
    HostInit(String),

    #[error("Failed to store location permission: {0}")]
    Consent(String),
}

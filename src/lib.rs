//! WiFi identity and location probe
//!
//! This library reports the wireless network the host is associated with
//! (SSID, BSSID, interface name) and, when permitted, a position derived
//! from WiFi-based geolocation. A run is single-shot: it resolves location
//! permission, optionally waits for a fix, reads the network, and renders a
//! single pipe-delimited line.
//!
//! # Modules
//!
//! - [`model`] - Records produced by a run
//! - [`host`] - Host platform contracts and the cooperative wait loop
//! - [`delegate`] - Flags set by host callbacks
//! - [`authorization`] - Permission resolution with a bounded wait
//! - [`position`] - Position acquisition with a bounded wait
//! - [`interface`] - Associated network lookup through nmcli
//! - [`orchestrator`] - Sequencing of a full run
//! - [`output`] - Result line rendering and emission
//! - [`system`] - Linux location host (consent file, terminal prompt, geolocation)
//! - [`config`] - Configuration file and environment settings
//! - [`error`] - Custom error types for the library
//!
//! # Example Usage
//!
//! ```no_run
//! use wifi_locate::{Budgets, Config, NmcliWireless, Orchestrator, SystemLocationHost, format_line};
//!
//! let config = Config::default();
//! let mut host = SystemLocationHost::new(&config).expect("No config directory");
//! let result = Orchestrator::new(&mut host, &NmcliWireless, Budgets::default()).run(true);
//! print!("{}", format_line(&result));
//! ```

/// Permission resolution: reads the host state and, if undetermined,
/// prompts and waits a bounded time for an answer.
pub mod authorization;

/// Configuration module for the TOML config file and environment settings.
pub mod config;

/// Stored permission decision and the terminal prompt that records it.
pub mod consent;

/// Shared flags written by host callbacks and read by the wait loops.
pub mod delegate;

/// Error module defining custom error types for the library.
/// Uses `thiserror` for ergonomic error handling.
pub mod error;

/// Client for Ichnaea-compatible geolocation services.
pub mod geolocate;

/// Host contracts (location and wireless) and the polling helper.
pub mod host;

/// Associated WiFi network lookup through NetworkManager's nmcli.
pub mod interface;

/// Data records produced by one acquisition run.
pub mod model;

/// Sequences authorization, position and network lookup into one result.
pub mod orchestrator;

/// Result line formatting and emission to stdout and an optional file.
pub mod output;

/// Position acquisition with guaranteed unsubscription.
pub mod position;

/// Access point scanning used as input for geolocation.
pub mod scan;

/// Linux location host built on the consent store, the prompt and geolocation.
pub mod system;

// Re-export the data records and the main error type for library users
pub use error::WifiLocateError;
pub use model::{AcquisitionResult, AuthorizationState, NetworkIdentity, PositionFix};

// Re-export the host seams and the wait loop so other platforms can plug in
pub use delegate::LocationWatch;
pub use host::{LocationDelegate, LocationHost, WirelessHost, poll_until};

// Re-export the acquisition steps and the orchestrator that sequences them
pub use authorization::{AuthorizationOutcome, resolve_authorization};
pub use orchestrator::{Budgets, Orchestrator};
pub use position::acquire_position;

// Re-export the Linux bindings used by the binary
pub use interface::{NmcliWireless, read_active_interface};
pub use system::SystemLocationHost;

// Re-export configuration and result output
pub use config::{Config, Settings};
pub use output::{emit, format_line};

//! Access point scanning for WiFi-based geolocation.
//!
//! Geolocation services locate a device from the set of access points it can
//! hear. This module collects that set through NetworkManager's `nmcli`.
//!
//! # Scanning Process
//!
//! 1. Optionally triggers a rescan with `nmcli device wifi rescan`
//! 2. Retrieves visible access points with `nmcli device wifi list`
//! 3. Parses BSSID, signal and frequency, dropping rows without a BSSID
//! 4. Deduplicates by BSSID and sorts by signal strength (strongest first)
//!
//! # Example
//!
//! ```no_run
//! use wifi_locate::scan::scan_access_points;
//!
//! let aps = scan_access_points(false).expect("Scan failed");
//! for ap in &aps {
//!     println!("{} {} dBm", ap.bssid, ap.signal_dbm());
//! }
//! ```

use anyhow::Result;
use std::collections::HashSet;

use crate::interface::{nmcli, split_terse};

/// An access point heard during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    /// Hardware address of the access point, lower-case colon notation.
    pub bssid: String,

    /// Signal quality as reported by NetworkManager (0-100).
    pub signal: u8,

    /// Channel frequency in MHz, when nmcli reports one.
    pub frequency: Option<u32>,
}

impl AccessPoint {
    /// Converts the percentage signal quality into an approximate RSSI.
    ///
    /// NetworkManager derives its percentage linearly from dBm over the
    /// range -100..-50, so this is the inverse mapping.
    pub fn signal_dbm(&self) -> i32 {
        i32::from(self.signal.min(100)) / 2 - 100
    }
}

/// Scans for access points visible to any WiFi interface.
///
/// # Arguments
/// * `rescan` - Ask NetworkManager for a fresh scan instead of returning
///   cached results. A fresh scan is slower but reflects the current
///   surroundings.
///
/// # Commands Executed
/// ```bash
/// nmcli -t -f BSSID,SIGNAL,FREQ device wifi list --rescan <yes|no>
/// ```
pub fn scan_access_points(rescan: bool) -> Result<Vec<AccessPoint>> {
    let stdout = nmcli(&[
        "-t",
        "-f",
        "BSSID,SIGNAL,FREQ",
        "device",
        "wifi",
        "list",
        "--rescan",
        if rescan { "yes" } else { "no" },
    ])?;

    Ok(parse_access_points(&stdout))
}

/// Parses terse `BSSID:SIGNAL:FREQ` rows.
///
/// Frequency is printed as e.g. `2437 MHz`; only the number is kept.
pub fn parse_access_points(stdout: &str) -> Vec<AccessPoint> {
    let mut seen = HashSet::new();
    let mut aps = Vec::new();

    for parts in stdout.lines().map(split_terse) {
        if parts.len() < 2 {
            continue;
        }

        let bssid = parts[0].trim().to_lowercase();
        if bssid.is_empty() || bssid == "--" || !seen.insert(bssid.clone()) {
            continue;
        }

        let signal: u8 = parts[1].trim().parse().unwrap_or(0);
        let frequency = parts
            .get(2)
            .and_then(|f| f.split_whitespace().next())
            .and_then(|f| f.parse().ok());

        aps.push(AccessPoint {
            bssid,
            signal,
            frequency,
        });
    }

    aps.sort_by(|a, b| b.signal.cmp(&a.signal));
    aps
}

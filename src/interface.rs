use anyhow::{Context, Result};
use std::process::Command;

use crate::error::WifiLocateError;
use crate::host::WirelessHost;
use crate::model::NetworkIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiInterface {
    pub name: String,
    pub state: String,
}

impl WifiInterface {
    pub fn is_connected(&self) -> bool {
        self.state == "connected"
    }
}

/// Run nmcli and return its stdout
pub(crate) fn nmcli(args: &[&str]) -> Result<String> {
    let output = Command::new("nmcli")
        .args(args)
        .output()
        .context("Failed to execute nmcli")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WifiLocateError::NmcliExecution(stderr.trim().to_string()).into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split one line of `nmcli -t` output, decoding `\:` and `\\` escapes
pub(crate) fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "--" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse `nmcli -t -f DEVICE,TYPE,STATE device`, keeping WiFi devices only
pub fn parse_device_list(stdout: &str) -> Vec<WifiInterface> {
    stdout
        .lines()
        .map(split_terse)
        .filter(|parts| parts.len() >= 3 && parts[1] == "wifi")
        .map(|parts| WifiInterface {
            name: parts[0].clone(),
            state: parts[2].clone(),
        })
        .collect()
}

/// Parse `nmcli -t -f ACTIVE,SSID,BSSID device wifi list` and return the
/// SSID and BSSID of the row marked active
pub fn parse_active_network(stdout: &str) -> Option<(Option<String>, Option<String>)> {
    stdout.lines().map(split_terse).find_map(|parts| {
        if parts.len() >= 3 && parts[0] == "yes" {
            Some((
                non_empty(&parts[1]),
                non_empty(&parts[2]).map(|b| b.to_lowercase()),
            ))
        } else {
            None
        }
    })
}

/// List all WiFi interfaces on the system
pub fn list_wifi_interfaces() -> Result<Vec<WifiInterface>> {
    let stdout = nmcli(&["-t", "-f", "DEVICE,TYPE,STATE", "device"])?;
    Ok(parse_device_list(&stdout))
}

/// Find the first WiFi interface associated with a network
pub fn find_connected_interface() -> Result<Option<WifiInterface>> {
    let interfaces = list_wifi_interfaces()?;
    Ok(interfaces.into_iter().find(WifiInterface::is_connected))
}

/// Reads the associated network through NetworkManager.
#[derive(Debug, Default, Clone, Copy)]
pub struct NmcliWireless;

impl WirelessHost for NmcliWireless {
    fn active_interface(&self) -> Result<Option<NetworkIdentity>> {
        let Some(iface) = find_connected_interface()? else {
            return Ok(None);
        };

        let stdout = nmcli(&[
            "-t",
            "-f",
            "ACTIVE,SSID,BSSID",
            "device",
            "wifi",
            "list",
            "ifname",
            &iface.name,
            "--rescan",
            "no",
        ])?;

        // The interface is known even if the access point row is missing
        let (ssid, bssid) = parse_active_network(&stdout).unwrap_or((None, None));

        Ok(Some(NetworkIdentity {
            ssid,
            bssid,
            interface_name: Some(iface.name),
            found: true,
        }))
    }
}

/// Query the host once. Errors and "not associated" both give an empty identity.
pub fn read_active_interface<W: WirelessHost + ?Sized>(wireless: &W) -> NetworkIdentity {
    match wireless.active_interface() {
        Ok(Some(identity)) => {
            log::debug!("WiFi query success: true");
            identity
        }
        Ok(None) => {
            log::debug!("WiFi query success: false (no associated interface)");
            NetworkIdentity::absent()
        }
        Err(e) => {
            log::debug!("WiFi query success: false ({:#})", e);
            NetworkIdentity::absent()
        }
    }
}

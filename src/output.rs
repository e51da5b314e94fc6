//! Renders the result line and writes it out.
//!
//! The line is `ssid|bssid|interface`, followed by
//! `|latitude|longitude|altitude|horizontal_accuracy` when a fix was acquired.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::model::{AcquisitionResult, PositionFix};

/// Keeps a field from breaking the line shape.
fn field(value: Option<&str>) -> String {
    value
        .unwrap_or_default()
        .chars()
        .map(|c| match c {
            '|' => '_',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Wraps a longitude into [-180, 180].
fn normalize_longitude(lon: f64) -> f64 {
    let lon = finite_or_zero(lon);
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 { 180.0 } else { wrapped }
}

fn position_fields(fix: &PositionFix) -> String {
    let latitude = finite_or_zero(fix.latitude).clamp(-90.0, 90.0);
    let longitude = normalize_longitude(fix.longitude);
    let altitude = fix.altitude.map(finite_or_zero).unwrap_or(0.0);
    let accuracy = finite_or_zero(fix.horizontal_accuracy).max(0.0);

    format!("|{:.6}|{:.6}|{:.1}|{:.1}", latitude, longitude, altitude, accuracy)
}

pub fn format_line(result: &AcquisitionResult) -> String {
    let net = &result.network;
    let mut line = format!(
        "{}|{}|{}",
        field(net.ssid.as_deref()),
        field(net.bssid.as_deref()),
        field(net.interface_name.as_deref()),
    );

    if let Some(fix) = &result.position {
        line.push_str(&position_fields(fix));
    }

    line.push('\n');
    line
}

/// Writes `line` to `out`, then to `destination` if given. A failed file
/// write is logged and otherwise ignored.
pub fn emit_to(out: &mut impl Write, line: &str, destination: Option<&Path>) -> Result<()> {
    out.write_all(line.as_bytes())
        .and_then(|_| out.flush())
        .context("Failed to write result to stdout")?;

    if let Some(path) = destination {
        if let Err(e) = fs::write(path, line) {
            log::debug!("Failed to write output file {}: {}", path.display(), e);
        }
    }

    Ok(())
}

pub fn emit(line: &str, destination: Option<&Path>) -> Result<()> {
    emit_to(&mut std::io::stdout().lock(), line, destination)
}

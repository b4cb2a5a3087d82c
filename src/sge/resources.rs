//! Normalization of raw queue resource values.
//!
//! `qstat -F` reports per-host resources as free-form strings: memory
//! quantities carry an optional binary unit suffix ("512M", "1.5G"), load
//! averages and CPU utilization are plain decimals. This module resolves a
//! canonical quantity against a queue's raw resource map and returns a
//! numeric value, or a typed lookup failure the caller can degrade on.

use std::collections::HashMap;

use thiserror::Error;

/// A canonical resource quantity, each backed by exactly one raw `qstat`
/// resource key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    MemFree,
    MemUsed,
    MemTotal,
    VirtualFree,
    VirtualUsed,
    VirtualTotal,
    SwapFree,
    SwapUsed,
    SwapTotal,
    LoadAverage,
    NpLoadAverage,
    CpuUtilization,
}

/// How a resource value is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// Decimal number with an optional K/M/G/T suffix, base 1024, bytes.
    Memory,
    /// Plain decimal number (load averages, percentages).
    Decimal,
}

impl ResourceKind {
    /// The raw resource key this quantity is reported under.
    pub fn key(self) -> &'static str {
        match self {
            ResourceKind::MemFree => "mem_free",
            ResourceKind::MemUsed => "mem_used",
            ResourceKind::MemTotal => "mem_total",
            ResourceKind::VirtualFree => "virtual_free",
            ResourceKind::VirtualUsed => "virtual_used",
            ResourceKind::VirtualTotal => "mem_total_virtual",
            ResourceKind::SwapFree => "swap_free",
            ResourceKind::SwapUsed => "swap_used",
            ResourceKind::SwapTotal => "swap_total",
            ResourceKind::LoadAverage => "load_average",
            ResourceKind::NpLoadAverage => "np_load_avg",
            ResourceKind::CpuUtilization => "cpu",
        }
    }

    fn encoding(self) -> Encoding {
        match self {
            ResourceKind::MemFree
            | ResourceKind::MemUsed
            | ResourceKind::MemTotal
            | ResourceKind::VirtualFree
            | ResourceKind::VirtualUsed
            | ResourceKind::VirtualTotal
            | ResourceKind::SwapFree
            | ResourceKind::SwapUsed
            | ResourceKind::SwapTotal => Encoding::Memory,
            ResourceKind::LoadAverage
            | ResourceKind::NpLoadAverage
            | ResourceKind::CpuUtilization => Encoding::Decimal,
        }
    }
}

/// Why a resource could not be resolved. Never fatal to a scrape; the
/// collector substitutes a zero and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("resource `{0}` is not reported by this queue")]
    Missing(&'static str),
    #[error("resource `{key}` has unparseable value `{value}`")]
    Unparseable { key: &'static str, value: String },
}

/// Resolves `kind` against a queue's raw resource map.
///
/// Memory-like quantities come back in bytes; load averages and CPU
/// utilization pass through unchanged.
pub fn resolve(
    resources: &HashMap<String, String>,
    kind: ResourceKind,
) -> Result<f64, ResourceError> {
    let key = kind.key();
    let raw = resources
        .get(key)
        .ok_or(ResourceError::Missing(key))?
        .trim();

    let parsed = match kind.encoding() {
        Encoding::Memory => parse_memory(raw),
        Encoding::Decimal => raw.parse::<f64>().ok(),
    };

    parsed.ok_or_else(|| ResourceError::Unparseable {
        key,
        value: raw.to_string(),
    })
}

/// Parses a memory quantity into bytes.
///
/// The format is a decimal number immediately followed by an optional unit
/// suffix in {K, M, G, T}, case-insensitive, base 1024. No suffix means the
/// value is already in bytes.
pub fn parse_memory(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (number, scale) = match raw.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let power = match c.to_ascii_uppercase() {
                'K' => 1,
                'M' => 2,
                'G' => 3,
                'T' => 4,
                _ => return None,
            };
            (&raw[..raw.len() - 1], 1024f64.powi(power))
        }
        _ => (raw, 1.0),
    };

    // f64::from_str only ever accepts `.` as the decimal point, which keeps
    // parsing locale-independent.
    let value: f64 = number.parse().ok()?;
    Some(value * scale)
}

use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to seconds multiplier (order matters: "ms" before "m" and "s")
const UNITS: &[(&str, f64)] = &[
    ("ms", 0.001),
    ("s", 1.0),
    ("m", 60.0),
    ("h", 3_600.0),
    ("d", 86_400.0),
];

/// Parse duration strings like "30s", "1.5h", "500ms", "7d"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.parse()?;
            return match Duration::try_from_secs_f64(val * multiplier) {
                Ok(d) => Ok(d),
                Err(_) => bail!("Duration out of range: {}", s),
            };
        }
    }

    bail!("Unknown duration format: {}", s)
}

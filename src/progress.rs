//! Generation progress reporting.
//!
//! Reports what `depot generate` is doing: which table is being parsed and
//! how many factions have been assembled. Progress goes to **stderr** so
//! stdout stays parseable for scripts.

use std::io::Write;

use anyhow::{bail, Result};

/// A single progress event for generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateProgressEvent {
    /// Table `n` of `total` parsed.
    Loading { table: String, n: u64, total: u64 },
    /// Faction `n` of `total` assembled.
    Building { faction: String, n: u64, total: u64 },
}

/// Reports generation progress. Implementations write to stderr.
pub trait GenerateProgressReporter: Send + Sync {
    fn report(&self, event: GenerateProgressEvent);
}

/// `generate  loading  datasheets  3 / 18 tables`
pub struct StderrProgress;

impl GenerateProgressReporter for StderrProgress {
    fn report(&self, event: GenerateProgressEvent) {
        let line = match &event {
            GenerateProgressEvent::Loading { table, n, total } => format!(
                "generate  loading  {}  {} / {} tables\n",
                table,
                format_number(*n),
                format_number(*total)
            ),
            GenerateProgressEvent::Building { faction, n, total } => format!(
                "generate  building  {}  {} / {} factions\n",
                faction,
                format_number(*n),
                format_number(*total)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// One JSON object per line on stderr.
pub struct JsonProgress;

impl GenerateProgressReporter for JsonProgress {
    fn report(&self, event: GenerateProgressEvent) {
        let obj = match &event {
            GenerateProgressEvent::Loading { table, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "loading",
                "table": table,
                "n": n,
                "total": total
            }),
            GenerateProgressEvent::Building { faction, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "building",
                "faction": faction,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

pub struct NoProgress;

impl GenerateProgressReporter for NoProgress {
    fn report(&self, _event: GenerateProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse the `--progress` flag value.
    pub fn from_flag(value: &str) -> Result<Self> {
        match value {
            "auto" => Ok(Self::default_for_tty()),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            "off" => Ok(ProgressMode::Off),
            other => bail!(
                "Unknown progress mode: '{}'. Must be auto, human, json, or off.",
                other
            ),
        }
    }

    pub fn reporter(&self) -> Box<dyn GenerateProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn progress_flag_values() {
        assert_eq!(ProgressMode::from_flag("json").unwrap(), ProgressMode::Json);
        assert_eq!(ProgressMode::from_flag("off").unwrap(), ProgressMode::Off);
        assert_eq!(
            ProgressMode::from_flag("human").unwrap(),
            ProgressMode::Human
        );
        assert!(ProgressMode::from_flag("loud").is_err());
    }
}

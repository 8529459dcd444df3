use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Threshold preset used as the base configuration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Preset {
    #[default]
    Default,
    Strict,
    Lenient,
}

/// Screen attention monitor: replays a landmark stream through the tracker
#[derive(Parser, Debug)]
#[command(name = "attention-monitor", version, about, long_about = None)]
pub struct Args {
    /// Configuration file path (TOML, JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Landmark stream as JSON lines (reads stdin when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Threshold preset
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    pub preset: Preset,

    /// Alert threshold in seconds (overrides config)
    #[arg(long)]
    pub alert_threshold: Option<f64>,

    /// Only print snapshots for frames where something changed
    #[arg(long)]
    pub events_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "attention-monitor",
            "--input",
            "frames.jsonl",
            "--preset",
            "strict",
            "--alert-threshold",
            "3.5",
            "--events-only",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("frames.jsonl")));
        assert_eq!(args.preset, Preset::Strict);
        assert_eq!(args.alert_threshold, Some(3.5));
        assert!(args.events_only);
        assert!(!args.verbose);
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["attention-monitor"]).unwrap();
        assert_eq!(args.preset, Preset::Default);
        assert!(args.config.is_none());
        assert!(args.input.is_none());
    }
}

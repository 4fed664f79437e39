//! Command-line options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sequencer_alignment::AlignmentConfig;
use sequencer_framework::SequencerConfig;
use sequencer_random::config::DEFAULT_SEED;

/// Run the demo pipeline on the event sequencer.
#[derive(Debug, Parser)]
#[command(name = "sequencer", about = "Deterministic parallel event processing demo")]
pub struct Args {
    /// Number of events to process
    #[arg(short = 'n', long)]
    pub events: Option<u64>,

    /// Number of leading events to skip
    #[arg(long)]
    pub skip: Option<u64>,

    /// Worker threads; zero or negative picks the hardware parallelism
    #[arg(short = 'j', long, allow_negative_numbers = true)]
    pub jobs: Option<i32>,

    /// Global random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Log level: 0 trace, 1 debug, 2 info, 3 warn, 4 error, 5 error only
    #[arg(short = 'l', long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub loglevel: u8,

    /// JSON file with sequencer settings; command-line values win
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Events per alignment interval of validity
    #[arg(long, default_value_t = 100)]
    pub align_iovsize: u64,

    /// Events between alignment cache flushes
    #[arg(long, default_value_t = 200)]
    pub align_flushsize: u64,

    /// Seed of the misalignment streams
    #[arg(long, default_value_t = sequencer_alignment::config::DEFAULT_ALIGNMENT_SEED)]
    pub align_seed: u64,

    /// Keep the first alignment interval at nominal placement
    #[arg(long)]
    pub align_firstnominal: bool,

    /// Per-event magnetic field scalor
    #[arg(long)]
    pub bf_scalor: Option<f64>,

    /// Per-event geometry rotation in radians
    #[arg(long)]
    pub rotation_step: Option<f64>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Sequencer settings: the config file, if any, overridden by flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn sequencer_config(&self) -> Result<SequencerConfig> {
        let mut config = match &self.config {
            Some(path) => SequencerConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SequencerConfig::default(),
        };
        if let Some(events) = self.events {
            config = config.with_events(events);
        }
        if let Some(skip) = self.skip {
            config = config.with_skip(skip);
        }
        if let Some(jobs) = self.jobs {
            config = config.with_workers(jobs);
        }
        Ok(config)
    }

    /// Alignment decorator settings.
    #[must_use]
    pub fn alignment_config(&self) -> AlignmentConfig {
        AlignmentConfig {
            first_iov_nominal: self.align_firstnominal,
            ..AlignmentConfig::default()
                .with_iov_size(self.align_iovsize)
                .with_flush_size(self.align_flushsize)
                .with_seed(self.align_seed)
        }
    }

    /// Default tracing directive for the chosen log level.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        match self.loglevel {
            0 => "trace",
            1 => "debug",
            2 => "info",
            3 => "warn",
            _ => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sequencer"]).unwrap();
        assert_eq!(args.seed, DEFAULT_SEED);
        assert_eq!(args.log_directive(), "info");
        let config = args.sequencer_config().unwrap();
        assert_eq!(config, SequencerConfig::default());
        assert_eq!(args.alignment_config(), AlignmentConfig::default());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "sequencer",
            "-n",
            "50",
            "--skip",
            "5",
            "-j",
            "-1",
            "-l",
            "1",
            "--align-iovsize",
            "10",
            "--align-firstnominal",
        ])
        .unwrap();
        let config = args.sequencer_config().unwrap();
        assert_eq!(config.events, Some(50));
        assert_eq!(config.skip, 5);
        assert_eq!(config.workers, -1);
        assert_eq!(args.log_directive(), "debug");
        let alignment = args.alignment_config();
        assert_eq!(alignment.iov_size, 10);
        assert!(alignment.first_iov_nominal);
    }

    #[test]
    fn test_loglevel_out_of_range() {
        assert!(Args::try_parse_from(["sequencer", "-l", "6"]).is_err());
    }
}

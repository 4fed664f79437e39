//! # sequencer
//!
//! Runs a demo pipeline on the event sequencer:
//!
//! 1. `AlignmentDecorator` (plus optional rotation and field scaling)
//!    decorates each event.
//! 2. `ParticleGun` writes `"particles"`.
//! 3. `HitSmearing` turns them into `"hits"` on the aligned detector.
//! 4. `SummaryWriter` collects a per-event digest and writes it at the end.
//!
//! The exit status is 0 when every event completed, 1 otherwise.

mod cli;
mod generator;
mod smearing;
mod summary;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sequencer_alignment::{
    AlignmentDecorator, FieldScaleDecorator, RotationDecorator, barrel_layout,
};
use sequencer_framework::{Pipeline, RandomNumbers, RandomNumbersConfig, Sequencer, WriterT};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Args;
use generator::{ParticleGun, ParticleGunConfig};
use smearing::{HitSmearing, HitSmearingConfig};
use summary::SummaryWriter;

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialise structured logging; RUST_LOG overrides --loglevel.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_directive())),
        )
        .init();

    let config = args.sequencer_config()?;
    let pipeline = build_pipeline(&args)?;
    info!(?config, "sequencer starting");

    let mut sequencer = Sequencer::configure(config, pipeline).context("configuring sequencer")?;
    let report = sequencer.run().context("running sequencer")?;

    for failure in &report.failures {
        error!("{failure}");
    }
    info!(
        run_id = %report.run_id,
        status = ?report.status,
        processed = report.processed_events,
        total = report.total_events,
        "sequencer finished"
    );

    Ok(if report.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Assemble the demo pipeline from the command line.
fn build_pipeline(args: &Args) -> Result<Pipeline> {
    let elements = barrel_layout(4, 16, 30.0, 40.0);
    let random = Arc::new(RandomNumbers::new(RandomNumbersConfig::with_seed(args.seed)));

    let alignment = AlignmentDecorator::new(args.alignment_config(), elements.clone())
        .context("alignment decorator")?;
    let mut pipeline = Pipeline::new()
        .add_service(random.clone())
        .add_decorator(Arc::new(alignment));

    if let Some(step) = args.rotation_step {
        let rotation = RotationDecorator::new(step, &elements).context("rotation decorator")?;
        pipeline = pipeline.add_decorator(Arc::new(rotation));
    }
    if let Some(scalor) = args.bf_scalor {
        let field = FieldScaleDecorator::new(scalor).context("field scale decorator")?;
        pipeline = pipeline.add_decorator(Arc::new(field));
    }

    let gun = ParticleGun::new(ParticleGunConfig::default(), random.clone());
    let smearing = HitSmearing::new(HitSmearingConfig::default(), random);
    let summary = WriterT::new("hits", SummaryWriter::new(args.output.clone()))?;

    Ok(pipeline
        .add_reader(Arc::new(gun))
        .append_algorithm(Arc::new(smearing))
        .add_writer(Arc::new(summary)))
}

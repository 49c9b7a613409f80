use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use red_aqm::scenario::{self, Scenario};
use tracing::level_filters::LevelFilter;

/// Run a RED queue disc through a scripted arrival pattern and print its statistics.
#[derive(Parser, Debug)]
#[command(name = "red-sim", version)]
struct Args {
    /// Scenario file (TOML). Defaults apply to everything it leaves out.
    #[arg(value_name = "PATH", env = "RED_SCENARIO")]
    scenario: Option<PathBuf>,

    /// Override the seed of the random stream.
    #[arg(long)]
    seed: Option<u32>,

    /// Override the run (substream) number.
    #[arg(long, env = "RED_RUN")]
    run: Option<u64>,

    /// Bind the queue disc to this explicit stream index.
    #[arg(long)]
    stream: Option<u64>,

    /// Override the number of arrivals.
    #[arg(long, short = 'n')]
    packets: Option<u64>,

    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<LevelFilter>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    red_aqm::config::set_logger(args.log_level);

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => Scenario::default(),
    };
    if let Some(seed) = args.seed {
        scenario.rng.seed = seed;
    }
    if let Some(run) = args.run {
        scenario.rng.run = run;
    }
    if args.stream.is_some() {
        scenario.rng.stream = args.stream;
    }
    if let Some(packets) = args.packets {
        scenario.traffic.packets = packets;
    }

    let report = scenario::run(&scenario).context("running scenario")?;
    println!("{report}");
    Ok(())
}

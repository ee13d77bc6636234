//! Train a GAN or WGAN on a 2D toy distribution and write the diagnostic
//! snapshots to JSON.
//!
//! Usage:
//!   gan2d --preset wgan-line --iters 2000 --out wgan_line.json
//!   gan2d --config run.json --log-file train.log
use anyhow::{bail, Context, Result};
use clap::Parser;
use gan2d::{Preset, Recorder, TrainingConfig, TrainingSession};
use log::{info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

const LOG_PATTERN: &str = "{d(%H:%M:%S)} {l} - {m}\n";

#[derive(Parser)]
#[command(name = "gan2d")]
#[command(about = "Train small adversarial networks on 2D distributions")]
struct Args {
    /// Named configuration (gan-gaussian-2d, gan-line, gan-horizontal-line, wgan-gaussian, wgan-line, wgan-curve)
    #[arg(short, long, conflicts_with = "config")]
    preset: Option<Preset>,

    /// JSON run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of outer iterations
    #[arg(short, long)]
    iters: Option<usize>,

    /// Override the random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where to write the diagnostic snapshots
    #[arg(short, long, default_value = "diagnostics.json")]
    out: PathBuf,

    /// Also write log lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let mut config = Config::builder().appender(Appender::builder().build("stdout", Box::new(stdout)));
    let mut root = Root::builder().appender("stdout");
    if let Some(path) = log_file {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        config = config.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }
    let config = config.build(root.build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn resolve_config(args: &Args) -> Result<TrainingConfig> {
    let mut config = match (&args.preset, &args.config) {
        (Some(preset), _) => preset.config(),
        (None, Some(path)) => TrainingConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, None) => bail!("one of --preset or --config is required"),
    };
    if let Some(iters) = args.iters {
        config.num_iters = iters;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;
    if args.dump_config {
        println!("{}", config.to_json_pretty());
        return Ok(());
    }
    init_logging(args.log_level, args.log_file.as_deref())?;

    info!(
        "{} objective, {} iterations, {} critic steps, batch {}, lr {:e}, seed {}",
        config.objective,
        config.num_iters,
        config.critic_steps,
        config.batch_size,
        config.learning_rate,
        config.seed
    );
    let mut recorder = Recorder::new(config.summary.clone());
    let mut session = TrainingSession::new(config)?;
    let result = session.run(&mut recorder);

    // keep whatever was captured before a failure
    recorder
        .log()
        .write_json(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    let summary = result?;
    info!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

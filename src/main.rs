use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vsearch_core::{ResultRecord, TrialPhase, TrialSpec};
use vsearch_experiment::export::{self, DEFAULT_FILE_NAME};
use vsearch_experiment::{
    ConditionGenerator, ExperimentConfig, Presenter, Session, SessionEvent, summarize,
};
use vsearch_timing::{HighPrecisionTimer, ManualClock, Timer};

mod participant;
mod presenter;

use participant::{ParticipantArgs, SimulatedParticipant};
use presenter::LogPresenter;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Parser, Debug)]
#[command(author, version, about = "Visual search trial engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON experiment configuration; built-in defaults when omitted
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    #[arg(global = true, short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a full session against a simulated participant
    Run(RunArgs),
    /// Print the generated main trial sequence as CSV
    Plan(PlanArgs),
    /// Validate the configuration and report its capacity
    Check,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, default_value = DEFAULT_FILE_NAME)]
    output: PathBuf,

    /// Also write the records as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Use the wall clock instead of a virtual one
    #[arg(long, default_value_t = false)]
    realtime: bool,

    #[command(flatten)]
    participant: ParticipantArgs,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct PlanRow {
    phase: TrialPhase,
    index: Option<u32>,
    block: Option<u32>,
    set_size: u32,
    duration_ms: u64,
    target_present: bool,
}

impl From<&TrialSpec> for PlanRow {
    fn from(spec: &TrialSpec) -> Self {
        Self {
            phase: spec.phase,
            index: spec.index,
            block: spec.block,
            set_size: spec.set_size,
            duration_ms: spec.duration_ms,
            target_present: spec.target_present,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ExperimentConfig::default(),
    };

    match cli.command {
        Commands::Run(args) => run(config, args),
        Commands::Plan(args) => plan(config, args),
        Commands::Check => check(&config),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn run(config: ExperimentConfig, args: RunArgs) -> Result<()> {
    let seed = args.seed.or(config.seed);
    let rng = seeded_rng(seed);
    let participant_rng = seeded_rng(seed.map(|s| s.wrapping_add(1)));
    let participant =
        SimulatedParticipant::new(args.participant.clone(), config.keys.clone(), participant_rng);

    let records = if args.realtime {
        let session = Session::new(config, HighPrecisionTimer::new(), rng)?;
        drive(session, participant)
    } else {
        let session = Session::new(config, ManualClock::new(), rng)?;
        drive(session, participant)
    };

    report(&records);

    if !export::save_csv(&records, &args.output)? {
        warn!("no main-phase records, nothing saved");
    }
    if let Some(path) = &args.json {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        export::write_json(&records, file)?;
        info!(path = %path.display(), "json written");
    }
    Ok(())
}

fn drive<T>(mut session: Session<T, StdRng>, mut participant: SimulatedParticipant) -> Vec<ResultRecord>
where
    T: Timer<Timestamp = u64>,
{
    let mut presenter = LogPresenter::default();
    let mut events = session.start();
    loop {
        let now = session.timer().now();
        for event in events.drain(..) {
            match event {
                SessionEvent::Show(screen) => {
                    presenter.present(&screen);
                    participant.observe(&screen, now);
                }
                SessionEvent::Finished => {
                    info!(screens = presenter.shown, "session complete");
                    return session.into_results();
                }
                _ => {}
            }
        }
        if let Some(key) = participant.poll(now) {
            events = session.handle_key(&key);
            continue;
        }
        events = session.update();
        if events.is_empty() {
            session.timer().sleep(POLL_INTERVAL);
        }
    }
}

fn report(records: &[ResultRecord]) {
    let summary = summarize(records);
    info!(
        trials = summary.overall.trials,
        accuracy = summary.overall.accuracy(),
        response_rate = summary.response_rate(),
        min_rt_ms = ?summary.min_rt_ms,
        max_rt_ms = ?summary.max_rt_ms,
        "summary"
    );
    for ((set_size, duration, present), cell) in &summary.cells {
        info!(
            set_size,
            duration,
            present,
            trials = cell.trials,
            accuracy = cell.accuracy(),
            mean_rt_ms = ?cell.mean_correct_rt_ms().map(|rt| rt.round()),
            "cell"
        );
    }
}

fn plan(config: ExperimentConfig, args: PlanArgs) -> Result<()> {
    config.validate()?;
    let mut rng = seeded_rng(args.seed.or(config.seed));
    let generator = ConditionGenerator::from_config(&config);
    // practice is drawn first so a seeded plan matches a seeded run
    generator.generate_phase(&config, TrialPhase::Practice, &mut rng)?;
    let main = generator.generate_phase(&config, TrialPhase::Main, &mut rng)?;

    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    for spec in &main {
        writer.serialize(PlanRow::from(spec))?;
    }
    writer.flush()?;
    Ok(())
}

fn check(config: &ExperimentConfig) -> Result<()> {
    config.validate()?;
    println!("configuration ok");
    println!(
        "  placement:      {} (capacity {}, largest set {})",
        config.display.placement.name(),
        config.placement_capacity(),
        config.max_set_size()
    );
    println!(
        "  practice:       {} trials",
        config.trial_count(TrialPhase::Practice)
    );
    println!(
        "  main:           {} trials in {} blocks of {}",
        config.trial_count(TrialPhase::Main),
        config.block_count(),
        config.block_size
    );
    Ok(())
}

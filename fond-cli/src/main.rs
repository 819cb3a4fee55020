mod opt;
mod output;
mod planner_config;
mod report;

use std::io::Read;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fond_search::weak_planner::GreedyWeakPlanner;
use fond_search::PlanOutcome;
use structopt::StructOpt;

use opt::{Opt, OutputFormat};

/// Exit code reported when the driver proves the policy strong cyclic (spec.md §6 "a dedicated
/// code for strong cyclic solution found").
const EXIT_STRONG_CYCLIC: u8 = 0;
/// Exit code for a best-effort (non strong-cyclic) policy.
const EXIT_NOT_STRONG_CYCLIC: u8 = 1;
/// Exit code for a malformed task or unrecognised option (spec.md §6, §7 "input error").
const EXIT_INPUT_ERROR: u8 = 2;
/// Exit code for a time-exhausted run with no strong-cyclic policy recovered.
const EXIT_TIME_EXHAUSTED: u8 = 3;

fn main() -> ExitCode {
    // Terminate the process if a thread panics, same as the teacher's binaries.
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));

    let opt = Opt::from_args();

    let subscriber = tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::Uptime::from(Instant::now()))
        .with_thread_ids(true)
        .with_max_level(opt.log_level)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install global tracing subscriber");
    }

    match run(&opt) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_INPUT_ERROR)
        }
    }
}

fn run(opt: &Opt) -> Result<u8> {
    let input_text = read_input(opt)?;
    let task = fond_sas::parse_task(&input_text).context("failed to parse task")?;
    tracing::info!(
        variables = task.num_vars(),
        operators = task.num_operators(),
        nondet_actions = task.num_nondet_actions(),
        "loaded task"
    );

    std::fs::create_dir_all(&opt.output_dir).context("failed to create output directory")?;

    let config = planner_config::build_config(opt);
    let weak_planner = GreedyWeakPlanner::new(&task).with_heuristic_config(config.heuristic);
    let planner = fond_search::PrpPlanner::new(&task, weak_planner, config);

    let time_budget = opt.time_limit.map(Duration::from_secs);
    let start = Instant::now();
    let result = planner.run(time_budget);
    let elapsed = start.elapsed();

    if opt.snapshots {
        output::write_snapshot(&task, &result.psgraph, &opt.output_dir, result.stats.rounds)?;
    }

    match opt.output_format {
        OutputFormat::List => output::write_list(&task, &result.psgraph, &result.fsaps, &opt.output_dir)?,
        OutputFormat::MatchTree => output::write_match_tree(&task, &result.psgraph, &result.fsaps, &opt.output_dir)?,
        OutputFormat::Controller => output::write_controller(&task, &result.psgraph, &opt.output_dir)?,
    }

    report::print_summary(&result.outcome, &result.psgraph, &result.fsaps, &result.deadends, &result.stats, elapsed);

    Ok(match result.outcome {
        PlanOutcome::StrongCyclic => EXIT_STRONG_CYCLIC,
        PlanOutcome::NotStrongCyclic => EXIT_NOT_STRONG_CYCLIC,
        PlanOutcome::TimeExhausted => EXIT_TIME_EXHAUSTED,
    })
}

fn read_input(opt: &Opt) -> Result<String> {
    match &opt.input {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read task file {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read task from stdin")?;
            Ok(buf)
        }
    }
}

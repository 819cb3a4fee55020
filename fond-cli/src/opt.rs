use std::path::PathBuf;
use std::str::FromStr;

use fond_search::config::NodePreference;
use structopt::StructOpt;

use env_param::EnvParam;

/// Tunable knobs exposed as both CLI flags and `env_param` overrides (SPEC_FULL.md §9.3):
/// useful in benchmarking scripts where re-invoking the binary with new flags is inconvenient.
static FOND_FSAP_PENALTY: EnvParam<u32> = EnvParam::new("FOND_FSAP_PENALTY", "0");
static FOND_EPOCH_MAX: EnvParam<u32> = EnvParam::new("FOND_EPOCH_MAX", "1");

/// Output format selected by `--output-format` (spec.md §6 "Outputs (selected by option)").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    List,
    MatchTree,
    Controller,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Ok(OutputFormat::List),
            "match-tree" | "match_tree" | "matchtree" => Ok(OutputFormat::MatchTree),
            "controller" => Ok(OutputFormat::Controller),
            other => Err(format!("unknown output format {other:?} (expected one of: list, match-tree, controller)")),
        }
    }
}

/// A FOND strong-cyclic policy planner: reads a finite-domain non-deterministic planning task
/// and synthesises a policy guaranteed (or, best-effort, likely) to reach the goal regardless of
/// how non-determinism resolves.
#[derive(Debug, StructOpt)]
#[structopt(name = "fond-plan", rename_all = "kebab-case")]
pub struct Opt {
    /// Path to the task file. If absent, the task is read from stdin.
    #[structopt(long, short)]
    pub input: Option<PathBuf>,

    /// Directory policy/snapshot files are written to.
    #[structopt(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Output format: list, match-tree, or controller.
    #[structopt(long, default_value = "list")]
    pub output_format: OutputFormat,

    /// Logging level: one of "error", "warn", "info", "debug", "trace".
    #[structopt(short, long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Overall wall-clock time budget in seconds. Unlimited if absent.
    #[structopt(long)]
    pub time_limit: Option<u64>,

    /// Number of time-budget epochs to slice `--time-limit` into (spec.md §6 `epoch.max`).
    /// Defaults to the `FOND_EPOCH_MAX` environment variable, or 1.
    #[structopt(long)]
    pub epoch_max: Option<u32>,

    /// Disable dead-end/FSAP learning entirely (`deadend.enabled`).
    #[structopt(long)]
    pub no_deadend_learning: bool,

    /// Disable dead-end generalisation by variable relaxation (`deadend.generalize`).
    #[structopt(long)]
    pub no_deadend_generalize: bool,

    /// Disable forward poisoning on case 1 (`deadend.poison_search`).
    #[structopt(long)]
    pub no_poison_search: bool,

    /// Disable the dead-end combination rule of the successor generator (`deadend.combine`).
    #[structopt(long)]
    pub no_deadend_combine: bool,

    /// Record heuristic-discovered dead-ends online, letting case 1 short-circuit on the
    /// heuristic's say-so alone (`deadend.record_online`).
    #[structopt(long)]
    pub record_online_deadends: bool,

    /// Target weak plans at the original goal instead of the localized sub-goal
    /// (`localize.enabled`, inverted).
    #[structopt(long)]
    pub no_localize: bool,

    /// Penalize the reachability heuristic for operators that would enable a known FSAP
    /// (`weaksearch.penalize_potential_fsaps`).
    #[structopt(long)]
    pub penalize_potential_fsaps: bool,

    /// Penalty applied per enabled FSAP when `--penalize-potential-fsaps` is set
    /// (`weaksearch.fsap_penalty`). Defaults to the `FOND_FSAP_PENALTY` environment variable, or 0.
    #[structopt(long)]
    pub fsap_penalty: Option<u32>,

    /// Reserve the final epoch as a best-effort round with every dead-end safeguard disabled
    /// (`general.final_fsap_free_round`).
    #[structopt(long)]
    pub final_fsap_free_round: bool,

    /// Open-list ordering: lifo, fifo, near-init, away-init, or random
    /// (`fondsearch.node_preference`).
    #[structopt(long, default_value = "lifo")]
    pub node_preference: NodePreference,

    /// Emit numbered JSON snapshots of the PSGraph at driver checkpoints (spec.md §6
    /// "Snapshots (optional)"). Off by default since it multiplies disk I/O per round.
    #[structopt(long)]
    pub snapshots: bool,
}

impl Opt {
    pub fn resolved_epoch_max(&self) -> u32 {
        self.epoch_max.unwrap_or_else(|| FOND_EPOCH_MAX.get())
    }

    pub fn resolved_fsap_penalty(&self) -> u32 {
        self.fsap_penalty.unwrap_or_else(|| FOND_FSAP_PENALTY.get())
    }
}

/// Open-list ordering for the FOND search driver (spec.md §6 `fondsearch.node_preference`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodePreference {
    Lifo,
    Fifo,
    NearInit,
    AwayInit,
    Random,
}

impl Default for NodePreference {
    fn default() -> Self {
        NodePreference::Lifo
    }
}

impl std::str::FromStr for NodePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lifo" => Ok(NodePreference::Lifo),
            "fifo" => Ok(NodePreference::Fifo),
            "near-init" | "near_init" => Ok(NodePreference::NearInit),
            "away-init" | "away_init" => Ok(NodePreference::AwayInit),
            "random" => Ok(NodePreference::Random),
            other => Err(format!("unknown node preference {other:?} (expected one of: lifo, fifo, near-init, away-init, random)")),
        }
    }
}

/// Dead-end/FSAP learning knobs (spec.md §6 `deadend.*`).
#[derive(Clone, Copy, Debug)]
pub struct DeadendConfig {
    pub enabled: bool,
    pub generalize: bool,
    pub poison_search: bool,
    pub combine: bool,
    pub record_online: bool,
}

impl Default for DeadendConfig {
    fn default() -> Self {
        DeadendConfig {
            enabled: true,
            generalize: true,
            poison_search: true,
            combine: true,
            // Heuristic dead-end verdicts guide the weak planner's search but are not, by
            // default, trusted as authoritative terminations on their own: a node only becomes
            // a recorded dead-end after the weak planner actually fails to find a plan for it
            // (case 6). Set this to let case 1 short-circuit on the heuristic's say-so alone.
            record_online: false,
        }
    }
}

impl DeadendConfig {
    /// The configuration used for `general.final_fsap_free_round`: every dead-end safeguard is
    /// disabled so the round behaves as a best-effort weak-planning pass with no learning.
    pub fn disabled() -> Self {
        DeadendConfig {
            enabled: false,
            generalize: false,
            poison_search: false,
            combine: false,
            record_online: false,
        }
    }
}

/// All tunable behaviour of the FOND driver and its PRP epoch wrapper (spec.md §6).
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    pub deadend: DeadendConfig,
    pub localize: bool,
    pub heuristic: fond_heuristic::HeuristicConfig,
    pub epoch_max: u32,
    pub final_fsap_free_round: bool,
    pub node_preference: NodePreference,
    /// Reserved for switching between full and incremental strong-cyclic re-marking; the driver
    /// currently always re-marks the whole graph at the end of a round regardless of this flag,
    /// since the task sizes this planner targets make the distinction a non-issue.
    pub full_scd_marking: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            deadend: DeadendConfig::default(),
            localize: true,
            heuristic: fond_heuristic::HeuristicConfig::default(),
            epoch_max: 1,
            final_fsap_free_round: false,
            node_preference: NodePreference::default(),
            full_scd_marking: true,
        }
    }
}

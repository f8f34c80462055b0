use flipmatch_engine::{PowerupKind, PowerupOutcome, ScoreBreakdown, SessionTelemetry};
use serde::{Deserialize, Serialize};

/// Result of one simulated play-through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub recall: f64,
    pub telemetry: SessionTelemetry,
    pub score: Option<ScoreBreakdown>,
    pub powerups: Vec<PowerupRecord>,
    /// Currency balance after completion rewards
    pub currency: u32,
}

/// One power-up request made during a simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupRecord {
    pub kind: PowerupKind,
    pub at_attempt: usize,
    /// `None` when the request was rejected; see `rejection`
    pub outcome: Option<PowerupOutcome>,
    pub rejection: Option<String>,
}

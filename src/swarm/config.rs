use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::fixed_math::FixedNum;

/// Simulation tuning constants, loaded once at startup.
///
/// These values feed the deterministic fixed-point stepper, so changing them
/// mid-run would change trajectories; the worker converts them to fixed-point
/// once ([`SimParams`]) and never re-reads the file.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SimConfig {
    /// Per-tick acceleration toward the shared target, in world units.
    pub accel: f32,
    /// Hard cap on agent speed per tick.
    pub max_speed: f32,
    /// An agent within this distance of the target counts as arrived.
    pub target_radius: f32,
    /// Velocity multiplier applied on the tick an agent arrives.
    pub arrival_damping: f32,
    /// Weight of the Barnes-Hut swarm force added to target seeking.
    pub swarm_weight: f32,
    /// Barnes-Hut opening angle: subtrees narrower than theta * distance are
    /// treated as a single point mass. Smaller is more accurate and slower.
    pub theta: f32,
    /// Squared distances below this contribute no force (singularity guard).
    pub force_dist_floor_sq: f32,
    /// Seed for agent placement. `None` draws from OS entropy; set it to make
    /// an entire run reproducible.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            accel: 0.2,
            max_speed: 5.0,
            target_radius: 12.0,
            arrival_damping: 9.0 / 16.0,
            swarm_weight: 0.25,
            theta: 0.5,
            force_dist_floor_sq: 0.25,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from a RON file, falling back to defaults if the
    /// file is missing or malformed. The fallback is logged, never fatal.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match ron::from_str::<SimConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded sim config from {}", path);
                    config
                }
                Err(e) => {
                    error!("Failed to parse sim config: {}", e);
                    error!("Using default SimConfig");
                    SimConfig::default()
                }
            },
            Err(e) => {
                error!("Failed to read {}: {}", path, e);
                error!("Using default SimConfig");
                SimConfig::default()
            }
        }
    }

    /// Pre-converts every tunable to fixed-point for the hot path.
    pub fn to_params(&self) -> SimParams {
        let max_speed = FixedNum::from_num(self.max_speed);
        let target_radius = FixedNum::from_num(self.target_radius);
        SimParams {
            accel: FixedNum::from_num(self.accel),
            max_speed,
            max_speed_sq: max_speed * max_speed,
            target_radius_sq: target_radius * target_radius,
            arrival_damping: FixedNum::from_num(self.arrival_damping),
            swarm_weight: FixedNum::from_num(self.swarm_weight),
            theta: FixedNum::from_num(self.theta),
            force_dist_floor_sq: FixedNum::from_num(self.force_dist_floor_sq),
            seed: self.seed,
        }
    }
}

/// Fixed-point image of [`SimConfig`], computed once per worker.
#[derive(Clone, Copy, Debug)]
pub struct SimParams {
    pub accel: FixedNum,
    pub max_speed: FixedNum,
    pub max_speed_sq: FixedNum,
    pub target_radius_sq: FixedNum,
    pub arrival_damping: FixedNum,
    pub swarm_weight: FixedNum,
    pub theta: FixedNum,
    pub force_dist_floor_sq: FixedNum,
    pub seed: Option<u64>,
}

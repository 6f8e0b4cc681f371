//! Per-tick integrator driving every agent toward the shared target.
//!
//! One [`SwarmState::step`] call is exactly one discrete tick: Morton-sort
//! the agents, rebuild the quadtree, then seek + swarm-force + integrate +
//! clamp for each agent. Convergence is observed, never enforced - the
//! caller decides when to stop ticking.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::profile_log;

use super::config::SimParams;
use super::fixed_math::{FixedNum, FixedVec2};
use super::morton::morton_key;
use super::quadtree::QuadTree;

/// One simulated agent. Created in bulk by `init`, mutated in place each
/// tick, never destroyed individually.
#[derive(Clone, Copy, Debug)]
pub struct Agent {
    /// Stable identity; survives the per-tick spatial sort and fixes the
    /// agent's slot in the output buffer.
    pub id: u32,
    pub pos: FixedVec2,
    pub vel: FixedVec2,
    pub reached: bool,
    /// Morton sort key, refreshed at the start of every tick.
    pub key: u32,
}

/// The whole simulation state, owned by the worker task and threaded through
/// each command handler. Nothing in here is global or shared.
pub struct SwarmState {
    params: SimParams,
    agents: Vec<Agent>,
    target: FixedVec2,
    world: FixedVec2,
    tree: QuadTree,
    rng: StdRng,
    tick: u64,
}

impl SwarmState {
    pub fn new(params: SimParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            params,
            agents: Vec::new(),
            target: FixedVec2::ZERO,
            world: FixedVec2::ZERO,
            tree: QuadTree::new(),
            rng,
            tick: 0,
        }
    }

    /// (Re)creates exactly `count` agents uniformly inside [0, width) x
    /// [0, height), at rest, not reached. Positions are drawn in raw
    /// fixed-point bits so a seeded run reproduces exactly.
    pub fn init(&mut self, count: usize, width: FixedNum, height: FixedNum) {
        self.world = FixedVec2::new(width, height);
        self.agents.clear();
        self.agents.reserve(count);
        for id in 0..count {
            let pos = FixedVec2::new(
                FixedNum::from_bits(self.rng.random_range(0..width.to_bits())),
                FixedNum::from_bits(self.rng.random_range(0..height.to_bits())),
            );
            self.agents.push(Agent {
                id: id as u32,
                pos,
                vel: FixedVec2::ZERO,
                reached: false,
                key: 0,
            });
        }
        self.tick = 0;
    }

    /// Moves the shared target and restarts convergence from the agents'
    /// current positions by clearing every reached flag.
    pub fn set_target(&mut self, target: FixedVec2) {
        self.target = target;
        for agent in &mut self.agents {
            agent.reached = false;
        }
    }

    /// Advances every agent by one tick. Returns whether all agents have
    /// reached the target.
    pub fn step(&mut self) -> bool {
        // Locality sort: purely a memory-layout optimisation, ids break key
        // ties so the order (and therefore the tick) stays deterministic.
        for agent in &mut self.agents {
            agent.key = morton_key(agent.pos);
        }
        self.agents.sort_unstable_by_key(|agent| (agent.key, agent.id));

        self.tree.rebuild(
            self.world.x,
            self.world.y,
            self.agents.iter().map(|agent| (agent.id, agent.pos)),
        );

        let params = self.params;
        for i in 0..self.agents.len() {
            let agent = self.agents[i];
            if agent.reached {
                continue;
            }

            let to_target = self.target - agent.pos;
            let dist_sq = to_target.length_squared();
            if dist_sq < params.target_radius_sq {
                let agent = &mut self.agents[i];
                agent.reached = true;
                agent.vel = agent.vel * params.arrival_damping;
                continue;
            }

            let seek = to_target.normalize() * params.accel;
            let swarm = self
                .tree
                .force_at(agent.pos, params.theta, params.force_dist_floor_sq)
                * params.swarm_weight;

            let mut vel = agent.vel + seek + swarm;
            if vel.length_squared() > params.max_speed_sq {
                vel = vel.normalize() * params.max_speed;
            }

            let mut pos = agent.pos + vel;
            pos.x = pos.x.clamp(FixedNum::ZERO, self.world.x);
            pos.y = pos.y.clamp(FixedNum::ZERO, self.world.y);

            let agent = &mut self.agents[i];
            agent.pos = pos;
            agent.vel = vel;
        }

        self.tick += 1;
        profile_log!(
            self.tick,
            "[SWARM_STEP] tick {} agents {}",
            self.tick,
            self.agents.len()
        );
        self.all_reached()
    }

    /// Pure query: logical AND of every agent's reached flag.
    pub fn all_reached(&self) -> bool {
        self.agents.iter().all(|agent| agent.reached)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Interleaved (x, y, reached) triples in real-valued units, slotted by
    /// agent id so the layout is independent of the internal spatial sort.
    pub fn frame_buffer(&self) -> Vec<f32> {
        let mut buffer = vec![0.0f32; self.agents.len() * 3];
        for agent in &self.agents {
            let slot = agent.id as usize * 3;
            let (x, y) = agent.pos.to_f32();
            buffer[slot] = x;
            buffer[slot + 1] = y;
            buffer[slot + 2] = if agent.reached { 1.0 } else { 0.0 };
        }
        buffer
    }
}

#[cfg(test)]
#[path = "stepper_tests.rs"]
mod tests;

#[cfg(test)]
mod tests {
    use crate::swarm::config::SimConfig;
    use crate::swarm::fixed_math::{FixedNum, FixedVec2};
    use crate::swarm::stepper::SwarmState;

    fn seeded_state(seed: u64) -> SwarmState {
        let config = SimConfig {
            seed: Some(seed),
            ..SimConfig::default()
        };
        SwarmState::new(config.to_params())
    }

    fn dist_to(state: &SwarmState, idx: usize, x: f32, y: f32) -> f32 {
        let (px, py) = state.agents()[idx].pos.to_f32();
        ((px - x).powi(2) + (py - y).powi(2)).sqrt()
    }

    #[test]
    fn test_init_creates_count_agents_inside_bounds() {
        let mut state = seeded_state(1);
        state.init(128, FixedNum::from_num(600.0), FixedNum::from_num(400.0));

        assert_eq!(state.agents().len(), 128);
        for agent in state.agents() {
            let (x, y) = agent.pos.to_f32();
            assert!((0.0..600.0).contains(&x), "x {} out of bounds", x);
            assert!((0.0..400.0).contains(&y), "y {} out of bounds", y);
            assert_eq!(agent.vel, FixedVec2::ZERO);
            assert!(!agent.reached);
        }
    }

    #[test]
    fn test_init_is_reproducible_for_a_seed() {
        let mut a = seeded_state(77);
        let mut b = seeded_state(77);
        a.init(64, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        b.init(64, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        for (left, right) in a.agents().iter().zip(b.agents()) {
            assert_eq!(left.pos, right.pos, "seeded init must be reproducible");
        }
    }

    #[test]
    fn test_set_target_clears_reached_flags() {
        let mut state = seeded_state(2);
        state.init(16, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        state.set_target(FixedVec2::from_f32(300.0, 200.0));
        for _ in 0..500 {
            if state.step() {
                break;
            }
        }
        assert!(state.all_reached(), "swarm should have converged first");

        // Moving the target restarts convergence from current positions.
        state.set_target(FixedVec2::from_f32(50.0, 50.0));
        assert!(
            !state.all_reached(),
            "a fresh target away from the swarm must clear reached flags"
        );
    }

    #[test]
    fn test_single_agent_converges_within_500_ticks() {
        // accel 0.2, max speed 5, radius 12: from any start in a 600x400
        // world the agent must arrive in well under 500 ticks.
        let mut state = seeded_state(3);
        state.init(1, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        state.set_target(FixedVec2::from_f32(300.0, 200.0));

        let mut ticks = 0;
        while !state.step() {
            ticks += 1;
            assert!(ticks < 500, "agent failed to converge within 500 ticks");
        }
        assert!(
            dist_to(&state, 0, 300.0, 200.0) < 15.0,
            "converged agent should rest near the target"
        );
    }

    #[test]
    fn test_arrival_damps_velocity_by_nine_sixteenths() {
        let mut state = seeded_state(4);
        state.init(1, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        state.set_target(FixedVec2::from_f32(300.0, 200.0));

        let mut arrival_vel = None;
        for _ in 0..500 {
            let vel_before = state.agents()[0].vel;
            state.step();
            if state.agents()[0].reached {
                arrival_vel = Some(vel_before);
                break;
            }
        }
        let vel_before = arrival_vel.expect("agent never arrived");
        let damping = FixedNum::from_num(9.0) / FixedNum::from_num(16.0);
        assert_eq!(
            state.agents()[0].vel,
            vel_before * damping,
            "arrival tick must scale velocity by exactly 9/16"
        );
    }

    #[test]
    fn test_reached_agents_are_skipped() {
        let mut state = seeded_state(5);
        state.init(1, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        state.set_target(FixedVec2::from_f32(300.0, 200.0));
        while !state.step() {}

        let frozen = state.agents()[0].pos;
        state.step();
        state.step();
        assert_eq!(state.agents()[0].pos, frozen, "reached agents must not move");
    }

    #[test]
    fn test_positions_stay_clamped_to_world() {
        // A target far outside the world drags agents against the border;
        // clamping must hold them inside.
        let mut state = seeded_state(6);
        state.init(8, FixedNum::from_num(100.0), FixedNum::from_num(100.0));
        state.set_target(FixedVec2::from_f32(10_000.0, 10_000.0));
        for _ in 0..200 {
            state.step();
        }
        for agent in state.agents() {
            let (x, y) = agent.pos.to_f32();
            assert!((0.0..=100.0).contains(&x), "x {} escaped the world", x);
            assert!((0.0..=100.0).contains(&y), "y {} escaped the world", y);
        }
    }

    #[test]
    fn test_spatial_sort_preserves_identity() {
        let mut state = seeded_state(7);
        state.init(64, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        state.set_target(FixedVec2::from_f32(300.0, 200.0));
        for _ in 0..10 {
            state.step();
        }
        let mut ids: Vec<u32> = state.agents().iter().map(|a| a.id).collect();
        ids.sort_unstable();
        let expected: Vec<u32> = (0..64).collect();
        assert_eq!(ids, expected, "every id must survive the per-tick sort");
    }

    #[test]
    fn test_frame_buffer_is_slotted_by_id() {
        let mut state = seeded_state(8);
        state.init(32, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        state.set_target(FixedVec2::from_f32(300.0, 200.0));
        for _ in 0..25 {
            state.step();
        }

        let buffer = state.frame_buffer();
        assert_eq!(buffer.len(), 32 * 3);
        for agent in state.agents() {
            let slot = agent.id as usize * 3;
            let (x, y) = agent.pos.to_f32();
            assert_eq!(buffer[slot], x);
            assert_eq!(buffer[slot + 1], y);
            assert_eq!(buffer[slot + 2], if agent.reached { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn test_step_is_deterministic_across_runs() {
        let run = |seed: u64| -> Vec<f32> {
            let mut state = seeded_state(seed);
            state.init(100, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
            state.set_target(FixedVec2::from_f32(300.0, 200.0));
            for _ in 0..50 {
                state.step();
            }
            state.frame_buffer()
        };
        assert_eq!(run(99), run(99), "same seed must replay bit-identically");
    }

    #[test]
    fn test_swarm_converges_with_cohesion_enabled() {
        let mut state = seeded_state(10);
        state.init(32, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        state.set_target(FixedVec2::from_f32(300.0, 200.0));

        let mut converged = false;
        for _ in 0..3000 {
            if state.step() {
                converged = true;
                break;
            }
        }
        assert!(converged, "full swarm should converge under the default tuning");
    }

    #[test]
    fn test_empty_swarm_reports_all_reached() {
        let mut state = seeded_state(11);
        state.init(0, FixedNum::from_num(600.0), FixedNum::from_num(400.0));
        assert!(state.step(), "an empty swarm is vacuously converged");
    }
}

//! Command protocol boundary for the simulation core.
//!
//! The core runs on one dedicated thread and owns all simulation state;
//! the host talks to it exclusively through message passing. Command
//! handling is run-to-completion - no command starts before the previous
//! one finishes, so the core needs no locking. The tick frame produced by
//! `update` is moved through the channel, never copied, and the core keeps
//! no reference to it afterwards.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info};

use super::config::SimConfig;
use super::fixed_math::{FixedNum, FixedVec2};
use super::stepper::SwarmState;

/// Upper bound on the agent population accepted by `init`.
pub const MAX_AGENTS: usize = 262_144;

/// Upper bound on either world dimension, in world units. Keeps squared
/// distances comfortably inside the raw i64 fixed-point arithmetic.
pub const MAX_WORLD_UNITS: f32 = 32_768.0;

/// The closed set of operations the host can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Recreate exactly `count` agents at rest, uniformly placed inside
    /// [0, width) x [0, height).
    Init { count: usize, width: f32, height: f32 },
    /// Move the shared target and clear every agent's reached flag.
    SetTarget { x: f32, y: f32 },
    /// Run exactly one tick and return a frame. No internal timer: the host
    /// owns all cadence decisions.
    Update,
    /// Stop the worker loop. Sent automatically when the handle drops.
    Shutdown,
}

/// Output of one tick: interleaved (x, y, reached) triples in real-valued
/// units plus the aggregate convergence flag. Ownership transfers to the
/// host; the core does not retain or mutate the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFrame {
    pub buffer: Vec<f32>,
    pub all_reached: bool,
}

/// Explicit errors at the protocol boundary. Inside the tick the core is
/// total (clamps and guards, no failure paths); only invalid commands and a
/// dead worker are reportable conditions.
#[derive(Debug, Error, PartialEq)]
pub enum SwarmError {
    #[error("init rejected: {count} agents exceeds the limit of {}", MAX_AGENTS)]
    TooManyAgents { count: usize },
    #[error("init rejected: world {width}x{height} outside [1, {}] per axis", MAX_WORLD_UNITS)]
    InvalidBounds { width: f32, height: f32 },
    #[error("target ({x}, {y}) is not finite or outside +-{}", MAX_WORLD_UNITS)]
    InvalidTarget { x: f32, y: f32 },
    #[error("update issued before init")]
    NotInitialized,
    #[error("worker reply did not match the command")]
    ProtocolViolation,
    #[error("worker thread disconnected")]
    Disconnected,
}

enum Reply {
    Ack,
    Frame(TickFrame),
}

/// Host-side handle to the worker thread.
///
/// Every method is a synchronous request/reply pair; issuing the next
/// command only after the previous reply is the caller's backpressure.
pub struct SwarmHandle {
    commands: Sender<Command>,
    replies: Receiver<Result<Reply, SwarmError>>,
    thread: Option<JoinHandle<()>>,
}

impl SwarmHandle {
    /// Spawns the dedicated worker thread.
    pub fn spawn(config: SimConfig) -> std::io::Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("swarm-worker".into())
            .spawn(move || worker_loop(config, command_rx, reply_tx))?;
        Ok(Self {
            commands: command_tx,
            replies: reply_rx,
            thread: Some(thread),
        })
    }

    pub fn init(&self, count: usize, width: f32, height: f32) -> Result<(), SwarmError> {
        match self.request(Command::Init { count, width, height })? {
            Reply::Ack => Ok(()),
            Reply::Frame(_) => Err(SwarmError::ProtocolViolation),
        }
    }

    pub fn set_target(&self, x: f32, y: f32) -> Result<(), SwarmError> {
        match self.request(Command::SetTarget { x, y })? {
            Reply::Ack => Ok(()),
            Reply::Frame(_) => Err(SwarmError::ProtocolViolation),
        }
    }

    /// Runs exactly one tick. The returned frame is owned by the caller.
    pub fn update(&self) -> Result<TickFrame, SwarmError> {
        match self.request(Command::Update)? {
            Reply::Frame(frame) => Ok(frame),
            Reply::Ack => Err(SwarmError::ProtocolViolation),
        }
    }

    fn request(&self, command: Command) -> Result<Reply, SwarmError> {
        self.commands
            .send(command)
            .map_err(|_| SwarmError::Disconnected)?;
        self.replies.recv().map_err(|_| SwarmError::Disconnected)?
    }
}

impl Drop for SwarmHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop(
    config: SimConfig,
    commands: Receiver<Command>,
    replies: Sender<Result<Reply, SwarmError>>,
) {
    // The worker owns the entire simulation state for its whole lifetime.
    // Init replaces the agent population but the shared target persists: it
    // is only ever mutated by SetTarget.
    let mut state = SwarmState::new(config.to_params());
    let mut initialized = false;
    info!("Swarm worker started");

    while let Ok(command) = commands.recv() {
        if command == Command::Shutdown {
            break;
        }
        let reply = handle_command(&mut state, &mut initialized, command);
        if replies.send(reply).is_err() {
            // Host side hung up; nothing left to serve.
            break;
        }
    }
    info!("Swarm worker stopped");
}

fn handle_command(
    state: &mut SwarmState,
    initialized: &mut bool,
    command: Command,
) -> Result<Reply, SwarmError> {
    match command {
        Command::Init { count, width, height } => {
            if count > MAX_AGENTS {
                return Err(SwarmError::TooManyAgents { count });
            }
            if !bounds_valid(width) || !bounds_valid(height) {
                return Err(SwarmError::InvalidBounds { width, height });
            }
            state.init(count, FixedNum::from_num(width), FixedNum::from_num(height));
            *initialized = true;
            debug!(count, width, height, "Initialized swarm");
            Ok(Reply::Ack)
        }
        Command::SetTarget { x, y } => {
            if !target_valid(x) || !target_valid(y) {
                return Err(SwarmError::InvalidTarget { x, y });
            }
            state.set_target(FixedVec2::from_f32(x, y));
            debug!(x, y, "Target moved");
            Ok(Reply::Ack)
        }
        Command::Update => {
            if !*initialized {
                return Err(SwarmError::NotInitialized);
            }
            let all_reached = state.step();
            Ok(Reply::Frame(TickFrame {
                buffer: state.frame_buffer(),
                all_reached,
            }))
        }
        // Intercepted by the worker loop before dispatch.
        Command::Shutdown => Ok(Reply::Ack),
    }
}

fn bounds_valid(extent: f32) -> bool {
    // At least one full world unit per axis: a sub-unit extent can round to
    // zero fixed-point bits, leaving init with an empty placement range.
    extent.is_finite() && (1.0..=MAX_WORLD_UNITS).contains(&extent)
}

fn target_valid(coord: f32) -> bool {
    // Finite alone is not enough either: f32 reaches far beyond what the
    // fixed-point conversion can represent without panicking.
    coord.is_finite() && coord.abs() <= MAX_WORLD_UNITS
}

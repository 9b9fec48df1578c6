pub mod scheduler;
pub mod session;

pub use scheduler::{AnimationState, Direction, PlaybackScheduler, StopReason, TickPlan};
pub use session::{MotionSession, TickOutcome};

// Progression playback: timing plan, sessions, notification timers and the
// scheduler that ties them to an output context.

pub mod plan;
pub mod scheduler;
pub mod session;
pub mod timer;

pub use plan::{ChordWindow, PlaybackPlan, seconds_per_chord};
pub use scheduler::PlaybackScheduler;
pub use session::PlaybackState;
pub use timer::{PlaybackEvent, SessionToken};

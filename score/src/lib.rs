pub mod scheduler;
pub use scheduler::{
    Barrier, Cue, Latch, ScheduleError, StopFlag, Timeline, run,
};
pub mod timelines;
pub mod sequence;
pub use sequence::{compose, main_sequence};

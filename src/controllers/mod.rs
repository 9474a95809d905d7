pub mod hunt;
pub mod target_runner;

pub use hunt::HuntController;
pub use target_runner::{RunnerEvent, Target, TargetKind, TargetRunner};

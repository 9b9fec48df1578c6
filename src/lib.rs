pub mod config;
pub mod error;
pub mod kinematics;
pub mod logging;
pub mod motion;
pub mod playback;
pub mod render;
pub mod report;
pub mod skeleton;

pub use error::{KinematicsError, Result};

/// ビルド時に埋め込んだバージョン (git describe)
pub const VERSION: &str = env!("MOTION_KINEMATICS_VERSION");

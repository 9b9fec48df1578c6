pub mod pose;
pub mod provider;
pub mod synthetic;

pub use pose::{Motion, MotionInfo, Pose};
pub use provider::{FrameParameters, MotionParameters, PoseProvider, BODY_POSE_LEN};
pub use synthetic::{walking_cycle, ProceduralBody};

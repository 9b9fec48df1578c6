pub mod angles;
pub mod vector_field;
pub mod worker;

pub use angles::{angle_between, bone_direction, JointAngleData};
pub use vector_field::{acceleration_field, velocity_field, FieldSample, VectorField};
pub use worker::{AngleJobResult, AngleWorker};

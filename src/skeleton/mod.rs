pub mod groups;
pub mod topology;

pub use groups::{GroupStates, JointGroup, JointSelection};
pub use topology::{validate_topology, Joint, JointIndex, JOINTS, JOINT_COUNT};

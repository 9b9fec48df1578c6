pub mod arrow;
pub mod scene;

pub use arrow::{
    rotation_to, solve_arrow, ArrowGeometry, ArrowPlacement, ArrowScale, UserArrowSetting,
};
pub use scene::{
    draw_arrows, draw_mesh, hide_mesh, remove_arrows, ArrowKind, Geometry, Material, MeshState,
    RecordingScene, SceneSink, Shader,
};

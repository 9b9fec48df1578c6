//! Seam to the rendering collaborator.
//!
//! Geometry is keyed by string id. Redrawing a glyph always removes the old id
//! first and then adds the new one, so rapid frame changes never leave stale
//! arrows behind.

use std::collections::BTreeMap;

use nalgebra::Point3;
use serde::Deserialize;

use super::arrow::{solve_arrow, ArrowPlacement, UserArrowSetting};
use crate::kinematics::VectorField;
use crate::motion::Motion;
use crate::skeleton::JOINT_COUNT;

pub const MESH_ID: &str = "mesh";
pub const JOINTS_ID: &str = "joints";

const MESH_COLOR: [f32; 4] = [0.3, 0.3, 0.3, 0.5];
const JOINT_MARKER_COLOR: [f32; 4] = [0.8, 0.0, 0.0, 1.0];
const JOINT_MARKER_BASE_SIZE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowKind {
    Velocity,
    Acceleration,
}

impl ArrowKind {
    pub const ALL: [ArrowKind; 2] = [ArrowKind::Velocity, ArrowKind::Acceleration];

    pub fn id_prefix(self) -> &'static str {
        match self {
            ArrowKind::Velocity => "arrow_vel",
            ArrowKind::Acceleration => "arrow_acc",
        }
    }

    /// 関節ごとの矢印ID (例: "arrow_vel3")
    pub fn geometry_id(self, joint: usize) -> String {
        format!("{}{}", self.id_prefix(), joint)
    }
}

/// メッシュの表示状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshState {
    #[default]
    Transparent,
    Opaque,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shader {
    Lit,
    LitTransparency,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub shader: Shader,
    pub base_color: [f32; 4],
    pub point_size: f32,
}

impl Material {
    pub fn arrow(color: [f32; 4]) -> Self {
        Self { shader: Shader::Lit, base_color: color, point_size: 0.0 }
    }

    pub fn mesh(state: MeshState) -> Self {
        let shader = match state {
            MeshState::Opaque => Shader::Lit,
            _ => Shader::LitTransparency,
        };
        Self { shader, base_color: MESH_COLOR, point_size: 0.0 }
    }

    /// 関節マーカー (点サイズ = 4 + joint_size)
    pub fn joint_markers(joint_size: u8) -> Self {
        Self {
            shader: Shader::Lit,
            base_color: JOINT_MARKER_COLOR,
            point_size: JOINT_MARKER_BASE_SIZE + joint_size as f32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Arrow(ArrowPlacement),
    JointMarkers(Vec<Point3<f64>>),
    Mesh(Vec<Point3<f64>>),
}

/// 描画側が実装するシーン操作
pub trait SceneSink {
    fn add_geometry(&mut self, id: &str, geometry: Geometry, material: &Material);
    fn remove_geometry(&mut self, id: &str);
}

/// ある種別の矢印を全関節分取り除く
pub fn remove_arrows(scene: &mut dyn SceneSink, kind: ArrowKind) {
    for j in 0..JOINT_COUNT {
        scene.remove_geometry(&kind.geometry_id(j));
    }
}

/// ベクトル場を矢印として配置する。配置した本数を返す
pub fn draw_arrows(
    scene: &mut dyn SceneSink,
    kind: ArrowKind,
    joints: &[Point3<f64>; JOINT_COUNT],
    field: &VectorField,
    setting: &UserArrowSetting,
) -> usize {
    let material = Material::arrow(setting.color);
    let mut drawn = 0;
    for (j, sample) in field.iter() {
        let Some(placement) =
            solve_arrow(&joints[j], &sample.vector, setting, sample.scaling_factor)
        else {
            continue;
        };
        let id = kind.geometry_id(j);
        scene.remove_geometry(&id);
        scene.add_geometry(&id, Geometry::Arrow(placement), &material);
        drawn += 1;
    }
    drawn
}

/// メッシュと関節マーカーを描き直す。最終遷移フレーム以降は何もしない
pub fn draw_mesh(
    scene: &mut dyn SceneSink,
    motion: &Motion,
    frame: usize,
    state: MeshState,
    joint_size: u8,
) -> bool {
    if !motion.has_transition(frame) {
        return false;
    }
    let Some(pose) = motion.pose(frame) else {
        return false;
    };

    scene.remove_geometry(MESH_ID);
    scene.remove_geometry(JOINTS_ID);

    if matches!(state, MeshState::Hidden | MeshState::Transparent) {
        scene.add_geometry(
            JOINTS_ID,
            Geometry::JointMarkers(pose.joints.to_vec()),
            &Material::joint_markers(joint_size),
        );
    }
    if state != MeshState::Hidden {
        scene.add_geometry(MESH_ID, Geometry::Mesh(pose.vertices.clone()), &Material::mesh(state));
    }
    true
}

/// メッシュと関節マーカーを消す
pub fn hide_mesh(scene: &mut dyn SceneSink) {
    scene.remove_geometry(MESH_ID);
    scene.remove_geometry(JOINTS_ID);
}

/// 現在配置されているジオメトリを保持するシーン
#[derive(Debug, Default)]
pub struct RecordingScene {
    live: BTreeMap<String, (Geometry, Material)>,
    pub adds: usize,
    pub removes: usize,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&(Geometry, Material)> {
        self.live.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// 指定種別の矢印数
    pub fn arrow_count(&self, kind: ArrowKind) -> usize {
        self.live.keys().filter(|id| id.starts_with(kind.id_prefix())).count()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.live.keys().map(String::as_str)
    }
}

impl SceneSink for RecordingScene {
    fn add_geometry(&mut self, id: &str, geometry: Geometry, material: &Material) {
        self.adds += 1;
        self.live.insert(id.to_string(), (geometry, *material));
    }

    fn remove_geometry(&mut self, id: &str) {
        if self.live.remove(id).is_some() {
            self.removes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::velocity_field;
    use crate::motion::{MotionInfo, Pose};
    use crate::render::arrow::UserArrowSetting;

    /// 関節 j が x 方向に j*0.01/frame で動く（関節0は静止）
    fn fanned_motion(frames: usize) -> Motion {
        let poses = (0..frames)
            .map(|i| {
                let joints =
                    std::array::from_fn(|j| Point3::new(0.01 * (j * i) as f64, j as f64, 0.0));
                Pose::new(joints, vec![Point3::new(i as f64, 0.0, 0.0); 3])
            })
            .collect();
        Motion::new(MotionInfo::new("fan", 10.0, 100.0), 30.0, poses).unwrap()
    }

    #[test]
    fn test_geometry_ids() {
        assert_eq!(ArrowKind::Velocity.geometry_id(3), "arrow_vel3");
        assert_eq!(ArrowKind::Acceleration.geometry_id(23), "arrow_acc23");
    }

    #[test]
    fn test_draw_arrows_skips_absent() {
        let motion = fanned_motion(5);
        let field = velocity_field(&motion, 1, 1).unwrap();
        let mut scene = RecordingScene::new();
        let mut setting = UserArrowSetting::new([1.0, 1.0, 0.0, 1.0]);
        setting.enabled = true;

        let joints = &motion.poses()[1].joints;
        let drawn = draw_arrows(&mut scene, ArrowKind::Velocity, joints, &field, &setting);
        assert_eq!(drawn, JOINT_COUNT - 1);
        assert!(!scene.contains("arrow_vel0"));
        assert!(scene.contains("arrow_vel1"));
        assert_eq!(scene.arrow_count(ArrowKind::Velocity), JOINT_COUNT - 1);
        assert_eq!(scene.arrow_count(ArrowKind::Acceleration), 0);

        let (_, material) = scene.get("arrow_vel5").unwrap();
        assert_eq!(material.base_color, [1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_redraw_replaces_instead_of_accumulating() {
        let motion = fanned_motion(6);
        let setting = UserArrowSetting::new([1.0, 0.0, 0.0, 1.0]);
        let mut scene = RecordingScene::new();
        for frame in 0..4 {
            let field = velocity_field(&motion, frame, 1).unwrap();
            let joints = &motion.poses()[frame].joints;
            draw_arrows(&mut scene, ArrowKind::Velocity, joints, &field, &setting);
        }
        assert_eq!(scene.arrow_count(ArrowKind::Velocity), JOINT_COUNT - 1);
        // 2回目以降は全て remove → add
        assert_eq!(scene.removes, 3 * (JOINT_COUNT - 1));

        let Some((Geometry::Arrow(p), _)) = scene.get("arrow_vel2") else {
            panic!("arrow_vel2 missing");
        };
        assert_eq!(p.origin, motion.poses()[3].joints[2]);
    }

    #[test]
    fn test_remove_arrows() {
        let motion = fanned_motion(4);
        let setting = UserArrowSetting::new([1.0, 0.0, 0.0, 1.0]);
        let mut scene = RecordingScene::new();
        let field = velocity_field(&motion, 0, 1).unwrap();
        let joints = &motion.poses()[0].joints;
        draw_arrows(&mut scene, ArrowKind::Acceleration, joints, &field, &setting);
        draw_mesh(&mut scene, &motion, 0, MeshState::Opaque, 1);

        remove_arrows(&mut scene, ArrowKind::Acceleration);
        assert_eq!(scene.arrow_count(ArrowKind::Acceleration), 0);
        assert!(scene.contains(MESH_ID));
    }

    #[test]
    fn test_draw_mesh_states() {
        let motion = fanned_motion(4);
        let mut scene = RecordingScene::new();

        assert!(draw_mesh(&mut scene, &motion, 1, MeshState::Transparent, 2));
        assert!(scene.contains(MESH_ID) && scene.contains(JOINTS_ID));
        let (_, mat) = scene.get(JOINTS_ID).unwrap();
        assert_eq!(mat.point_size, 6.0);
        let (_, mat) = scene.get(MESH_ID).unwrap();
        assert_eq!(mat.shader, Shader::LitTransparency);

        draw_mesh(&mut scene, &motion, 1, MeshState::Opaque, 2);
        assert!(scene.contains(MESH_ID) && !scene.contains(JOINTS_ID));
        let (_, mat) = scene.get(MESH_ID).unwrap();
        assert_eq!(mat.shader, Shader::Lit);

        draw_mesh(&mut scene, &motion, 1, MeshState::Hidden, 2);
        assert!(!scene.contains(MESH_ID) && scene.contains(JOINTS_ID));
    }

    #[test]
    fn test_draw_mesh_last_frame_noop() {
        let motion = fanned_motion(4);
        let mut scene = RecordingScene::new();
        assert!(!draw_mesh(&mut scene, &motion, 3, MeshState::Opaque, 1));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_mesh_state_from_toml() {
        #[derive(Deserialize)]
        struct Wrap {
            mesh: MeshState,
        }
        let w: Wrap = toml::from_str("mesh = \"hidden\"").unwrap();
        assert_eq!(w.mesh, MeshState::Hidden);
    }
}

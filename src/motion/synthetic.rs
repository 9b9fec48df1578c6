use nalgebra::{Point3, UnitQuaternion, Vector3};

use super::provider::{FrameParameters, MotionParameters, PoseProvider, BODY_POSE_LEN};
use crate::skeleton::{JOINTS, JOINT_COUNT};

/// 親関節からのレスト姿勢オフセット（メートル, Y上向き, +X が左）
/// Pelvis のみ原点からの位置
const REST_OFFSETS: [[f64; 3]; JOINT_COUNT] = [
    [0.0, 0.93, 0.0],     // Pelvis
    [0.06, -0.09, 0.0],   // Left Hip
    [-0.06, -0.09, 0.0],  // Right Hip
    [0.0, 0.11, -0.02],   // Spine1
    [0.04, -0.38, 0.0],   // Left Knee
    [-0.04, -0.38, 0.0],  // Right Knee
    [0.0, 0.13, 0.01],    // Spine2
    [-0.01, -0.40, -0.04], // Left Ankle
    [0.01, -0.40, -0.04], // Right Ankle
    [0.0, 0.05, 0.02],    // Spine3
    [0.02, -0.06, 0.12],  // Left Foot
    [-0.02, -0.06, 0.12], // Right Foot
    [0.0, 0.21, -0.03],   // Neck
    [0.07, 0.11, -0.01],  // Left Collar
    [-0.07, 0.11, -0.01], // Right Collar
    [0.0, 0.09, 0.05],    // Head
    [0.11, 0.05, -0.02],  // Left Shoulder
    [-0.11, 0.05, -0.02], // Right Shoulder
    [0.26, -0.01, -0.02], // Left Elbow
    [-0.26, -0.01, -0.02], // Right Elbow
    [0.25, 0.01, 0.0],    // Left Wrist
    [-0.25, 0.01, 0.0],   // Right Wrist
    [0.08, -0.01, -0.01], // Left Hand
    [-0.08, -0.01, -0.01], // Right Hand
];

/// 関節回転を親から順に合成する簡易順運動学ボディ
///
/// 体モデル評価器の代わりにデモとテストで使う。頂点は関節位置をそのまま返す。
#[derive(Debug, Clone, Default)]
pub struct ProceduralBody;

impl ProceduralBody {
    pub fn new() -> Self {
        Self
    }

    fn local_rotation(params: &FrameParameters, joint: usize) -> UnitQuaternion<f64> {
        // 手先 (22, 23) は回転パラメータを持たない
        if joint == 0 || joint > BODY_POSE_LEN / 3 {
            return UnitQuaternion::identity();
        }
        let o = (joint - 1) * 3;
        let aa = Vector3::from_column_slice(&params.body_pose[o..o + 3]);
        UnitQuaternion::from_scaled_axis(aa)
    }

    pub fn joint_positions(&self, params: &FrameParameters) -> [Point3<f64>; JOINT_COUNT] {
        let mut rotations = [UnitQuaternion::identity(); JOINT_COUNT];
        let mut positions = [Point3::origin(); JOINT_COUNT];

        let [gx, gy, gz] = params.global_orientation;
        let [tx, ty, tz] = params.translation;
        rotations[0] = UnitQuaternion::from_scaled_axis(Vector3::new(gx, gy, gz));
        positions[0] = Point3::from(Vector3::from(REST_OFFSETS[0]) + Vector3::new(tx, ty, tz));

        // JOINTS は親が必ず子より前に並ぶ
        for joint in JOINTS.iter().skip(1) {
            let Some(parent) = joint.parent else { continue };
            let offset = Vector3::from(REST_OFFSETS[joint.index]);
            positions[joint.index] = positions[parent] + rotations[parent] * offset;
            rotations[joint.index] = rotations[parent] * Self::local_rotation(params, joint.index);
        }

        positions
    }
}

impl PoseProvider for ProceduralBody {
    fn evaluate(
        &self,
        params: &FrameParameters,
    ) -> anyhow::Result<(Vec<Point3<f64>>, Vec<Point3<f64>>)> {
        let joints = self.joint_positions(params).to_vec();
        let vertices = joints.clone();
        Ok((joints, vertices))
    }
}

fn set_axis_angle(body_pose: &mut [f64; BODY_POSE_LEN], joint: usize, aa: [f64; 3]) {
    let o = (joint - 1) * 3;
    body_pose[o..o + 3].copy_from_slice(&aa);
}

/// 歩行サイクルのパラメータ列を生成する（1歩行周期/秒, 前進 1.2m/s）
pub fn walking_cycle(num_frames: usize, frame_rate: f64) -> MotionParameters {
    use std::f64::consts::TAU;

    let mut params = MotionParameters {
        frame_rate,
        ..Default::default()
    };

    for i in 0..num_frames {
        let t = i as f64 / frame_rate;
        let phase = TAU * t;
        let swing = phase.sin();

        let mut body_pose = [0.0; BODY_POSE_LEN];
        // 股関節: 左右逆位相
        set_axis_angle(&mut body_pose, 1, [-0.5 * swing, 0.0, 0.0]);
        set_axis_angle(&mut body_pose, 2, [0.5 * swing, 0.0, 0.0]);
        // 膝: 遊脚期のみ屈曲
        set_axis_angle(&mut body_pose, 4, [0.9 * (phase + 0.6).sin().max(0.0), 0.0, 0.0]);
        let right_knee = 0.9 * (phase + 0.6 + TAU / 2.0).sin().max(0.0);
        set_axis_angle(&mut body_pose, 5, [right_knee, 0.0, 0.0]);
        // 肩: 股関節と逆位相の腕振り
        set_axis_angle(&mut body_pose, 16, [0.0, 0.0, -1.2]);
        set_axis_angle(&mut body_pose, 17, [0.0, 0.0, 1.2]);
        set_axis_angle(&mut body_pose, 18, [0.0, 0.3 + 0.2 * swing, 0.0]);
        set_axis_angle(&mut body_pose, 19, [0.0, -0.3 + 0.2 * swing, 0.0]);
        // 体幹の軽いひねり
        set_axis_angle(&mut body_pose, 3, [0.0, 0.05 * swing, 0.0]);

        params.root_orient.push([0.0, 0.0, 0.0]);
        params.pose_body.push(body_pose);
        params.trans.push([0.0, 0.02 * (2.0 * phase).cos(), 1.2 * t]);
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{Motion, MotionInfo};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_rest_pose_hierarchy() {
        let body = ProceduralBody::new();
        let joints = body.joint_positions(&FrameParameters::rest());
        // レスト姿勢では親位置 + オフセット
        for joint in JOINTS.iter().skip(1) {
            let parent = joint.parent.unwrap();
            let expected = joints[parent] + Vector3::from(REST_OFFSETS[joint.index]);
            assert!((joints[joint.index] - expected).norm() < 1e-12, "{}", joint.name);
        }
        assert!(approx_eq(joints[0].y, 0.93, 1e-12));
    }

    #[test]
    fn test_translation_moves_every_joint() {
        let body = ProceduralBody::new();
        let rest = body.joint_positions(&FrameParameters::rest());
        let mut params = FrameParameters::rest();
        params.translation = [1.0, 2.0, 3.0];
        let moved = body.joint_positions(&params);
        for (a, b) in rest.iter().zip(moved.iter()) {
            assert!(((*b - *a) - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_local_rotation_preserves_bone_length() {
        let body = ProceduralBody::new();
        let mut params = FrameParameters::rest();
        set_axis_angle(&mut params.body_pose, 4, [1.0, 0.0, 0.0]);
        let joints = body.joint_positions(&params);
        // 膝を曲げても脛の長さは変わらない
        let shin = (joints[7] - joints[4]).norm();
        let rest_shin = Vector3::from(REST_OFFSETS[7]).norm();
        assert!(approx_eq(shin, rest_shin, 1e-12));
    }

    #[test]
    fn test_walking_cycle_loads() {
        let params = walking_cycle(90, 30.0);
        assert_eq!(params.num_frames(), 90);
        let info = MotionInfo::new("Walking", 5.7, 222.7);
        let motion = Motion::load(info, &params, &ProceduralBody::new()).unwrap();
        assert_eq!(motion.num_frames(), 90);
        // 前進している
        let first = motion.pose(0).unwrap().joints[0];
        let last = motion.pose(89).unwrap().joints[0];
        assert!(last.z - first.z > 3.0);
    }
}

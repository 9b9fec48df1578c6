use nalgebra::Vector3;
use ndarray::Array2;

use crate::motion::{Motion, Pose};
use crate::skeleton::{Joint, JOINT_COUNT};

/// 親→自分 方向の単位ベクトル。長さ0ならゼロベクトルのまま
pub fn bone_direction(current: &Vector3<f64>, parent: &Vector3<f64>) -> Vector3<f64> {
    let v = current - parent;
    let norm = v.norm();
    if norm != 0.0 {
        v / norm
    } else {
        v
    }
}

/// 2つの骨方向のなす角（度）。内積は [-1, 1] にクランプ
pub fn angle_between(from_parent: &Vector3<f64>, to_child: &Vector3<f64>) -> f64 {
    from_parent.dot(to_child).clamp(-1.0, 1.0).acos().to_degrees()
}

/// 関節角度・角速度・角加速度のテーブル [関節 × フレーム]
#[derive(Debug, Clone, PartialEq)]
pub struct JointAngleData {
    pub angles: Array2<f64>,
    pub angular_velocities: Array2<f64>,
    pub angular_accelerations: Array2<f64>,
    is_empty: bool,
}

impl JointAngleData {
    /// 未計算のテーブル（全要素0）
    pub fn empty(num_frames: usize) -> Self {
        Self {
            angles: Array2::zeros((JOINT_COUNT, num_frames)),
            angular_velocities: Array2::zeros((JOINT_COUNT, num_frames)),
            angular_accelerations: Array2::zeros((JOINT_COUNT, num_frames)),
            is_empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn num_frames(&self) -> usize {
        self.angles.ncols()
    }

    /// 全関節・全フレームを一括計算する
    ///
    /// ローカルで全テーブルを埋めてから返すので、途中状態は外から見えない。
    pub fn compute(motion: &Motion, joints: &[Joint]) -> Self {
        let num_frames = motion.num_frames();
        let mut data = Self::empty(num_frames);
        if num_frames == 0 {
            return data;
        }

        let dt_inv = motion.frame_rate;
        let mut directions = [Vector3::zeros(); JOINT_COUNT];

        for (i, pose) in motion.poses().iter().enumerate() {
            bone_directions(pose, joints, &mut directions);

            for joint in joints.iter().filter(|j| j.has_angle()) {
                let (Some(child), Some(reference)) = (joint.child, joint.reference_angle) else {
                    continue;
                };
                let j = joint.index;
                let raw = angle_between(&directions[j], &directions[child]);
                data.angles[[j, i]] = raw.round_ties_even() - reference;

                if i >= 1 {
                    data.angular_velocities[[j, i - 1]] =
                        (data.angles[[j, i]] - data.angles[[j, i - 1]]) * dt_inv;
                }
                if i >= 2 {
                    data.angular_accelerations[[j, i - 1]] = (data.angular_velocities[[j, i - 1]]
                        - data.angular_velocities[[j, i - 2]])
                        * dt_inv;
                }
            }
        }

        data.is_empty = false;
        data
    }
}

fn bone_directions(pose: &Pose, joints: &[Joint], out: &mut [Vector3<f64>; JOINT_COUNT]) {
    for joint in joints {
        out[joint.index] = match joint.parent {
            Some(parent) => {
                bone_direction(&pose.joints[joint.index].coords, &pose.joints[parent].coords)
            }
            None => Vector3::zeros(),
        };
    }
}

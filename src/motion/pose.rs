use nalgebra::Point3;

use crate::error::{KinematicsError, Result};
use crate::skeleton::JOINT_COUNT;

/// 1フレーム分の姿勢（関節位置 + メッシュ頂点）
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub joints: [Point3<f64>; JOINT_COUNT],
    /// 描画用にそのまま渡すだけの頂点列
    pub vertices: Vec<Point3<f64>>,
}

impl Pose {
    pub fn new(joints: [Point3<f64>; JOINT_COUNT], vertices: Vec<Point3<f64>>) -> Self {
        Self { joints, vertices }
    }

    /// 可変長の関節列から作成。関節数が合わなければエラー
    pub fn from_parts(
        frame: usize,
        joints: Vec<Point3<f64>>,
        vertices: Vec<Point3<f64>>,
    ) -> Result<Self> {
        let actual = joints.len();
        let joints: [Point3<f64>; JOINT_COUNT] =
            joints.try_into().map_err(|_| KinematicsError::PoseShape {
                frame,
                expected: JOINT_COUNT,
                actual,
            })?;
        Ok(Self { joints, vertices })
    }

    pub fn joint(&self, index: usize) -> &Point3<f64> {
        &self.joints[index]
    }
}

/// モーションカタログの1エントリ（正規化用の経験的最大値を含む）
#[derive(Debug, Clone, PartialEq)]
pub struct MotionInfo {
    pub name: String,
    /// 速度矢印のスケーリング基準 (units/s)
    pub max_velocity: f64,
    /// 加速度矢印のスケーリング基準 (units/s^2)
    pub max_acceleration: f64,
}

impl MotionInfo {
    pub fn new(name: impl Into<String>, max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            name: name.into(),
            max_velocity,
            max_acceleration,
        }
    }
}

/// 読み込み済みのモーション。構築後は読み取り専用
#[derive(Debug, Clone)]
pub struct Motion {
    pub info: MotionInfo,
    /// フレームレート (frames/s)。差分の時間刻みは 1/frame_rate
    pub frame_rate: f64,
    poses: Vec<Pose>,
}

impl Motion {
    pub fn new(info: MotionInfo, frame_rate: f64, poses: Vec<Pose>) -> Result<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(KinematicsError::parameter_shape(format!(
                "frame rate must be positive, got {}",
                frame_rate
            )));
        }
        Ok(Self { info, frame_rate, poses })
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn num_frames(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn pose(&self, frame: usize) -> Option<&Pose> {
        self.poses.get(frame)
    }

    /// 最後の有効な遷移フレーム (num_frames - 1) 未満か
    pub fn has_transition(&self, frame: usize) -> bool {
        frame < self.poses.len().saturating_sub(1)
    }
}

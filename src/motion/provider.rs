//! Boundary to the body-model evaluator.
//!
//! The evaluator itself is external: it turns axis-angle parameters into
//! joint positions and mesh vertices. Motions are built eagerly, one
//! evaluation per frame, at load time.

use anyhow::Context;
use nalgebra::Point3;

use super::pose::{Motion, MotionInfo, Pose};
use crate::error::KinematicsError;

/// 体幹以外の関節回転パラメータ数 (21関節 × axis-angle)
pub const BODY_POSE_LEN: usize = 63;

/// 1フレーム分の入力パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParameters {
    /// ルート回転 (axis-angle)
    pub global_orientation: [f64; 3],
    /// 関節1..=21 の回転 (axis-angle を連結)
    pub body_pose: [f64; BODY_POSE_LEN],
    pub translation: [f64; 3],
}

impl FrameParameters {
    pub fn rest() -> Self {
        Self {
            global_orientation: [0.0; 3],
            body_pose: [0.0; BODY_POSE_LEN],
            translation: [0.0; 3],
        }
    }
}

/// データセット1本分の生パラメータ列
#[derive(Debug, Clone, Default)]
pub struct MotionParameters {
    pub frame_rate: f64,
    pub root_orient: Vec<[f64; 3]>,
    pub pose_body: Vec<[f64; BODY_POSE_LEN]>,
    pub trans: Vec<[f64; 3]>,
}

impl MotionParameters {
    pub fn num_frames(&self) -> usize {
        self.root_orient.len()
    }

    pub fn frame(&self, i: usize) -> Option<FrameParameters> {
        Some(FrameParameters {
            global_orientation: *self.root_orient.get(i)?,
            body_pose: *self.pose_body.get(i)?,
            translation: *self.trans.get(i)?,
        })
    }

    fn check_shape(&self) -> Result<(), KinematicsError> {
        let n = self.root_orient.len();
        if self.pose_body.len() != n || self.trans.len() != n {
            return Err(KinematicsError::parameter_shape(format!(
                "root_orient has {} frames, pose_body {}, trans {}",
                n,
                self.pose_body.len(),
                self.trans.len()
            )));
        }
        Ok(())
    }
}

/// 体モデル評価器
pub trait PoseProvider {
    /// パラメータから (関節位置, メッシュ頂点) を返す
    fn evaluate(
        &self,
        params: &FrameParameters,
    ) -> anyhow::Result<(Vec<Point3<f64>>, Vec<Point3<f64>>)>;
}

impl Motion {
    /// 全フレームを評価してモーションを構築する
    pub fn load(
        info: MotionInfo,
        params: &MotionParameters,
        provider: &dyn PoseProvider,
    ) -> anyhow::Result<Self> {
        params.check_shape()?;

        let mut poses = Vec::with_capacity(params.num_frames());
        for i in 0..params.num_frames() {
            let frame = params
                .frame(i)
                .ok_or_else(|| KinematicsError::parameter_shape(format!("frame {} missing", i)))?;
            let (joints, vertices) = provider
                .evaluate(&frame)
                .with_context(|| format!("{}: evaluating frame {}", info.name, i))?;
            poses.push(Pose::from_parts(i, joints, vertices)?);
        }

        Ok(Motion::new(info, params.frame_rate, poses)?)
    }
}

//! Error types for the kinematics core.
//!
//! Per-frame numeric edge cases (zero vectors, boundary frames) are not errors:
//! they surface as `None` from the engines. Only static configuration and
//! input-shape violations end up here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KinematicsError>;

#[derive(Debug, Error, PartialEq)]
pub enum KinematicsError {
    /// parent/child が関節数の範囲外
    #[error("joint {joint}: reference {index} is outside the joint range")]
    InvalidTopologyReference { joint: usize, index: usize },

    /// child の parent が自分を指していない
    #[error("joint {joint}: child {child} does not point back to it as parent")]
    TopologyMismatch { joint: usize, child: usize },

    /// ルート (parent なし) はちょうど1つ
    #[error("topology must have exactly one root, found {0}")]
    RootCount(usize),

    /// joint index と配列位置の不一致
    #[error("joint at slot {slot} declares index {index}")]
    IndexMismatch { slot: usize, index: usize },

    /// parent を辿ってもルートに着かない
    #[error("joint {joint}: parent chain forms a cycle")]
    Cycle { joint: usize },

    /// 評価結果の関節数が想定と異なる
    #[error("frame {frame}: expected {expected} joints, got {actual}")]
    PoseShape {
        frame: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid motion parameters: {0}")]
    ParameterShape(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

impl KinematicsError {
    pub fn parameter_shape(reason: impl Into<String>) -> Self {
        Self::ParameterShape(reason.into())
    }

    pub fn invalid_setting(reason: impl Into<String>) -> Self {
        Self::InvalidSetting(reason.into())
    }
}

use std::f64::consts::PI;

use nalgebra::{Isometry3, Matrix4, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

use crate::error::{KinematicsError, Result};

/// 矢印モデルの向き（Z軸方向に伸びる）
pub const REFERENCE_AXIS: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);

/// 太さ方向のスケール上限。これを超えると長さだけが伸びる
pub const MAX_RADIAL_SCALE: f64 = 1.5;

const CYLINDER_RADIUS: f64 = 0.007;
const CONE_RADIUS: f64 = 0.015;
const CYLINDER_HEIGHT: f64 = 0.1;
const CONE_HEIGHT: f64 = 0.04;

/// w がこれ以下なら反平行とみなす
const ANTIPARALLEL_EPS: f64 = 1e-12;

pub const ARROW_SIZE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;
pub const SMOOTHING_WINDOW_RANGE: std::ops::RangeInclusive<usize> = 1..=10;

/// 矢印種別ごとのユーザー設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserArrowSetting {
    pub enabled: bool,
    /// ベクトルの大きさを矢印サイズに反映するか
    pub scaling_enabled: bool,
    /// 1..=5
    pub arrow_size: u8,
    /// 1..=10
    pub smoothing_window_size: usize,
    /// RGBA
    pub color: [f32; 4],
}

impl UserArrowSetting {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            enabled: false,
            scaling_enabled: false,
            arrow_size: 1,
            smoothing_window_size: 1,
            color,
        }
    }

    pub fn set_arrow_size(&mut self, size: u8) -> Result<()> {
        if !ARROW_SIZE_RANGE.contains(&size) {
            return Err(KinematicsError::invalid_setting(format!(
                "arrow size {} outside {:?}",
                size, ARROW_SIZE_RANGE
            )));
        }
        self.arrow_size = size;
        Ok(())
    }

    pub fn set_smoothing_window_size(&mut self, size: usize) -> Result<()> {
        if !SMOOTHING_WINDOW_RANGE.contains(&size) {
            return Err(KinematicsError::invalid_setting(format!(
                "smoothing window {} outside {:?}",
                size, SMOOTHING_WINDOW_RANGE
            )));
        }
        self.smoothing_window_size = size;
        Ok(())
    }

    /// 矢印のスケール係数
    pub fn scale(&self, scaling_factor: f64) -> ArrowScale {
        ArrowScale::new(self.arrow_size as f64, scaling_factor, self.scaling_enabled)
    }
}

/// 太さ・長さで独立したスケール
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowScale {
    /// 円柱半径・円錐半径・円錐高さ用（上限あり）
    pub radial: f64,
    /// 円柱の長さ用（上限なし）
    pub length: f64,
}

impl ArrowScale {
    pub fn new(arrow_size: f64, scaling_factor: f64, scaling_enabled: bool) -> Self {
        let base = if scaling_enabled {
            arrow_size * scaling_factor
        } else {
            arrow_size
        };
        Self {
            radial: base.min(MAX_RADIAL_SCALE),
            length: base,
        }
    }
}

/// スケール適用後の矢印寸法
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGeometry {
    pub cylinder_radius: f64,
    pub cone_radius: f64,
    pub cylinder_height: f64,
    pub cone_height: f64,
}

impl ArrowGeometry {
    pub fn from_scale(scale: &ArrowScale) -> Self {
        Self {
            cylinder_radius: CYLINDER_RADIUS * scale.radial,
            cone_radius: CONE_RADIUS * scale.radial,
            cylinder_height: CYLINDER_HEIGHT * scale.length,
            cone_height: CONE_HEIGHT * scale.radial,
        }
    }

    pub fn total_length(&self) -> f64 {
        self.cylinder_height + self.cone_height
    }
}

/// 矢印の配置（回転 + 平行移動 + スケール）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowPlacement {
    pub rotation: UnitQuaternion<f64>,
    pub origin: Point3<f64>,
    pub scale: ArrowScale,
    pub geometry: ArrowGeometry,
}

impl ArrowPlacement {
    /// 回転してから origin へ移動する同次変換
    pub fn transform(&self) -> Matrix4<f64> {
        Isometry3::from_parts(Translation3::from(self.origin.coords), self.rotation)
            .to_homogeneous()
    }

    /// 矢印の向き（単位ベクトル）
    pub fn direction(&self) -> Vector3<f64> {
        self.rotation * REFERENCE_AXIS
    }

    /// 矢じりの先端位置
    pub fn tip(&self) -> Point3<f64> {
        self.origin + self.direction() * self.geometry.total_length()
    }
}

/// REFERENCE_AXIS を direction に重ねる回転
///
/// 半角クォータニオン q = normalize([|a||d| + a·d, a×d]) を使う。direction が
/// REFERENCE_AXIS と真逆のときは軸が不定になるので、X軸まわりの180度回転を返す。
/// direction がゼロ・非有限なら None。
pub fn rotation_to(direction: &Vector3<f64>) -> Option<UnitQuaternion<f64>> {
    let norm = direction.norm();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    let d = direction / norm;
    let a = REFERENCE_AXIS;

    let v = a.cross(&d);
    let w = (a.norm_squared() * d.norm_squared()).sqrt() + a.dot(&d);
    if w <= ANTIPARALLEL_EPS {
        return Some(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI));
    }

    Some(UnitQuaternion::from_quaternion(Quaternion::new(w, v.x, v.y, v.z)))
}

/// start から vector 方向に向く矢印の配置を求める
pub fn solve_arrow(
    start: &Point3<f64>,
    vector: &Vector3<f64>,
    setting: &UserArrowSetting,
    scaling_factor: f64,
) -> Option<ArrowPlacement> {
    let rotation = rotation_to(vector)?;
    let scale = setting.scale(scaling_factor);
    Some(ArrowPlacement {
        rotation,
        origin: *start,
        scale,
        geometry: ArrowGeometry::from_scale(&scale),
    })
}

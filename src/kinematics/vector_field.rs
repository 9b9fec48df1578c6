//! Windowed velocity / acceleration vectors per joint for a single frame.
//!
//! Both engines return `None` when the frame has no following transition
//! (`frame >= num_frames - 1`). Inside the returned field a joint is absent
//! when its vector is exactly zero or contains NaN.

use nalgebra::Vector3;

use crate::motion::Motion;
use crate::skeleton::JOINT_COUNT;

/// 1関節分のベクトルと表示スケール
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub vector: Vector3<f64>,
    pub magnitude: f64,
    /// magnitude / モーションごとの基準最大値
    pub scaling_factor: f64,
}

/// 全関節分のベクトル場
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    pub samples: [Option<FieldSample>; JOINT_COUNT],
}

impl VectorField {
    fn from_vectors(vectors: &[Vector3<f64>; JOINT_COUNT], reference_max: f64) -> Self {
        let samples = std::array::from_fn(|j| {
            let vector = vectors[j];
            if is_absent(&vector) {
                return None;
            }
            let magnitude = vector.norm();
            Some(FieldSample {
                vector,
                magnitude,
                scaling_factor: magnitude / reference_max,
            })
        });
        Self { samples }
    }

    fn absent() -> Self {
        Self { samples: [None; JOINT_COUNT] }
    }

    pub fn get(&self, joint: usize) -> Option<&FieldSample> {
        self.samples.get(joint).and_then(|s| s.as_ref())
    }

    /// 有効なサンプルの (関節, サンプル) 列
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FieldSample)> {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(j, s)| s.as_ref().map(|s| (j, s)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 全成分が厳密に0、または NaN を含むベクトルは描画しない
pub fn is_absent(v: &Vector3<f64>) -> bool {
    v.iter().all(|&c| c == 0.0) || v.iter().any(|c| c.is_nan())
}

/// 窓の開始 (frame - floor(w/2), 0で打ち切り)
fn window_start(frame: usize, window_size: usize) -> usize {
    frame.saturating_sub(window_size / 2)
}

/// 平滑化した速度ベクトル場
///
/// [start, end) の関節位置平均を tail、1フレーム後ろにずらした平均を head とし、
/// その差をフレームレート倍する。平均の分母はサンプル数ではなく window_size
/// （シーケンス端では大きさが小さめに出る）。
pub fn velocity_field(motion: &Motion, frame: usize, window_size: usize) -> Option<VectorField> {
    if !motion.has_transition(frame) {
        return None;
    }
    let n = motion.num_frames();
    let window_size = window_size.max(1);
    let start = window_start(frame, window_size);
    let end = (n - 1).min(frame + window_size.div_ceil(2));

    let poses = motion.poses();
    let mut tail = [Vector3::zeros(); JOINT_COUNT];
    let mut head = [Vector3::zeros(); JOINT_COUNT];
    for j in start..end {
        for k in 0..JOINT_COUNT {
            tail[k] += poses[j].joints[k].coords;
            head[k] += poses[j + 1].joints[k].coords;
        }
    }

    let denom = window_size as f64;
    let vectors: [Vector3<f64>; JOINT_COUNT] =
        std::array::from_fn(|k| (head[k] / denom - tail[k] / denom) * motion.frame_rate);

    Some(VectorField::from_vectors(&vectors, motion.info.max_velocity))
}

/// 平滑化した加速度ベクトル場
///
/// 窓内の瞬間速度列を作り、その隣接差分（×フレームレート）の平均をとる。
pub fn acceleration_field(
    motion: &Motion,
    frame: usize,
    window_size: usize,
) -> Option<VectorField> {
    if !motion.has_transition(frame) {
        return None;
    }
    let n = motion.num_frames();
    let window_size = window_size.max(1);
    let start = window_start(frame, window_size);
    let end = (n - 1).min(frame + window_size.div_ceil(2) + 1);

    let poses = motion.poses();
    let fr = motion.frame_rate;
    let velocities: Vec<[Vector3<f64>; JOINT_COUNT]> = (start..end)
        .map(|j| std::array::from_fn(|k| (poses[j + 1].joints[k] - poses[j].joints[k]) * fr))
        .collect();

    // 差分が1つも取れない窓（末尾直前 + 窓幅1）は全関節欠損
    if velocities.len() < 2 {
        return Some(VectorField::absent());
    }

    let mut sum = [Vector3::zeros(); JOINT_COUNT];
    for pair in velocities.windows(2) {
        for k in 0..JOINT_COUNT {
            sum[k] += (pair[1][k] - pair[0][k]) * fr;
        }
    }
    let count = (velocities.len() - 1) as f64;
    let vectors: [Vector3<f64>; JOINT_COUNT] = std::array::from_fn(|k| sum[k] / count);

    Some(VectorField::from_vectors(&vectors, motion.info.max_acceleration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{walking_cycle, MotionInfo, Pose, ProceduralBody};
    use crate::skeleton::JointIndex;
    use nalgebra::Point3;

    fn approx_eq_v(a: &Vector3<f64>, b: &Vector3<f64>, eps: f64) -> bool {
        (a - b).norm() < eps
    }

    /// 全関節が同じ軌跡 x(t) を辿るモーション
    fn uniform_motion(xs: &[f64], frame_rate: f64) -> Motion {
        let poses = xs
            .iter()
            .map(|&x| Pose::new([Point3::new(x, 0.0, 0.0); JOINT_COUNT], Vec::new()))
            .collect();
        Motion::new(MotionInfo::new("uniform", 2.0, 100.0), frame_rate, poses).unwrap()
    }

    fn walking_motion() -> Motion {
        Motion::load(
            MotionInfo::new("Walking", 5.7, 222.7),
            &walking_cycle(60, 30.0),
            &ProceduralBody::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_window_one_is_forward_difference() {
        let motion = walking_motion();
        let poses = motion.poses();
        for frame in [0, 10, 30, 58] {
            let field = velocity_field(&motion, frame, 1).unwrap();
            for (k, sample) in field.iter() {
                let expected = (poses[frame + 1].joints[k] - poses[frame].joints[k]) * 30.0;
                assert!(approx_eq_v(&sample.vector, &expected, 1e-9));
            }
        }
    }

    #[test]
    fn test_boundary_frames_return_none() {
        let motion = walking_motion();
        let n = motion.num_frames();
        for frame in [n - 1, n, n + 5, usize::MAX] {
            assert!(velocity_field(&motion, frame, 3).is_none());
            assert!(acceleration_field(&motion, frame, 3).is_none());
        }
    }

    #[test]
    fn test_velocity_fixed_denominator_at_start() {
        // x = 0, 1, 2, ... の等速運動 (1 unit/frame)
        let motion = uniform_motion(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 10.0);

        // 中央: 窓 [1, 4) の3ペア / 3 → 真の速度 10
        let mid = velocity_field(&motion, 2, 3).unwrap();
        assert!(approx_eq_v(&mid.get(0).unwrap().vector, &Vector3::new(10.0, 0.0, 0.0), 1e-9));

        // 先頭: 窓 [0, 2) の2ペアしかないが分母は3 → 2/3 倍に縮む
        let edge = velocity_field(&motion, 0, 3).unwrap();
        let expected = Vector3::new(10.0 * 2.0 / 3.0, 0.0, 0.0);
        assert!(approx_eq_v(&edge.get(0).unwrap().vector, &expected, 1e-9));
    }

    #[test]
    fn test_velocity_scaling_factor() {
        let motion = uniform_motion(&[0.0, 0.1, 0.2, 0.3], 10.0);
        let field = velocity_field(&motion, 1, 1).unwrap();
        let s = field.get(5).unwrap();
        assert!((s.magnitude - 1.0).abs() < 1e-9);
        // max_velocity = 2.0
        assert!((s.scaling_factor - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_static_joints_absent() {
        let motion = uniform_motion(&[1.0, 1.0, 1.0, 1.0], 30.0);
        let field = velocity_field(&motion, 1, 2).unwrap();
        assert!(field.is_empty());
        let field = acceleration_field(&motion, 1, 2).unwrap();
        assert!(field.is_empty());
    }

    #[test]
    fn test_acceleration_constant() {
        // x = t^2 / 2 (単位: フレーム) → 加速度 1 unit/frame^2 = fr^2 units/s^2
        let xs: Vec<f64> = (0..8).map(|i| 0.5 * (i * i) as f64).collect();
        let motion = uniform_motion(&xs, 10.0);
        for window in [1, 2, 3, 4] {
            let field = acceleration_field(&motion, 3, window).unwrap();
            let s = field.get(JointIndex::LeftWrist as usize).unwrap();
            assert!(
                approx_eq_v(&s.vector, &Vector3::new(100.0, 0.0, 0.0), 1e-6),
                "window {}",
                window
            );
            assert!((s.scaling_factor - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_acceleration_single_velocity_window_absent() {
        let xs: Vec<f64> = (0..5).map(|i| (i * i) as f64).collect();
        let motion = uniform_motion(&xs, 10.0);
        // frame = n-2, 窓幅1: 速度が1本しか取れない
        let field = acceleration_field(&motion, 3, 1).unwrap();
        assert!(field.is_empty());
        // 窓幅2なら start が1つ前に広がる
        let field = acceleration_field(&motion, 3, 2).unwrap();
        assert!(!field.is_empty());
    }

    #[test]
    fn test_zero_window_treated_as_one() {
        let motion = walking_motion();
        assert_eq!(velocity_field(&motion, 5, 0), velocity_field(&motion, 5, 1));
    }

    #[test]
    fn test_is_absent() {
        assert!(is_absent(&Vector3::zeros()));
        assert!(is_absent(&Vector3::new(1.0, f64::NAN, 0.0)));
        assert!(!is_absent(&Vector3::new(0.0, 0.0, 1e-300)));
    }

    #[test]
    fn test_end_to_end_left_hip_speed() {
        // Pelvis 固定、Left Hip が +x に 0.3/frame、30fps
        let poses = (0..3)
            .map(|i| {
                let mut joints = [Point3::origin(); JOINT_COUNT];
                joints[JointIndex::LeftHip as usize] = Point3::new(0.3 * i as f64, -0.1, 0.0);
                joints[JointIndex::LeftKnee as usize] = Point3::new(0.3 * i as f64, -0.5, 0.0);
                Pose::new(joints, Vec::new())
            })
            .collect();
        let motion = Motion::new(MotionInfo::new("e2e", 9.0, 100.0), 30.0, poses).unwrap();

        let field = velocity_field(&motion, 1, 1).unwrap();
        let hip = field.get(JointIndex::LeftHip as usize).unwrap();
        assert!((hip.magnitude - 9.0).abs() < 1e-9);
        assert!((hip.scaling_factor - 1.0).abs() < 1e-9);
        assert!(field.get(JointIndex::Pelvis as usize).is_none());
    }
}

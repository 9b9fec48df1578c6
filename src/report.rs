//! Per-joint time series handed to the chart renderer.

use ndarray::Array2;

use crate::kinematics::JointAngleData;
use crate::skeleton::{Joint, JointSelection};

/// 1関節分の時系列
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub joint: usize,
    pub name: &'static str,
    pub color: Option<&'static str>,
    pub values: Vec<f64>,
}

/// 角度・角速度・角加速度の3パネル分
#[derive(Debug, Clone, PartialEq)]
pub struct AngleReport {
    pub frames: usize,
    pub angles: Vec<Series>,
    pub velocities: Vec<Series>,
    pub accelerations: Vec<Series>,
}

impl AngleReport {
    /// 角度を持ち、かつ選択されている関節だけを関節番号順に並べる
    pub fn build(data: &JointAngleData, joints: &[Joint], selection: &JointSelection) -> Self {
        let included: Vec<&Joint> = joints
            .iter()
            .filter(|j| j.has_angle() && selection.is_checked(j.index))
            .collect();

        let series = |table: &Array2<f64>| -> Vec<Series> {
            included
                .iter()
                .map(|j| Series {
                    joint: j.index,
                    name: j.name,
                    color: j.color,
                    values: table.row(j.index).to_vec(),
                })
                .collect()
        };

        Self {
            frames: data.num_frames(),
            angles: series(&data.angles),
            velocities: series(&data.angular_velocities),
            accelerations: series(&data.angular_accelerations),
        }
    }

    pub fn joint_count(&self) -> usize {
        self.angles.len()
    }

    /// 角度の (最小, 最大)
    pub fn angle_range(&self, joint: usize) -> Option<(f64, f64)> {
        let series = self.angles.iter().find(|s| s.joint == joint)?;
        series.values.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{walking_cycle, Motion, MotionInfo, ProceduralBody};
    use crate::skeleton::{JointIndex, JOINTS};

    fn walking_data() -> JointAngleData {
        let motion = Motion::load(
            MotionInfo::new("Walking", 5.7, 222.7),
            &walking_cycle(40, 30.0),
            &ProceduralBody::new(),
        )
        .unwrap();
        JointAngleData::compute(&motion, &JOINTS)
    }

    #[test]
    fn test_only_angle_joints() {
        let data = walking_data();
        let report = AngleReport::build(&data, &JOINTS, &JointSelection::all());
        assert_eq!(report.frames, 40);
        assert_eq!(report.joint_count(), 18);
        assert_eq!(report.velocities.len(), 18);
        assert_eq!(report.accelerations.len(), 18);
        assert!(report.angles.iter().all(|s| s.values.len() == 40));
        // ルート・末端は含まない
        assert!(report.angles.iter().all(|s| s.joint != JointIndex::Pelvis as usize));
        assert!(report.angles.iter().all(|s| s.joint != JointIndex::Head as usize));
        assert!(report.angles.windows(2).all(|w| w[0].joint < w[1].joint));
    }

    #[test]
    fn test_selection_filters() {
        let data = walking_data();
        let mut selection = JointSelection::all();
        selection.set(JointIndex::LeftKnee, false);
        let report = AngleReport::build(&data, &JOINTS, &selection);
        assert_eq!(report.joint_count(), 17);
        assert!(report.angles.iter().all(|s| s.joint != JointIndex::LeftKnee as usize));

        selection.set_all(false);
        let report = AngleReport::build(&data, &JOINTS, &selection);
        assert_eq!(report.joint_count(), 0);
    }

    #[test]
    fn test_series_matches_table() {
        let data = walking_data();
        let report = AngleReport::build(&data, &JOINTS, &JointSelection::all());
        let knee = JointIndex::RightKnee as usize;
        let series = report.angles.iter().find(|s| s.joint == knee).unwrap();
        assert_eq!(series.name, JOINTS[knee].name);
        assert_eq!(series.values, data.angles.row(knee).to_vec());

        let (lo, hi) = report.angle_range(knee).unwrap();
        assert!(lo <= hi);
        assert!(report.angle_range(JointIndex::Pelvis as usize).is_none());
    }
}

use crate::error::{KinematicsError, Result};

/// 関節数 (22主要関節 + 左右の手先)
pub const JOINT_COUNT: usize = 24;

/// SMPL-X 順の関節インデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointIndex {
    Pelvis = 0,
    LeftHip = 1,
    RightHip = 2,
    Spine1 = 3,
    LeftKnee = 4,
    RightKnee = 5,
    Spine2 = 6,
    LeftAnkle = 7,
    RightAnkle = 8,
    Spine3 = 9,
    LeftFoot = 10,
    RightFoot = 11,
    Neck = 12,
    LeftCollar = 13,
    RightCollar = 14,
    Head = 15,
    LeftShoulder = 16,
    RightShoulder = 17,
    LeftElbow = 18,
    RightElbow = 19,
    LeftWrist = 20,
    RightWrist = 21,
    LeftHand = 22,
    RightHand = 23,
}

impl JointIndex {
    pub const COUNT: usize = JOINT_COUNT;

    pub fn from_index(index: usize) -> Option<Self> {
        use JointIndex::*;
        const ALL: [JointIndex; JOINT_COUNT] = [
            Pelvis, LeftHip, RightHip, Spine1, LeftKnee, RightKnee, Spine2, LeftAnkle,
            RightAnkle, Spine3, LeftFoot, RightFoot, Neck, LeftCollar, RightCollar, Head,
            LeftShoulder, RightShoulder, LeftElbow, RightElbow, LeftWrist, RightWrist,
            LeftHand, RightHand,
        ];
        ALL.get(index).copied()
    }

    pub fn joint(self) -> &'static Joint {
        &JOINTS[self as usize]
    }
}

/// 骨格ツリーの静的な関節定義
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub name: &'static str,
    pub index: usize,
    /// ルートのみ None
    pub parent: Option<usize>,
    /// 手先・足先・頭は None
    pub child: Option<usize>,
    /// 無変形とみなす角度（度）
    pub reference_angle: Option<f64>,
    /// 表示色 (#RRGGBB)
    pub color: Option<&'static str>,
}

impl Joint {
    const fn new(
        name: &'static str,
        index: usize,
        parent: Option<usize>,
        child: Option<usize>,
        reference_angle: Option<f64>,
        color: Option<&'static str>,
    ) -> Self {
        Self { name, index, parent, child, reference_angle, color }
    }

    /// 親・子の両方を持ち、角度が定義される関節か
    pub fn has_angle(&self) -> bool {
        self.parent.is_some() && self.child.is_some()
    }
}

pub const JOINTS: [Joint; JOINT_COUNT] = [
    Joint::new("Pelvis", 0, None, None, None, None),
    Joint::new("Left Hip", 1, Some(0), Some(4), Some(26.0), Some("#FFD740")),
    Joint::new("Right Hip", 2, Some(0), Some(5), Some(25.0), Some("#BA68C8")),
    Joint::new("Spine1", 3, Some(0), Some(6), Some(13.0), Some("#FF5252")),
    Joint::new("Left Knee", 4, Some(1), Some(7), Some(15.0), Some("#FFFF00")),
    Joint::new("Right Knee", 5, Some(2), Some(8), Some(9.0), Some("#B388FF")),
    Joint::new("Spine2", 6, Some(3), Some(9), Some(34.0), Some("#FF8A80")),
    Joint::new("Left Ankle", 7, Some(4), Some(10), Some(72.0), Some("#FFF176")),
    Joint::new("Right Ankle", 8, Some(5), Some(11), Some(68.0), Some("#E1BEE7")),
    Joint::new("Spine3", 9, Some(6), Some(12), Some(40.0), Some("#FF80AB")),
    Joint::new("Left Foot", 10, Some(7), None, None, None),
    Joint::new("Right Foot", 11, Some(8), None, None, None),
    Joint::new("Neck", 12, Some(9), Some(15), Some(22.0), Some("#F8BBD0")),
    Joint::new("Left Collar", 13, Some(9), Some(16), Some(35.0), Some("#2979FF")),
    Joint::new("Right Collar", 14, Some(9), Some(17), Some(33.0), Some("#00BFA5")),
    Joint::new("Head", 15, Some(12), None, None, None),
    Joint::new("Left Shoulder", 16, Some(13), Some(18), Some(41.0), Some("#00B0FF")),
    Joint::new("Right Shoulder", 17, Some(14), Some(19), Some(35.0), Some("#00E676")),
    Joint::new("Left Elbow", 18, Some(16), Some(20), Some(23.0), Some("#00E5FF")),
    Joint::new("Right Elbow", 19, Some(17), Some(21), Some(7.0), Some("#76FF03")),
    Joint::new("Left Wrist", 20, Some(18), Some(22), Some(41.0), Some("#90CAF9")),
    Joint::new("Right Wrist", 21, Some(19), Some(23), Some(43.0), Some("#B2FF59")),
    Joint::new("Left Hand", 22, Some(20), None, None, None),
    Joint::new("Right Hand", 23, Some(21), None, None, None),
];

/// トポロジの静的整合性チェック
///
/// - index が配列位置と一致
/// - parent/child が範囲内
/// - child の parent が自分
/// - ルートがちょうど1つ
/// - parent を辿ると必ずルートに着く（循環なし）
pub fn validate_topology(joints: &[Joint]) -> Result<()> {
    let n = joints.len();

    // 1パス目: 添字の範囲だけを見る
    for (slot, joint) in joints.iter().enumerate() {
        if joint.index != slot {
            return Err(KinematicsError::IndexMismatch { slot, index: joint.index });
        }
        for reference in [joint.parent, joint.child].into_iter().flatten() {
            if reference >= n {
                return Err(KinematicsError::InvalidTopologyReference {
                    joint: slot,
                    index: reference,
                });
            }
        }
    }

    // 2パス目: 全添字が範囲内なので joints[c] は安全
    for (slot, joint) in joints.iter().enumerate() {
        if let Some(c) = joint.child {
            if joints[c].parent != Some(slot) {
                return Err(KinematicsError::TopologyMismatch { joint: slot, child: c });
            }
        }
    }

    let roots = joints.iter().filter(|j| j.parent.is_none()).count();
    if roots != 1 {
        return Err(KinematicsError::RootCount(roots));
    }

    // n 回以内にルートに到達しなければループしている
    for (slot, joint) in joints.iter().enumerate() {
        let mut cursor = joint.parent;
        let mut steps = 0;
        while let Some(p) = cursor {
            steps += 1;
            if steps > n {
                return Err(KinematicsError::Cycle { joint: slot });
            }
            cursor = joints[p].parent;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_topology_is_valid() {
        assert_eq!(validate_topology(&JOINTS), Ok(()));
    }

    #[test]
    fn test_joint_index_from_index() {
        assert_eq!(JointIndex::from_index(0), Some(JointIndex::Pelvis));
        assert_eq!(JointIndex::from_index(23), Some(JointIndex::RightHand));
        assert_eq!(JointIndex::from_index(24), None);
        for i in 0..JOINT_COUNT {
            assert_eq!(JointIndex::from_index(i).unwrap() as usize, i);
        }
    }

    #[test]
    fn test_joint_lookup() {
        let knee = JointIndex::LeftKnee.joint();
        assert_eq!(knee.name, "Left Knee");
        assert_eq!(knee.parent, Some(JointIndex::LeftHip as usize));
        assert_eq!(knee.child, Some(JointIndex::LeftAnkle as usize));
        assert!(knee.has_angle());
        assert!(!JointIndex::Pelvis.joint().has_angle());
        assert!(!JointIndex::Head.joint().has_angle());
    }

    #[test]
    fn test_angle_joints_count() {
        // 末端 (足先×2, 頭, 手先×2) とルートを除いた18関節
        assert_eq!(JOINTS.iter().filter(|j| j.has_angle()).count(), 18);
    }

    #[test]
    fn test_child_out_of_range() {
        let mut joints = JOINTS;
        joints[4].child = Some(99);
        assert_eq!(
            validate_topology(&joints),
            Err(KinematicsError::InvalidTopologyReference { joint: 4, index: 99 })
        );
    }

    #[test]
    fn test_parent_out_of_range() {
        let mut joints = JOINTS;
        joints[10].parent = Some(30);
        assert_eq!(
            validate_topology(&joints),
            Err(KinematicsError::InvalidTopologyReference { joint: 10, index: 30 })
        );
    }

    #[test]
    fn test_child_not_pointing_back() {
        let mut joints = JOINTS;
        // Left Hip の子を Right Knee にする (Right Knee の親は Right Hip)
        joints[1].child = Some(5);
        assert_eq!(
            validate_topology(&joints),
            Err(KinematicsError::TopologyMismatch { joint: 1, child: 5 })
        );
    }

    #[test]
    fn test_multiple_roots() {
        let mut joints = JOINTS;
        joints[3].parent = None;
        joints[0].child = None;
        assert_eq!(validate_topology(&joints), Err(KinematicsError::RootCount(2)));
    }

    #[test]
    fn test_index_mismatch() {
        let mut joints = JOINTS;
        joints[7].index = 8;
        assert_eq!(
            validate_topology(&joints),
            Err(KinematicsError::IndexMismatch { slot: 7, index: 8 })
        );
    }

    #[test]
    fn test_cycle_detected() {
        let mut joints = JOINTS;
        // Pelvis -> Left Hip を親にして循環させ、代わりに Head をルート化
        joints[0].parent = Some(1);
        joints[15].parent = None;
        joints[12].child = None;
        assert_eq!(validate_topology(&joints), Err(KinematicsError::Cycle { joint: 0 }));
    }

    #[test]
    fn test_range_error_wins_over_earlier_mismatch() {
        let mut joints = JOINTS;
        // slot 1 の逆リンク不整合より slot 20 の範囲外 child を先に報告する
        joints[1].child = Some(5);
        joints[20].child = Some(24);
        assert_eq!(
            validate_topology(&joints),
            Err(KinematicsError::InvalidTopologyReference { joint: 20, index: 24 })
        );
    }
}

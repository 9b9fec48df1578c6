use super::topology::{JointIndex, JOINT_COUNT};

/// レポート対象選択用の部位グループ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointGroup {
    Torso,
    RightArm,
    LeftArm,
    RightLeg,
    LeftLeg,
}

impl JointGroup {
    pub const ALL: [JointGroup; 5] = [
        JointGroup::Torso,
        JointGroup::RightArm,
        JointGroup::LeftArm,
        JointGroup::RightLeg,
        JointGroup::LeftLeg,
    ];

    pub fn label(self) -> &'static str {
        match self {
            JointGroup::Torso => "Torso",
            JointGroup::RightArm => "Right Arm",
            JointGroup::LeftArm => "Left Arm",
            JointGroup::RightLeg => "Right Leg",
            JointGroup::LeftLeg => "Left Leg",
        }
    }

    pub fn members(self) -> &'static [JointIndex] {
        use JointIndex::*;
        match self {
            JointGroup::Torso => &[Neck, Spine3, Spine2, Spine1],
            JointGroup::RightArm => &[RightCollar, RightShoulder, RightElbow, RightWrist],
            JointGroup::LeftArm => &[LeftCollar, LeftShoulder, LeftElbow, LeftWrist],
            JointGroup::RightLeg => &[RightHip, RightKnee, RightAnkle],
            JointGroup::LeftLeg => &[LeftHip, LeftKnee, LeftAnkle],
        }
    }

    pub fn of(joint: JointIndex) -> Option<JointGroup> {
        Self::ALL.into_iter().find(|g| g.members().contains(&joint))
    }
}

/// 関節ごとの選択状態（レポートに含めるか）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointSelection {
    checked: [bool; JOINT_COUNT],
}

/// チェックボックス階層の派生状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupStates {
    pub groups: [(JointGroup, bool); 5],
    pub all: bool,
}

impl GroupStates {
    pub fn get(&self, group: JointGroup) -> bool {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map_or(false, |(_, on)| *on)
    }
}

impl JointSelection {
    pub fn all() -> Self {
        Self { checked: [true; JOINT_COUNT] }
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, joint: JointIndex, on: bool) {
        self.checked[joint as usize] = on;
    }

    pub fn toggle(&mut self, joint: JointIndex) {
        let i = joint as usize;
        self.checked[i] = !self.checked[i];
    }

    /// グループの全関節をまとめて設定
    pub fn set_group(&mut self, group: JointGroup, on: bool) {
        for &j in group.members() {
            self.set(j, on);
        }
    }

    /// 全グループの関節をまとめて設定
    pub fn set_all(&mut self, on: bool) {
        for group in JointGroup::ALL {
            self.set_group(group, on);
        }
    }

    /// 関節の選択状態からグループ・全選択の状態を導出する
    pub fn group_states(&self) -> GroupStates {
        let groups = JointGroup::ALL.map(|g| {
            let on = g.members().iter().all(|&j| self.checked[j as usize]);
            (g, on)
        });
        let all = groups.iter().all(|(_, on)| *on);
        GroupStates { groups, all }
    }
}

impl Default for JointSelection {
    fn default() -> Self {
        Self::all()
    }
}

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::Result;
use crate::kinematics::{acceleration_field, velocity_field, AngleWorker, JointAngleData};
use crate::log;
use crate::logging::Logger;
use crate::motion::Motion;
use crate::render::arrow::UserArrowSetting;
use crate::render::scene::{
    draw_arrows, draw_mesh, hide_mesh, remove_arrows, ArrowKind, MeshState, SceneSink,
};
use crate::report::AngleReport;
use crate::skeleton::{
    validate_topology, GroupStates, JointGroup, JointIndex, JointSelection, JOINTS,
};

use super::scheduler::{AnimationState, PlaybackScheduler, StopReason, TickPlan};

/// tick の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// ループが動いていない
    Idle,
    /// 描画してフレームを進めた
    Stepped { frame: usize },
    /// ループが終了した
    Stopped { frame: usize, reason: StopReason },
}

/// 再生中のモーションとユーザー操作を束ねる
///
/// フレーム番号・再生状態・角度キャッシュはすべてこの構造体が持ち、
/// `&mut self` を通してのみ変更される。
pub struct MotionSession {
    motion: Arc<Motion>,
    /// モーション切り替えごとに増える
    generation: u64,
    angle_data: JointAngleData,
    worker: Option<AngleWorker>,
    current_frame: usize,
    scheduler: PlaybackScheduler,
    velocity: UserArrowSetting,
    acceleration: UserArrowSetting,
    mesh_state: MeshState,
    joint_size: u8,
    selection: JointSelection,
    logger: Logger,
}

impl MotionSession {
    /// 関節トポロジーが壊れていればエラー
    pub fn new(motion: Motion, config: &Config, logger: Logger) -> Result<Self> {
        validate_topology(&JOINTS)?;
        let num_frames = motion.num_frames();
        log!(
            logger,
            "[session] motion '{}' ({} frames @ {} fps)",
            motion.name(),
            num_frames,
            motion.frame_rate
        );
        Ok(Self {
            motion: Arc::new(motion),
            generation: 0,
            angle_data: JointAngleData::empty(num_frames),
            worker: None,
            current_frame: 0,
            scheduler: PlaybackScheduler::new(),
            velocity: config.arrow_setting(ArrowKind::Velocity),
            acceleration: config.arrow_setting(ArrowKind::Acceleration),
            mesh_state: config.display.mesh,
            joint_size: config.joint_size(),
            selection: JointSelection::all(),
            logger,
        })
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn state(&self) -> AnimationState {
        self.scheduler.state()
    }

    pub fn is_loop_active(&self) -> bool {
        self.scheduler.loop_active()
    }

    pub fn mesh_state(&self) -> MeshState {
        self.mesh_state
    }

    pub fn selection(&self) -> &JointSelection {
        &self.selection
    }

    pub fn arrow_setting(&self, kind: ArrowKind) -> &UserArrowSetting {
        match kind {
            ArrowKind::Velocity => &self.velocity,
            ArrowKind::Acceleration => &self.acceleration,
        }
    }

    fn arrow_setting_mut(&mut self, kind: ArrowKind) -> &mut UserArrowSetting {
        match kind {
            ArrowKind::Velocity => &mut self.velocity,
            ArrowKind::Acceleration => &mut self.acceleration,
        }
    }

    fn last_frame(&self) -> usize {
        self.motion.num_frames().saturating_sub(1)
    }

    /// 初回表示
    pub fn show(&self, scene: &mut dyn SceneSink) {
        draw_mesh(scene, &self.motion, self.current_frame, self.mesh_state, self.joint_size);
        if self.scheduler.is_paused() {
            self.draw_enabled_arrows(scene);
        }
    }

    /// モーションを差し替える
    ///
    /// 動いているループは打ち切り、キャッシュは空のテーブルに置き換える。
    pub fn switch_motion(&mut self, motion: Motion, scene: &mut dyn SceneSink) {
        if self.scheduler.cancel() {
            log!(self.logger, "[session] stepping loop cancelled at frame {}", self.current_frame);
        }
        self.worker = None;
        self.generation += 1;
        self.current_frame = 0;
        self.angle_data = JointAngleData::empty(motion.num_frames());
        self.motion = Arc::new(motion);
        log!(
            self.logger,
            "[session] switched to '{}' ({} frames @ {} fps, generation {})",
            self.motion.name(),
            self.motion.num_frames(),
            self.motion.frame_rate,
            self.generation
        );

        self.remove_all_arrows(scene);
        draw_mesh(scene, &self.motion, 0, self.mesh_state, self.joint_size);
    }

    /// フレームを移動。停止中なら描き直す
    pub fn seek(&mut self, frame: usize, scene: &mut dyn SceneSink) {
        self.current_frame = frame.min(self.last_frame());
        if self.scheduler.is_paused() {
            self.remove_all_arrows(scene);
            draw_mesh(scene, &self.motion, self.current_frame, self.mesh_state, self.joint_size);
            self.draw_enabled_arrows(scene);
        }
    }

    pub fn reset(&mut self, scene: &mut dyn SceneSink) {
        self.scheduler.pause();
        self.current_frame = 0;
        self.remove_all_arrows(scene);
        draw_mesh(scene, &self.motion, 0, self.mesh_state, self.joint_size);
    }

    /// 再生。新しくループを起こしたら true
    pub fn play(&mut self, scene: &mut dyn SceneSink) -> bool {
        self.remove_all_arrows(scene);
        let spawned = self.scheduler.play();
        if spawned {
            log!(self.logger, "[playback] play from frame {}", self.current_frame);
        }
        spawned
    }

    /// 逆再生。新しくループを起こしたら true
    pub fn reverse(&mut self, scene: &mut dyn SceneSink) -> bool {
        self.remove_all_arrows(scene);
        let spawned = self.scheduler.reverse();
        if spawned {
            log!(self.logger, "[playback] reverse from frame {}", self.current_frame);
        }
        spawned
    }

    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    /// ループを1ステップ進める
    pub fn tick(&mut self, scene: &mut dyn SceneSink) -> TickOutcome {
        let direction = match self.scheduler.plan_tick() {
            TickPlan::Idle => return TickOutcome::Idle,
            TickPlan::Stop(reason) => return self.stopped(reason),
            TickPlan::Step(direction) => direction,
        };

        self.draw_enabled_arrows(scene);
        draw_mesh(scene, &self.motion, self.current_frame, self.mesh_state, self.joint_size);

        let (next, reason) =
            self.scheduler.advance(self.current_frame, direction, self.motion.num_frames());
        self.current_frame = next;
        match reason {
            Some(reason) => self.stopped(reason),
            None => TickOutcome::Stepped { frame: next },
        }
    }

    fn stopped(&self, reason: StopReason) -> TickOutcome {
        log!(self.logger, "[playback] stopped at frame {} ({})", self.current_frame, reason);
        TickOutcome::Stopped { frame: self.current_frame, reason }
    }

    pub fn set_arrow_enabled(&mut self, kind: ArrowKind, enabled: bool, scene: &mut dyn SceneSink) {
        self.arrow_setting_mut(kind).enabled = enabled;
        if !enabled {
            remove_arrows(scene, kind);
        } else if self.scheduler.is_paused() {
            self.draw_arrow_kind(kind, scene);
        }
    }

    pub fn set_scaling_enabled(&mut self, kind: ArrowKind, enabled: bool) {
        self.arrow_setting_mut(kind).scaling_enabled = enabled;
    }

    pub fn set_arrow_size(&mut self, kind: ArrowKind, size: u8) -> Result<()> {
        self.arrow_setting_mut(kind).set_arrow_size(size)
    }

    pub fn set_smoothing_window(&mut self, kind: ArrowKind, size: usize) -> Result<()> {
        self.arrow_setting_mut(kind).set_smoothing_window_size(size)
    }

    pub fn set_arrow_color(&mut self, kind: ArrowKind, color: [f32; 4]) {
        self.arrow_setting_mut(kind).color = color;
    }

    pub fn set_mesh_state(&mut self, state: MeshState, scene: &mut dyn SceneSink) {
        self.mesh_state = state;
        if state == MeshState::Hidden {
            hide_mesh(scene);
        } else {
            draw_mesh(scene, &self.motion, self.current_frame, state, self.joint_size);
        }
    }

    /// 関節マーカーの大きさ (1..=5)。次の描画から反映
    pub fn set_joint_size(&mut self, size: u8) {
        self.joint_size = size.clamp(1, 5);
    }

    pub fn toggle_joint(&mut self, joint: JointIndex) -> GroupStates {
        self.selection.toggle(joint);
        self.selection.group_states()
    }

    pub fn set_group(&mut self, group: JointGroup, on: bool) -> GroupStates {
        self.selection.set_group(group, on);
        self.selection.group_states()
    }

    /// グループ全体の選択を反転
    pub fn toggle_group(&mut self, group: JointGroup) -> GroupStates {
        let on = !self.selection.group_states().get(group);
        self.set_group(group, on)
    }

    pub fn select_all(&mut self, on: bool) -> GroupStates {
        self.selection.set_all(on);
        self.selection.group_states()
    }

    pub fn group_states(&self) -> GroupStates {
        self.selection.group_states()
    }

    /// 角度テーブル。未計算ならここで同期計算する
    pub fn joint_angles(&mut self) -> &JointAngleData {
        if self.angle_data.is_empty() {
            if let Some(result) = self.worker.take().and_then(AngleWorker::wait) {
                self.install_angles(result.generation, result.data, result.elapsed);
            }
        }
        if self.angle_data.is_empty() {
            let started = Instant::now();
            let data = JointAngleData::compute(&self.motion, &JOINTS);
            self.install_angles(self.generation, data, started.elapsed());
        }
        &self.angle_data
    }

    /// 角度テーブルの計算をワーカースレッドに投げる
    pub fn spawn_angle_worker(&mut self) -> bool {
        if !self.angle_data.is_empty() || self.worker.is_some() {
            return false;
        }
        self.worker = Some(AngleWorker::spawn(self.motion.clone(), self.generation));
        log!(self.logger, "[angles] worker started (generation {})", self.generation);
        true
    }

    /// ワーカーの結果を取り込む。取り込んだら true
    ///
    /// 再生中は取り込まずに次回へ回す。
    pub fn poll_angle_worker(&mut self) -> bool {
        if !self.scheduler.is_paused() {
            return false;
        }
        let Some(result) = self.worker.as_ref().and_then(AngleWorker::try_take) else {
            return false;
        };
        self.worker = None;
        self.install_angles(result.generation, result.data, result.elapsed)
    }

    fn install_angles(
        &mut self,
        generation: u64,
        data: JointAngleData,
        elapsed: std::time::Duration,
    ) -> bool {
        if generation != self.generation {
            log!(
                self.logger,
                "[angles] dropped stale result (generation {} != {})",
                generation,
                self.generation
            );
            return false;
        }
        log!(
            self.logger,
            "[angles] {} frames x {} joints in {:.1}ms",
            data.num_frames(),
            JOINTS.iter().filter(|j| j.has_angle()).count(),
            elapsed.as_secs_f64() * 1000.0
        );
        self.angle_data = data;
        true
    }

    pub fn report(&mut self) -> AngleReport {
        let selection = self.selection;
        AngleReport::build(self.joint_angles(), &JOINTS, &selection)
    }

    fn remove_all_arrows(&self, scene: &mut dyn SceneSink) {
        for kind in ArrowKind::ALL {
            remove_arrows(scene, kind);
        }
    }

    fn draw_enabled_arrows(&self, scene: &mut dyn SceneSink) {
        for kind in ArrowKind::ALL {
            if self.arrow_setting(kind).enabled {
                self.draw_arrow_kind(kind, scene);
            }
        }
    }

    /// 前フレームの矢印を消してから描く。ベクトルのない関節には何も残らない
    fn draw_arrow_kind(&self, kind: ArrowKind, scene: &mut dyn SceneSink) {
        remove_arrows(scene, kind);
        let setting = self.arrow_setting(kind);
        let frame = self.current_frame;
        let window = setting.smoothing_window_size;
        let field = match kind {
            ArrowKind::Velocity => velocity_field(&self.motion, frame, window),
            ArrowKind::Acceleration => acceleration_field(&self.motion, frame, window),
        };
        let (Some(field), Some(pose)) = (field, self.motion.pose(frame)) else {
            return;
        };
        draw_arrows(scene, kind, &pose.joints, &field, setting);
    }
}

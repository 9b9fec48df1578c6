//! Playback state machine driven by an external tick source.
//!
//! At most one stepping loop is active at a time. Play/reverse while a loop is
//! already active only change the direction. A pause is observed at the start
//! of the next tick, never in the middle of one.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Paused,
    Playing,
    Reverse,
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnimationState::Paused => "Paused",
            AnimationState::Playing => "Playing",
            AnimationState::Reverse => "Reverse",
        };
        f.write_str(s)
    }
}

/// ループが止まった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// pause 要求を観測した
    Paused,
    /// 再生で最終フレームに到達
    ReachedEnd,
    /// 逆再生でフレーム0に到達
    ReachedStart,
    /// モーション切り替えなどで打ち切り
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Paused => "paused",
            StopReason::ReachedEnd => "reached last frame",
            StopReason::ReachedStart => "reached first frame",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// 1 tick で何をするか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPlan {
    /// ループが動いていない
    Idle,
    /// ループを止めた（この tick では描画しない）
    Stop(StopReason),
    /// 描画してから direction へ1フレーム進める
    Step(Direction),
}

#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    state: AnimationState,
    loop_active: bool,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == AnimationState::Paused
    }

    pub fn loop_active(&self) -> bool {
        self.loop_active
    }

    /// 再生。新しくループを起こしたら true
    pub fn play(&mut self) -> bool {
        self.start(AnimationState::Playing)
    }

    /// 逆再生。新しくループを起こしたら true
    pub fn reverse(&mut self) -> bool {
        self.start(AnimationState::Reverse)
    }

    fn start(&mut self, state: AnimationState) -> bool {
        self.state = state;
        if self.loop_active {
            return false;
        }
        self.loop_active = true;
        true
    }

    /// 停止要求。ループは次の tick で止まる
    pub fn pause(&mut self) {
        self.state = AnimationState::Paused;
    }

    /// ループを即座に打ち切る。動いていたら true
    pub fn cancel(&mut self) -> bool {
        self.state = AnimationState::Paused;
        std::mem::replace(&mut self.loop_active, false)
    }

    /// tick の先頭で呼ぶ
    pub fn plan_tick(&mut self) -> TickPlan {
        if !self.loop_active {
            return TickPlan::Idle;
        }
        match self.state {
            AnimationState::Paused => {
                self.loop_active = false;
                TickPlan::Stop(StopReason::Paused)
            }
            AnimationState::Playing => TickPlan::Step(Direction::Forward),
            AnimationState::Reverse => TickPlan::Step(Direction::Backward),
        }
    }

    /// 描画後にフレームを進め、終端なら自動で Paused に戻す
    ///
    /// 進めた後のフレームと、ループが終わった場合はその理由を返す。
    /// フレームは [0, num_frames - 1] に収める。
    pub fn advance(
        &mut self,
        frame: usize,
        direction: Direction,
        num_frames: usize,
    ) -> (usize, Option<StopReason>) {
        let last = num_frames.saturating_sub(1);
        let next = match direction {
            Direction::Forward => (frame + 1).min(last),
            Direction::Backward => frame.saturating_sub(1).min(last),
        };

        let reason = match self.state {
            AnimationState::Playing if next >= last => Some(StopReason::ReachedEnd),
            AnimationState::Reverse if next < 1 => Some(StopReason::ReachedStart),
            _ => None,
        };
        if reason.is_some() {
            self.state = AnimationState::Paused;
            self.loop_active = false;
        }
        (next, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 描画を省いた tick
    fn tick(s: &mut PlaybackScheduler, frame: &mut usize, n: usize) -> Option<StopReason> {
        match s.plan_tick() {
            TickPlan::Idle => None,
            TickPlan::Stop(reason) => Some(reason),
            TickPlan::Step(dir) => {
                let (next, reason) = s.advance(*frame, dir, n);
                *frame = next;
                reason
            }
        }
    }

    #[test]
    fn test_initial_state() {
        let mut s = PlaybackScheduler::new();
        assert_eq!(s.state(), AnimationState::Paused);
        assert!(!s.loop_active());
        assert_eq!(s.plan_tick(), TickPlan::Idle);
    }

    #[test]
    fn test_play_spawns_single_loop() {
        let mut s = PlaybackScheduler::new();
        assert!(s.play());
        assert!(!s.play());
        assert!(!s.reverse());
        assert_eq!(s.state(), AnimationState::Reverse);
        assert!(s.loop_active());
    }

    #[test]
    fn test_play_to_end_auto_pauses() {
        let mut s = PlaybackScheduler::new();
        let mut frame = 0;
        s.play();
        let mut reason = None;
        let mut ticks = 0;
        while reason.is_none() {
            reason = tick(&mut s, &mut frame, 5);
            ticks += 1;
        }
        assert_eq!(reason, Some(StopReason::ReachedEnd));
        assert_eq!(frame, 4);
        assert_eq!(ticks, 4);
        assert!(s.is_paused() && !s.loop_active());
    }

    #[test]
    fn test_reverse_to_start_auto_pauses() {
        let mut s = PlaybackScheduler::new();
        let mut frame = 3;
        s.reverse();
        assert_eq!(tick(&mut s, &mut frame, 10), None);
        assert_eq!(tick(&mut s, &mut frame, 10), None);
        assert_eq!(tick(&mut s, &mut frame, 10), Some(StopReason::ReachedStart));
        assert_eq!(frame, 0);
        assert!(s.is_paused());
    }

    #[test]
    fn test_pause_observed_next_tick() {
        let mut s = PlaybackScheduler::new();
        let mut frame = 0;
        s.play();
        tick(&mut s, &mut frame, 10);
        s.pause();
        assert!(s.loop_active());
        assert_eq!(tick(&mut s, &mut frame, 10), Some(StopReason::Paused));
        assert_eq!(frame, 1);
        assert!(!s.loop_active());
    }

    #[test]
    fn test_play_after_pause_before_tick_reuses_loop() {
        let mut s = PlaybackScheduler::new();
        s.play();
        s.pause();
        // ループはまだ止まっていないので新しく起こさない
        assert!(!s.play());
        let mut frame = 0;
        assert_eq!(tick(&mut s, &mut frame, 10), None);
        assert_eq!(frame, 1);
    }

    #[test]
    fn test_play_at_last_frame() {
        let mut s = PlaybackScheduler::new();
        let mut frame = 4;
        s.play();
        assert_eq!(tick(&mut s, &mut frame, 5), Some(StopReason::ReachedEnd));
        assert_eq!(frame, 4);
    }

    #[test]
    fn test_cancel() {
        let mut s = PlaybackScheduler::new();
        assert!(!s.cancel());
        s.reverse();
        assert!(s.cancel());
        assert!(s.is_paused());
        assert_eq!(s.plan_tick(), TickPlan::Idle);
    }
}

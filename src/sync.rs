// src/sync.rs - Dual-clip phase synchronization and playback state
use std::path::PathBuf;

use tracing::{debug, info};

use crate::data::{Phase, PoseSample, SwingAnalysis, View};
use crate::lookup;
use crate::timeline::{self, PhaseMarker};
use crate::video::{ClipLoader, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Waiting for the primary clip's metadata.
    Idle,
    /// A phase seek is waiting on at least one clip's readiness.
    SeekPending,
    Paused,
    Playing,
    /// The primary clip reported completion.
    Ended,
}

/// One view's clip: its loader (absent for a detached transport) and the
/// playback clock.
pub struct ViewPlayer {
    transport: Transport,
    loader: Option<ClipLoader>,
}

impl ViewPlayer {
    pub fn open(path: PathBuf) -> Self {
        Self {
            transport: Transport::new(),
            loader: Some(ClipLoader::spawn(path)),
        }
    }

    #[cfg(test)]
    fn detached() -> Self {
        Self { transport: Transport::new(), loader: None }
    }

    /// Edge-detects metadata readiness from the loader snapshot; the
    /// transport applies its pending seek on that transition.
    fn poll(&mut self) {
        if self.transport.is_ready() {
            return;
        }
        if let Some(loader) = &self.loader {
            if let Some(meta) = loader.meta() {
                self.transport.set_ready(meta.duration());
            }
        }
    }

    fn is_loading(&self) -> bool {
        self.loader.as_ref().map_or(false, |l| !l.finished())
    }

    fn settled(&self) -> bool {
        self.transport.is_ready() && !self.transport.has_pending_seek()
    }
}

/// Orchestrates the two clips: phase seeks against each view's own timing
/// data, synchronized play/pause, per-tick clock advance, and pose selection
/// for the overlay. Playback position and play state live in the transports;
/// this controller holds no copy of either.
pub struct VideoSyncController {
    analysis: SwingAnalysis,
    primary: ViewPlayer,
    secondary: Option<ViewPlayer>,
    state: PlayState,
    phase: Phase,
    /// Master overlay toggle.
    pub overlay_visible: bool,
    /// Whether the overlay stays up during playback; applied uniformly to
    /// both views.
    pub overlay_during_playback: bool,
}

impl VideoSyncController {
    pub fn new(analysis: SwingAnalysis) -> Self {
        let primary = ViewPlayer::open(analysis.primary.video.clone());
        let secondary = analysis
            .secondary
            .as_ref()
            .map(|view| ViewPlayer::open(view.video.clone()));
        Self::from_parts(analysis, primary, secondary)
    }

    fn from_parts(
        analysis: SwingAnalysis,
        primary: ViewPlayer,
        secondary: Option<ViewPlayer>,
    ) -> Self {
        let mut controller = Self {
            analysis,
            primary,
            secondary,
            state: PlayState::Idle,
            phase: Phase::Address,
            overlay_visible: true,
            overlay_during_playback: true,
        };
        controller.seek_players_to_phase();
        controller
    }

    pub fn analysis(&self) -> &SwingAnalysis {
        &self.analysis
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn has_view(&self, view: View) -> bool {
        self.player(view).is_some()
    }

    pub fn loader(&self, view: View) -> Option<&ClipLoader> {
        self.player(view)?.loader.as_ref()
    }

    pub fn current_time(&self, view: View) -> Option<f64> {
        Some(self.player(view)?.transport.current_time())
    }

    fn player(&self, view: View) -> Option<&ViewPlayer> {
        match view {
            View::Primary => Some(&self.primary),
            View::Secondary => self.secondary.as_ref(),
        }
    }

    fn players_mut(&mut self) -> impl Iterator<Item = &mut ViewPlayer> {
        std::iter::once(&mut self.primary).chain(self.secondary.iter_mut())
    }

    fn all_settled(&self) -> bool {
        self.primary.settled() && self.secondary.as_ref().map_or(true, ViewPlayer::settled)
    }

    fn pause_both(&mut self) {
        for player in self.players_mut() {
            player.transport.pause();
        }
    }

    fn play_both(&mut self) {
        for player in self.players_mut() {
            player.transport.play();
        }
    }

    /// Seeks every present clip to its own timestamp for the current phase.
    /// A view without a timestamp for the phase is left where it is.
    fn seek_players_to_phase(&mut self) {
        let phase = self.phase;
        let primary_target = self.analysis.primary.phase_times.get(&phase).copied();
        let secondary_target = self
            .analysis
            .secondary
            .as_ref()
            .and_then(|a| a.phase_times.get(&phase))
            .copied();

        if let Some(target) = primary_target {
            self.primary.transport.seek(target);
        }
        if let (Some(target), Some(secondary)) = (secondary_target, &mut self.secondary) {
            secondary.transport.seek(target);
        }
    }

    /// Switches to a phase: both clips pause, each seeks to its own
    /// timestamp. Playback never survives a phase change.
    pub fn set_phase(&mut self, phase: Phase) {
        debug!("phase change: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.pause_both();
        self.seek_players_to_phase();
        self.state = match (self.state, self.all_settled()) {
            (_, true) => PlayState::Paused,
            (PlayState::Idle, false) => PlayState::Idle,
            (_, false) => PlayState::SeekPending,
        };
    }

    /// Re-issues the current phase's pause-and-seek, used when the visible
    /// view layout changes.
    pub fn reseek_current_phase(&mut self) {
        self.set_phase(self.phase);
    }

    pub fn toggle_play(&mut self) {
        match self.state {
            PlayState::Paused => {
                self.play_both();
                self.state = PlayState::Playing;
            }
            PlayState::Playing => {
                self.pause_both();
                self.state = PlayState::Paused;
            }
            PlayState::Ended => {
                // Restart from the current phase; the primary sits at its
                // end of clip and would re-end immediately otherwise.
                self.seek_players_to_phase();
                self.play_both();
                self.state = PlayState::Playing;
            }
            // Not settled yet; ignore the toggle
            PlayState::Idle | PlayState::SeekPending => {}
        }
        debug!("play state: {:?}", self.state);
    }

    /// Per-frame drive: polls clip readiness and advances the clocks while
    /// playing. The end of the primary clip ends synchronized playback.
    pub fn tick(&mut self, dt: f64) {
        for player in self.players_mut() {
            player.poll();
        }

        match self.state {
            PlayState::Idle => {
                if self.primary.transport.is_ready() {
                    info!("primary clip ready, entering paused state");
                    self.state = PlayState::Paused;
                }
            }
            PlayState::SeekPending => {
                if self.all_settled() {
                    self.state = PlayState::Paused;
                }
            }
            PlayState::Playing => {
                self.primary.transport.advance(dt);
                if let Some(secondary) = &mut self.secondary {
                    secondary.transport.advance(dt);
                }
                if self.primary.transport.has_ended() {
                    if let Some(secondary) = &mut self.secondary {
                        secondary.transport.pause();
                    }
                    info!("primary clip finished");
                    self.state = PlayState::Ended;
                }
            }
            PlayState::Paused | PlayState::Ended => {}
        }
    }

    /// Whether the engine needs a continuous repaint this frame. True only
    /// while playing or while a clip is still decoding; while paused,
    /// redraws come from input and resize events instead of a timer.
    pub fn wants_repaint(&self) -> bool {
        if self.state == PlayState::Playing {
            return true;
        }
        self.primary.is_loading()
            || self.secondary.as_ref().map_or(false, ViewPlayer::is_loading)
    }

    /// The pose the overlay should draw for a view this frame: the nearest
    /// frame-sequence sample by that view's own clock during playback, the
    /// phase's static key frame otherwise. `None` means draw nothing.
    pub fn overlay_pose(&self, view: View) -> Option<&PoseSample> {
        if !self.overlay_visible {
            return None;
        }
        let analysis = self.analysis.view(view)?;

        if self.state == PlayState::Playing {
            if !self.overlay_during_playback {
                return None;
            }
            if !analysis.frames.is_empty() {
                let t = self.player(view)?.transport.current_time();
                return lookup::nearest_sample(&analysis.frames, t).map(|f| &f.pose);
            }
        }

        analysis.phase_poses.get(&self.phase)
    }

    /// Normalized primary playback position; observational only, never an
    /// input to seek decisions.
    pub fn progress(&self) -> Option<f32> {
        self.primary.transport.progress()
    }

    pub fn markers(&self) -> Vec<PhaseMarker> {
        timeline::phase_markers(
            &self.analysis.primary.phase_times,
            self.primary.transport.duration(),
            self.phase,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FrameSample, LandmarkPoint, ViewAnalysis};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn pose_at(x: f64) -> PoseSample {
        PoseSample {
            joints: HashMap::from([("left_wrist".to_string(), LandmarkPoint { x, y: 0.5 })]),
        }
    }

    fn fixture() -> SwingAnalysis {
        // 10 second primary clip tracked at ~30 samples/sec; the x
        // coordinate of each sample encodes its timestamp.
        let frames: Vec<FrameSample> = (0..300)
            .map(|i| {
                let timestamp = i as f64 / 30.0;
                FrameSample { timestamp, pose: pose_at(timestamp) }
            })
            .collect();

        SwingAnalysis {
            primary: ViewAnalysis {
                video: PathBuf::from("user.mp4"),
                phase_times: HashMap::from([
                    (Phase::Address, 0.5),
                    (Phase::Top, 2.0),
                    (Phase::Impact, 4.1),
                    (Phase::FollowThrough, 8.0),
                ]),
                phase_poses: HashMap::from([(Phase::Impact, pose_at(-1.0))]),
                phase_metrics: HashMap::new(),
                frames,
            },
            secondary: Some(ViewAnalysis {
                video: PathBuf::from("reference.mp4"),
                phase_times: HashMap::from([(Phase::Top, 1.5), (Phase::Impact, 3.8)]),
                phase_poses: HashMap::from([(Phase::Impact, pose_at(-2.0))]),
                phase_metrics: HashMap::new(),
                frames: Vec::new(),
            }),
        }
    }

    fn detached_controller() -> VideoSyncController {
        VideoSyncController::from_parts(
            fixture(),
            ViewPlayer::detached(),
            Some(ViewPlayer::detached()),
        )
    }

    fn ready_controller() -> VideoSyncController {
        let mut c = detached_controller();
        c.primary.transport.set_ready(Some(10.0));
        c.secondary.as_mut().unwrap().transport.set_ready(Some(9.0));
        c.tick(0.0);
        c
    }

    #[test]
    fn idle_until_primary_metadata_then_paused_at_initial_phase() {
        let mut c = detached_controller();
        assert_eq!(c.state(), PlayState::Idle);

        c.primary.transport.set_ready(Some(10.0));
        c.tick(0.0);
        assert_eq!(c.state(), PlayState::Paused);
        // The initial seek to Address was deferred and applied on readiness
        assert_eq!(c.current_time(View::Primary), Some(0.5));
    }

    #[test]
    fn toggle_twice_returns_to_paused_with_no_render_loop() {
        let mut c = ready_controller();
        c.toggle_play();
        assert_eq!(c.state(), PlayState::Playing);
        assert!(c.wants_repaint());

        c.toggle_play();
        assert_eq!(c.state(), PlayState::Paused);
        assert!(!c.primary.transport.is_playing());
        assert!(!c.secondary.as_ref().unwrap().transport.is_playing());
        assert!(!c.wants_repaint());
    }

    #[test]
    fn phase_seek_uses_each_views_own_timestamp() {
        let mut c = ready_controller();
        c.set_phase(Phase::Impact);

        assert_eq!(c.state(), PlayState::Paused);
        assert_eq!(c.current_time(View::Primary), Some(4.1));
        assert_eq!(c.current_time(View::Secondary), Some(3.8));
    }

    #[test]
    fn phase_change_interrupts_playback() {
        let mut c = ready_controller();
        c.toggle_play();
        c.tick(1.0);

        c.set_phase(Phase::Top);
        assert_eq!(c.state(), PlayState::Paused);
        assert!(!c.primary.transport.is_playing());
        assert_eq!(c.current_time(View::Primary), Some(2.0));
    }

    #[test]
    fn missing_phase_timestamp_leaves_that_view_in_place() {
        let mut c = ready_controller();
        c.set_phase(Phase::Impact);
        // The secondary has no FollowThrough entry
        c.set_phase(Phase::FollowThrough);

        assert_eq!(c.current_time(View::Primary), Some(8.0));
        assert_eq!(c.current_time(View::Secondary), Some(3.8));
        assert_eq!(c.state(), PlayState::Paused);
    }

    #[test]
    fn deferred_seek_is_replaced_by_a_newer_request() {
        let mut c = detached_controller();
        c.primary.transport.set_ready(Some(10.0));
        c.tick(0.0);

        c.set_phase(Phase::Top);
        assert_eq!(c.state(), PlayState::SeekPending);

        // A newer request supersedes the pending one
        c.set_phase(Phase::Impact);
        c.secondary.as_mut().unwrap().transport.set_ready(Some(9.0));
        c.tick(0.0);

        assert_eq!(c.state(), PlayState::Paused);
        assert_eq!(c.current_time(View::Secondary), Some(3.8));
        assert_eq!(c.current_time(View::Primary), Some(4.1));
    }

    #[test]
    fn playback_overlay_tracks_the_frame_sequence() {
        let mut c = ready_controller();
        // Paused at Address (0.5s): static key frame is used, and Address
        // has none in the fixture
        assert!(c.overlay_pose(View::Primary).is_none());

        c.toggle_play();
        c.tick(2.8); // 0.5 + 2.8 = 3.3s

        let pose = c.overlay_pose(View::Primary).unwrap();
        let x = pose.get("left_wrist").unwrap().x;
        assert!((x - 3.3).abs() < 1.0 / 60.0, "nearest sample to 3.3s, got {x}");

        // The secondary has no frame sequence; during playback it falls
        // back to the phase key frame
        let secondary = c.overlay_pose(View::Secondary);
        assert!(secondary.is_none(), "no Address key frame for the secondary");
    }

    #[test]
    fn pausing_and_switching_phase_uses_the_static_key_frame() {
        let mut c = ready_controller();
        c.toggle_play();
        c.tick(2.8);
        c.toggle_play();

        c.set_phase(Phase::Impact);
        assert_eq!(c.current_time(View::Primary), Some(4.1));
        assert_eq!(c.current_time(View::Secondary), Some(3.8));
        assert!(!c.is_playing());

        let primary = c.overlay_pose(View::Primary).unwrap();
        assert_eq!(primary.get("left_wrist").unwrap().x, -1.0);
        let secondary = c.overlay_pose(View::Secondary).unwrap();
        assert_eq!(secondary.get("left_wrist").unwrap().x, -2.0);
    }

    #[test]
    fn primary_completion_ends_playback_for_both() {
        let mut c = ready_controller();
        c.toggle_play();
        c.tick(30.0);

        assert_eq!(c.state(), PlayState::Ended);
        assert!(!c.primary.transport.is_playing());
        assert!(!c.secondary.as_ref().unwrap().transport.is_playing());
        assert!(!c.wants_repaint());

        // Toggling from Ended restarts from the current phase
        c.toggle_play();
        assert_eq!(c.state(), PlayState::Playing);
        assert_eq!(c.current_time(View::Primary), Some(0.5));
    }

    #[test]
    fn quiet_clip_still_allows_phase_navigation() {
        let mut c = detached_controller();
        c.primary.transport.set_ready(None);
        c.secondary.as_mut().unwrap().transport.set_ready(None);
        c.tick(0.0);

        assert_eq!(c.state(), PlayState::Paused);
        assert!(c.progress().is_none());
        assert!(c.markers().is_empty());

        c.set_phase(Phase::Impact);
        assert_eq!(c.current_time(View::Primary), Some(4.1));
    }

    #[test]
    fn overlay_visibility_policy_is_uniform() {
        let mut c = ready_controller();
        c.set_phase(Phase::Impact);

        c.overlay_visible = false;
        assert!(c.overlay_pose(View::Primary).is_none());
        assert!(c.overlay_pose(View::Secondary).is_none());

        c.overlay_visible = true;
        c.overlay_during_playback = false;
        c.toggle_play();
        assert!(c.overlay_pose(View::Primary).is_none());
        assert!(c.overlay_pose(View::Secondary).is_none());

        c.toggle_play();
        assert!(c.overlay_pose(View::Primary).is_some());
        assert!(c.overlay_pose(View::Secondary).is_some());
    }

    #[test]
    fn single_view_session_is_supported() {
        let mut analysis = fixture();
        analysis.secondary = None;
        let mut c =
            VideoSyncController::from_parts(analysis, ViewPlayer::detached(), None);
        c.primary.transport.set_ready(Some(10.0));
        c.tick(0.0);

        assert!(!c.has_view(View::Secondary));
        assert!(c.overlay_pose(View::Secondary).is_none());
        c.set_phase(Phase::Impact);
        assert_eq!(c.state(), PlayState::Paused);
        assert_eq!(c.current_time(View::Primary), Some(4.1));
        assert_eq!(c.current_time(View::Secondary), None);
    }

    #[test]
    fn markers_follow_the_primary_view() {
        let mut c = ready_controller();
        c.set_phase(Phase::Impact);
        let markers = c.markers();
        assert_eq!(markers.len(), 4);
        let impact = markers.iter().find(|m| m.phase == Phase::Impact).unwrap();
        assert_eq!(impact.percent, 41.0);
    }
}

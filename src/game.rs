//! Top-level game context
//!
//! Owns every piece of mutable state: the active run, cumulative progress, the
//! progression sequencer and the store they persist to. The host calls
//! [`GameContext::frame`] once per display callback and forwards input events.
//! Only one of the simulation or the sequencer is ever advancing.

use serde::Serialize;

use crate::cue::Cue;
use crate::persistence::{KeyValueStore, load_progress, save_progress};
use crate::progress::{
    CosmeticId, CumulativeState, ProgressionSequencer, RewardCatalog, RunSummary,
    SequenceContext, SequencerView,
};
use crate::settings::Settings;
use crate::sim::{
    Obstacle, PlacementMode, RunState, SimulationClock, TickInput, normalize_delta, tick,
};
use crate::submission::{ScoreSubmitter, SubmissionRequest, SubmissionResponse, SubmitError};
use crate::tuning::Tuning;

/// Agent pose for drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgentPose {
    pub x: f32,
    pub y: f32,
    pub tilt: f32,
    pub wing_angle: f32,
    pub size: f32,
}

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// A run is in progress (input goes to the agent)
    pub running: bool,
    /// New runs may be started
    pub can_start: bool,
    pub agent: Option<AgentPose>,
    pub obstacles: Vec<Obstacle>,
    pub score: u64,
    pub passed: u32,
    /// Active placement mode (drives the background motif)
    pub mode: Option<PlacementMode>,
    pub parallax: f32,
    pub selected: CosmeticId,
    pub best_score: u64,
    pub sequencer: SequencerView,
    /// One-shot cues raised since the previous snapshot
    pub cues: Vec<Cue>,
}

pub struct GameContext<S: KeyValueStore> {
    tuning: Tuning,
    settings: Settings,
    store: S,
    progress: CumulativeState,
    catalog: RewardCatalog,
    /// Current run, or the last one (frozen) until the next starts
    run: Option<RunState>,
    sequencer: ProgressionSequencer,
    clock: SimulationClock,
    cues: Vec<Cue>,
    next_seed: u64,
    pending_flap: bool,
    autopilot: bool,
}

impl<S: KeyValueStore> GameContext<S> {
    /// Load progress and settings from `store`
    pub fn new(store: S, tuning: Tuning, seed: u64) -> Self {
        let progress = load_progress(&store);
        let settings = Settings::load(&store);
        Self {
            tuning,
            settings,
            store,
            progress,
            catalog: RewardCatalog::standard(),
            run: None,
            sequencer: ProgressionSequencer::new(),
            clock: SimulationClock::new(),
            cues: Vec::new(),
            next_seed: seed,
            pending_flap: false,
            autopilot: false,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn progress(&self) -> &CumulativeState {
        &self.progress
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(RunState::is_running)
    }

    /// No run in progress and no sequence in flight
    pub fn can_start_run(&self) -> bool {
        !self.is_running() && self.sequencer.is_idle()
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    /// Replace settings and persist them
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if let Err(err) = self.settings.save(&mut self.store) {
            log::warn!("Failed to save settings: {}", err);
        }
    }

    /// Start a new run; ignored while a run or a sequence is active
    pub fn start_run(&mut self) -> bool {
        if !self.can_start_run() {
            log::debug!(
                "Ignoring run start (running={}, sequencer={:?})",
                self.is_running(),
                self.sequencer.phase()
            );
            return false;
        }
        let seed = self.next_seed;
        self.next_seed = self
            .next_seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.run = Some(RunState::new(seed, &self.tuning));
        self.pending_flap = false;
        log::info!("Run started (seed {})", seed);
        true
    }

    /// Flap input; only meaningful during a run
    pub fn flap(&mut self) -> bool {
        if self.is_running() {
            self.pending_flap = true;
            true
        } else {
            false
        }
    }

    /// Click/key on a blocking presentation
    pub fn acknowledge(&mut self) -> bool {
        self.with_sequence(|seq, ctx| seq.acknowledge(ctx))
    }

    /// Submission the host should send, if any (handed out once)
    pub fn take_submission_request(&mut self) -> Option<SubmissionRequest> {
        self.sequencer.take_submission_request()
    }

    pub fn resolve_submission(&mut self, result: Result<SubmissionResponse, SubmitError>) -> bool {
        self.with_sequence(|seq, ctx| seq.resolve_submission(ctx, result))
    }

    /// Send any pending submission through `submitter` and feed the result back
    pub fn submit_pending<T: ScoreSubmitter + ?Sized>(&mut self, submitter: &mut T) -> bool {
        match self.take_submission_request() {
            Some(request) => {
                let result = submitter.submit(&request);
                self.resolve_submission(result)
            }
            None => false,
        }
    }

    /// Menu cosmetic picker; locked while a run or sequence is active
    pub fn cycle_cosmetic(&mut self, forward: bool) -> CosmeticId {
        if !self.can_start_run() {
            return self.progress.selected;
        }
        let selected = self.progress.cycle_selected(forward);
        if let Err(err) = save_progress(&mut self.store, &self.progress) {
            log::warn!("Failed to persist selection: {}", err);
        }
        selected
    }

    /// Display callback entry point: `now_ms` is the host's monotonic clock
    pub fn frame(&mut self, now_ms: f64) -> FrameSnapshot {
        let elapsed_ms = self.clock.elapsed_ms(now_ms);
        self.step(elapsed_ms)
    }

    /// Advance by `elapsed_ms` of wall-clock time
    pub fn step(&mut self, elapsed_ms: f32) -> FrameSnapshot {
        let elapsed_ms = elapsed_ms.max(0.0);
        match self.run.as_mut().filter(|run| run.is_running()) {
            Some(run) => {
                let input = TickInput {
                    flap: std::mem::take(&mut self.pending_flap),
                    autopilot: self.autopilot,
                };
                let outcome = tick(
                    run,
                    &input,
                    &self.tuning,
                    normalize_delta(elapsed_ms),
                    &mut self.cues,
                );
                if outcome.fatal.is_some() {
                    self.finish_run();
                }
            }
            None => self.with_sequence(|seq, ctx| seq.update(ctx, elapsed_ms)),
        }
        self.snapshot()
    }

    /// Hand the ended run to the sequencer
    fn finish_run(&mut self) {
        let Some(run_score) = self.run.as_ref().map(|run| run.score) else {
            return;
        };
        self.pending_flap = false;
        let summary = RunSummary {
            run_score,
            identity: self.settings.identity.clone(),
            cohort: self.settings.cohort.clone(),
        };
        self.with_sequence(|seq, ctx| seq.begin(ctx, summary));
    }

    fn with_sequence<R>(
        &mut self,
        f: impl FnOnce(&mut ProgressionSequencer, &mut SequenceContext) -> R,
    ) -> R {
        let mut ctx = SequenceContext {
            progress: &mut self.progress,
            catalog: &self.catalog,
            tuning: &self.tuning.progress,
            store: &mut self.store,
            cues: &mut self.cues,
        };
        f(&mut self.sequencer, &mut ctx)
    }

    /// Current frame state; drains pending cues
    pub fn snapshot(&mut self) -> FrameSnapshot {
        let run = self.run.as_ref();
        let parallax = match run {
            Some(run) if self.settings.effective_parallax() => run.parallax,
            _ => 0.0,
        };
        FrameSnapshot {
            running: self.is_running(),
            can_start: self.can_start_run(),
            agent: run.map(|run| AgentPose {
                x: run.agent.pos.x,
                y: run.agent.pos.y,
                tilt: run.agent.tilt,
                wing_angle: run.agent.wing.angle,
                size: run.agent.size,
            }),
            obstacles: run.map(|run| run.obstacles.clone()).unwrap_or_default(),
            score: run.map_or(0, |run| run.score),
            passed: run.map_or(0, |run| run.passed),
            mode: run.map(|run| run.mode),
            parallax,
            selected: self.progress.selected,
            best_score: self.progress.best_score,
            sequencer: self
                .sequencer
                .view(&self.catalog, &self.progress, &self.tuning.progress),
            cues: std::mem::take(&mut self.cues),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::leaderboard::Leaderboard;
    use crate::persistence::MemoryStore;
    use crate::progress::SequencerPhase;
    use crate::sim::RunPhase;

    fn context() -> GameContext<MemoryStore> {
        GameContext::new(MemoryStore::new(), Tuning::default(), 7)
    }

    /// Step frames until the run ends
    fn play_until_end(game: &mut GameContext<MemoryStore>) -> Vec<Cue> {
        let mut cues = Vec::new();
        for _ in 0..10_000 {
            let snap = game.step(FRAME_MS);
            cues.extend(snap.cues);
            if !snap.running {
                return cues;
            }
        }
        panic!("run never ended");
    }

    /// Force the next tick to end the current run with `score`
    fn rig_run_end(game: &mut GameContext<MemoryStore>, score: u64) {
        let run = game.run.as_mut().unwrap();
        run.score = score;
        run.agent.pos.y = -100.0;
        run.agent.vy = 0.0;
    }

    #[test]
    fn test_new_context_is_idle() {
        let mut game = context();
        assert!(game.can_start_run());
        let snap = game.snapshot();
        assert!(!snap.running && snap.can_start);
        assert_eq!(snap.agent, None);
        assert_eq!(snap.sequencer.phase, SequencerPhase::Idle);
    }

    #[test]
    fn test_flap_only_during_run() {
        let mut game = context();
        assert!(!game.flap());
        assert!(game.start_run());
        assert!(game.flap());
        let snap = game.step(FRAME_MS);
        assert!(snap.cues.contains(&Cue::Flap));
    }

    #[test]
    fn test_run_end_hands_off_to_sequencer() {
        let mut game = context();
        game.start_run();
        game.step(FRAME_MS);
        rig_run_end(&mut game, 150);
        let snap = game.step(FRAME_MS);
        assert!(!snap.running);
        assert!(snap.cues.contains(&Cue::FatalCollision));
        assert_eq!(snap.sequencer.phase, SequencerPhase::SubmittingScore);
        assert_eq!(game.progress().cumulative_score, 150);
        let request = game.take_submission_request().unwrap();
        assert_eq!(request.run_score, 150);
        assert_eq!(request.identity, "Player");
    }

    #[test]
    fn test_start_ignored_while_sequencer_active() {
        let mut game = context();
        game.start_run();
        play_until_end(&mut game);
        assert!(!game.sequencer.is_idle());

        let before = game.run().unwrap().clone();
        assert!(!game.start_run());
        let after = game.run().unwrap();
        assert_eq!(after.seed, before.seed);
        assert_eq!(after.time_ticks, before.time_ticks);
        assert_eq!(after.phase, RunPhase::Ended);
        assert_eq!(after.agent, before.agent);
    }

    #[test]
    fn test_full_cycle_with_local_leaderboard() {
        let mut game = context();
        let mut board = Leaderboard::new();
        game.start_run();
        game.step(FRAME_MS);
        rig_run_end(&mut game, 120);
        game.step(FRAME_MS);
        assert!(game.submit_pending(&mut board));
        assert_eq!(board.top_score(), Some(120));

        let mut saw_celebration = false;
        for _ in 0..100_000 {
            let snap = game.step(FRAME_MS);
            saw_celebration |= snap.cues.iter().any(|c| matches!(c, Cue::RankTierReached { .. }));
            if snap.can_start {
                break;
            }
            game.acknowledge();
        }
        assert!(saw_celebration);
        assert!(game.can_start_run());
        assert_eq!(game.progress().best_score, 120);
        assert!(game.progress().reached_run_milestones.contains(&100));
        // Classic, three loot boxes (run 1, run 100, cumulative 100), three gated ranks
        assert_eq!(game.progress().unlocked.len(), 7);
        assert_eq!(game.progress().selected, CosmeticId::Crowned);
        assert_eq!(load_progress(game.store()), *game.progress());
        assert!(game.start_run());
    }

    #[test]
    fn test_failed_submission_still_reaches_idle() {
        let mut game = context();
        game.start_run();
        game.step(FRAME_MS);
        rig_run_end(&mut game, 5);
        game.step(FRAME_MS);
        assert!(game.resolve_submission(Err(SubmitError::Network("offline".into()))));
        for _ in 0..100_000 {
            if game.step(FRAME_MS).can_start {
                break;
            }
            game.acknowledge();
        }
        assert!(game.can_start_run());
        assert_eq!(game.progress().cumulative_score, 5);
    }

    #[test]
    fn test_cycle_cosmetic_locked_during_run() {
        let mut game = context();
        game.progress.unlock(CosmeticId::Robo);
        assert_eq!(game.cycle_cosmetic(true), CosmeticId::Robo);
        game.start_run();
        assert_eq!(game.cycle_cosmetic(true), CosmeticId::Robo);
        assert_eq!(load_progress(game.store()).selected, CosmeticId::Robo);
    }

    #[test]
    fn test_frame_uses_wall_clock() {
        let mut game = context();
        game.start_run();
        game.frame(1000.0);
        let ticks = game.run().unwrap().time_ticks;
        let y = game.run().unwrap().agent.pos.y;
        game.frame(1000.0 + f64::from(FRAME_MS) * 2.0);
        assert_eq!(game.run().unwrap().time_ticks, ticks + 1);
        assert!(game.run().unwrap().agent.pos.y > y);
    }

    #[test]
    fn test_reduced_motion_freezes_parallax() {
        let mut game = context();
        game.update_settings(Settings {
            reduced_motion: true,
            ..Default::default()
        });
        game.start_run();
        let snap = game.step(FRAME_MS);
        assert_eq!(snap.parallax, 0.0);
        assert!(game.run().unwrap().parallax > 0.0);
    }
}

//! Post-run progression state machine
//!
//! A finished run is folded into the cumulative state in [`ProgressionSequencer::begin`],
//! then played back stage by stage:
//!
//! ```text
//! Submitting -> Celebrating -> RunMilestones -> CumulativeAnimation -> Summary
//!            -> SecretUnlocks -> CollectionComplete -> Idle
//! ```
//!
//! Stages only wait on three things: a timer, a player acknowledgment, or the
//! submission response. Every other transition settles within the same call.
//! New runs are refused until the machine is back in `Idle`.

use std::collections::VecDeque;

use serde::Serialize;

use super::animation::{AnimationStep, ProgressAnimation};
use super::catalog::{CosmeticId, RewardCatalog};
use super::milestones::{
    Milestone, bucket_index, bucket_progress, checked_cumulative_threshold, track,
};
use super::{CumulativeState, RankTier};
use crate::cue::Cue;
use crate::persistence::{KeyValueStore, save_progress};
use crate::submission::{SubmissionRequest, SubmissionResponse, SubmitError};
use crate::tuning::ProgressTuning;

/// Everything the sequencer touches while it advances
pub struct SequenceContext<'a> {
    pub progress: &'a mut CumulativeState,
    pub catalog: &'a RewardCatalog,
    pub tuning: &'a ProgressTuning,
    pub store: &'a mut dyn KeyValueStore,
    pub cues: &'a mut Vec<Cue>,
}

impl SequenceContext<'_> {
    fn persist(&mut self) {
        if let Err(err) = save_progress(&mut *self.store, &*self.progress) {
            log::warn!("Failed to persist progress: {}", err);
        }
    }

    /// Milestone rewards stop once every regular cosmetic is owned
    fn playback_suppressed(&self) -> bool {
        self.progress.collection_complete
            || self.catalog.is_collection_complete(&self.progress.unlocked)
    }
}

/// A finished run handed over by the simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_score: u64,
    pub identity: String,
    pub cohort: String,
}

/// Coarse phase for choosing the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencerPhase {
    Idle,
    SubmittingScore,
    RankCelebration,
    RunMilestonePlayback,
    CumulativeAnimation,
    Summary,
    SecretUnlock,
    CollectionComplete,
}

/// What a reward presentation is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealSource {
    /// Loot box for a milestone; the prize is picked when it is opened
    Milestone(Milestone),
    /// Rank-gated cosmetic, already unlocked
    Gated(CosmeticId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RevealState {
    Sealed,
    Opened {
        reward: Option<CosmeticId>,
        remaining_ms: f32,
    },
}

/// Blocking reward presentation: waits for a click, then holds the reveal
#[derive(Debug, Clone, PartialEq)]
struct RewardReveal {
    source: RevealSource,
    state: RevealState,
}

impl RewardReveal {
    fn milestone(milestone: Milestone, cues: &mut Vec<Cue>) -> Self {
        cues.push(Cue::MilestoneReached {
            threshold: milestone.threshold(),
        });
        Self {
            source: RevealSource::Milestone(milestone),
            state: RevealState::Sealed,
        }
    }

    fn gated(id: CosmeticId) -> Self {
        Self {
            source: RevealSource::Gated(id),
            state: RevealState::Sealed,
        }
    }

    /// Open a sealed presentation; returns false if already open
    fn open(&mut self, ctx: &mut SequenceContext) -> bool {
        if self.state != RevealState::Sealed {
            return false;
        }
        let reward = match self.source {
            RevealSource::Milestone(_) => {
                let next = ctx.catalog.next_unlock(&ctx.progress.unlocked);
                if let Some(id) = next {
                    ctx.progress.unlock(id);
                    log::info!("Unlocked {}", ctx.catalog.name(id));
                }
                next
            }
            RevealSource::Gated(id) => Some(id),
        };
        if let Some(id) = reward {
            ctx.progress.selected = id;
        }
        ctx.persist();
        ctx.cues.push(Cue::RewardUnlockClick { reward });
        self.state = RevealState::Opened {
            reward,
            remaining_ms: ctx.tuning.reveal_ms,
        };
        true
    }

    /// Run the reveal timer; true once the presentation is over
    fn advance(&mut self, elapsed_ms: &mut f32) -> bool {
        match &mut self.state {
            RevealState::Sealed => false,
            RevealState::Opened { remaining_ms, .. } => countdown(remaining_ms, elapsed_ms),
        }
    }

    fn view(&self, catalog: &RewardCatalog) -> RevealView {
        let title = match self.source {
            RevealSource::Milestone(milestone) => milestone.message(),
            RevealSource::Gated(id) => catalog
                .entry(id)
                .map(|e| e.unlock_message.to_string())
                .unwrap_or_default(),
        };
        match self.state {
            RevealState::Sealed => RevealView {
                title,
                opened: false,
                reward: None,
                reward_message: None,
            },
            RevealState::Opened { reward, .. } => RevealView {
                title,
                opened: true,
                reward,
                reward_message: Some(match reward.and_then(|id| catalog.entry(id)) {
                    Some(entry) => entry.unlock_message.to_string(),
                    None => "All cosmetics unlocked!".to_string(),
                }),
            },
        }
    }
}

/// Subtract elapsed time from a timer, keeping the leftover for the next stage
fn countdown(remaining_ms: &mut f32, elapsed_ms: &mut f32) -> bool {
    if *elapsed_ms >= *remaining_ms {
        *elapsed_ms -= *remaining_ms;
        *remaining_ms = 0.0;
        true
    } else {
        *remaining_ms -= *elapsed_ms;
        *elapsed_ms = 0.0;
        false
    }
}

#[derive(Debug)]
enum Stage {
    Idle,
    Submitting,
    Celebrating {
        tier: RankTier,
        remaining_ms: f32,
    },
    RunMilestones {
        pending: VecDeque<u64>,
        reveal: Option<RewardReveal>,
    },
    CumulativeAnimation {
        animation: ProgressAnimation<Box<Stage>>,
        reveal: Option<RewardReveal>,
    },
    Summary {
        remaining_ms: f32,
    },
    SecretUnlocks {
        pending: VecDeque<CosmeticId>,
        reveal: Option<RewardReveal>,
    },
    CollectionComplete {
        remaining_ms: f32,
    },
}

impl Stage {
    fn phase(&self) -> SequencerPhase {
        match self {
            Stage::Idle => SequencerPhase::Idle,
            Stage::Submitting => SequencerPhase::SubmittingScore,
            Stage::Celebrating { .. } => SequencerPhase::RankCelebration,
            Stage::RunMilestones { .. } => SequencerPhase::RunMilestonePlayback,
            Stage::CumulativeAnimation { .. } => SequencerPhase::CumulativeAnimation,
            Stage::Summary { .. } => SequencerPhase::Summary,
            Stage::SecretUnlocks { .. } => SequencerPhase::SecretUnlock,
            Stage::CollectionComplete { .. } => SequencerPhase::CollectionComplete,
        }
    }

    fn reveal(&self) -> Option<&RewardReveal> {
        match self {
            Stage::RunMilestones { reveal, .. }
            | Stage::CumulativeAnimation { reveal, .. }
            | Stage::SecretUnlocks { reveal, .. } => reveal.as_ref(),
            _ => None,
        }
    }

    fn reveal_mut(&mut self) -> Option<&mut RewardReveal> {
        match self {
            Stage::RunMilestones { reveal, .. }
            | Stage::CumulativeAnimation { reveal, .. }
            | Stage::SecretUnlocks { reveal, .. } => reveal.as_mut(),
            _ => None,
        }
    }
}

/// Data fixed when the sequence begins
#[derive(Debug, Clone)]
struct Plan {
    run_score: u64,
    cumulative_before: u64,
    cumulative_after: u64,
    run_milestones: Vec<u64>,
    cumulative_milestones: Vec<u64>,
    response: Option<SubmissionResponse>,
}

enum Flow {
    /// Suspended until time passes or an event arrives
    Wait(Stage),
    /// Moved on; settle the new stage too
    Next(Stage),
}

fn enter_run_milestones(plan: &Plan, ctx: &mut SequenceContext) -> Stage {
    if ctx.playback_suppressed() {
        return enter_summary(ctx);
    }
    Stage::RunMilestones {
        pending: plan.run_milestones.iter().copied().collect(),
        reveal: None,
    }
}

fn enter_cumulative(plan: &Plan, ctx: &mut SequenceContext) -> Stage {
    if ctx.playback_suppressed() {
        return enter_summary(ctx);
    }
    Stage::CumulativeAnimation {
        animation: ProgressAnimation::new(
            plan.cumulative_before,
            plan.cumulative_after,
            &plan.cumulative_milestones,
            ctx.tuning.ms_per_point,
            Box::new(enter_summary(ctx)),
        ),
        reveal: None,
    }
}

fn enter_summary(ctx: &SequenceContext) -> Stage {
    Stage::Summary {
        remaining_ms: ctx.tuning.message_ms,
    }
}

fn enter_secret_unlocks(plan: &Plan, ctx: &mut SequenceContext) -> Stage {
    let qualified = match &plan.response {
        Some(response) => ctx.catalog.newly_qualified(&ctx.progress.unlocked, response),
        None => Vec::new(),
    };
    if !qualified.is_empty() {
        for id in &qualified {
            ctx.progress.unlock(*id);
            log::info!("Unlocked gated cosmetic {}", ctx.catalog.name(*id));
        }
        ctx.persist();
    }
    Stage::SecretUnlocks {
        pending: qualified.into(),
        reveal: None,
    }
}

fn enter_collection_check(ctx: &mut SequenceContext) -> Stage {
    if ctx.progress.collection_complete
        || !ctx.catalog.is_collection_complete(&ctx.progress.unlocked)
    {
        return Stage::Idle;
    }
    ctx.progress.collection_complete = true;
    ctx.persist();
    ctx.cues.push(Cue::CollectionComplete);
    log::info!("Collection complete");
    Stage::CollectionComplete {
        remaining_ms: ctx.tuning.collection_complete_ms,
    }
}

/// Advance one stage; `elapsed_ms` is consumed by whatever waits on time
fn step(stage: Stage, plan: &Plan, ctx: &mut SequenceContext, elapsed_ms: &mut f32) -> Flow {
    match stage {
        Stage::Idle => Flow::Wait(Stage::Idle),
        Stage::Submitting => Flow::Wait(Stage::Submitting),
        Stage::Celebrating {
            tier,
            mut remaining_ms,
        } => {
            if countdown(&mut remaining_ms, elapsed_ms) {
                Flow::Next(enter_run_milestones(plan, ctx))
            } else {
                Flow::Wait(Stage::Celebrating { tier, remaining_ms })
            }
        }
        Stage::RunMilestones {
            mut pending,
            mut reveal,
        } => {
            if let Some(current) = reveal.as_mut() {
                if !current.advance(elapsed_ms) {
                    return Flow::Wait(Stage::RunMilestones { pending, reveal });
                }
            }
            if ctx.playback_suppressed() {
                return Flow::Next(enter_cumulative(plan, ctx));
            }
            match pending.pop_front() {
                Some(threshold) => Flow::Next(Stage::RunMilestones {
                    pending,
                    reveal: Some(RewardReveal::milestone(Milestone::Run(threshold), ctx.cues)),
                }),
                None => Flow::Next(enter_cumulative(plan, ctx)),
            }
        }
        Stage::CumulativeAnimation {
            mut animation,
            mut reveal,
        } => {
            if let Some(current) = reveal.as_mut() {
                if !current.advance(elapsed_ms) {
                    return Flow::Wait(Stage::CumulativeAnimation { animation, reveal });
                }
                if ctx.playback_suppressed() {
                    return match animation.force_complete(ctx.cues) {
                        Some(next) => Flow::Next(*next),
                        None => Flow::Next(enter_summary(ctx)),
                    };
                }
                animation.resume();
            }
            match animation.advance(std::mem::take(elapsed_ms), ctx.cues) {
                AnimationStep::Running => Flow::Wait(Stage::CumulativeAnimation {
                    animation,
                    reveal: None,
                }),
                AnimationStep::Paused(threshold) => Flow::Next(Stage::CumulativeAnimation {
                    animation,
                    reveal: Some(RewardReveal::milestone(
                        Milestone::Cumulative(threshold),
                        ctx.cues,
                    )),
                }),
                AnimationStep::Finished(Some(next)) => Flow::Next(*next),
                AnimationStep::Finished(None) => Flow::Next(enter_summary(ctx)),
            }
        }
        Stage::Summary { mut remaining_ms } => {
            if countdown(&mut remaining_ms, elapsed_ms) {
                Flow::Next(enter_secret_unlocks(plan, ctx))
            } else {
                Flow::Wait(Stage::Summary { remaining_ms })
            }
        }
        Stage::SecretUnlocks {
            mut pending,
            mut reveal,
        } => {
            if let Some(current) = reveal.as_mut() {
                if !current.advance(elapsed_ms) {
                    return Flow::Wait(Stage::SecretUnlocks { pending, reveal });
                }
            }
            match pending.pop_front() {
                Some(id) => Flow::Next(Stage::SecretUnlocks {
                    pending,
                    reveal: Some(RewardReveal::gated(id)),
                }),
                None => Flow::Next(enter_collection_check(ctx)),
            }
        }
        Stage::CollectionComplete { mut remaining_ms } => {
            if countdown(&mut remaining_ms, elapsed_ms) {
                Flow::Next(Stage::Idle)
            } else {
                Flow::Wait(Stage::CollectionComplete { remaining_ms })
            }
        }
    }
}

/// Reward presentation as the overlay should draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealView {
    pub title: String,
    pub opened: bool,
    pub reward: Option<CosmeticId>,
    pub reward_message: Option<String>,
}

/// Cumulative progress bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressBar {
    pub value: u64,
    /// Fill within the current milestone bucket, 0..=1
    pub fraction: f32,
    pub next_milestone: Option<u64>,
}

/// Read-only view of the sequencer for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencerView {
    pub phase: SequencerPhase,
    pub message: Option<String>,
    pub rank_tier: Option<RankTier>,
    pub reveal: Option<RevealView>,
    pub progress: ProgressBar,
}

/// Drives the post-run sequence
#[derive(Debug)]
pub struct ProgressionSequencer {
    stage: Stage,
    plan: Option<Plan>,
    outbox: Option<SubmissionRequest>,
}

impl Default for ProgressionSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionSequencer {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            plan: None,
            outbox: None,
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self.stage, Stage::Idle)
    }

    pub fn phase(&self) -> SequencerPhase {
        self.stage.phase()
    }

    /// Fold a finished run into cumulative progress and start playback.
    /// Returns false (and changes nothing) while a sequence is in flight.
    pub fn begin(&mut self, ctx: &mut SequenceContext, summary: RunSummary) -> bool {
        if !self.is_idle() {
            log::debug!("Ignoring run summary while sequencer is {:?}", self.phase());
            return false;
        }

        let before = ctx.progress.cumulative_score;
        let after = before.saturating_add(summary.run_score);
        let (run_milestones, cumulative_milestones): (Vec<Milestone>, Vec<Milestone>) = track(
            summary.run_score,
            before,
            after,
            &ctx.progress.reached_run_milestones,
            &ctx.tuning.run_milestones,
            ctx.tuning.cumulative_step,
        )
        .into_iter()
        .partition(|m| matches!(m, Milestone::Run(_)));

        let beats_best = summary.run_score > ctx.progress.best_score;
        ctx.progress
            .reached_run_milestones
            .extend(run_milestones.iter().map(Milestone::threshold));
        ctx.progress.cumulative_score = after;
        if beats_best {
            ctx.progress.best_score = summary.run_score;
        }
        ctx.persist();

        log::info!(
            "Sequence started: run={} cumulative {} -> {} ({} run / {} cumulative milestones)",
            summary.run_score,
            before,
            after,
            run_milestones.len(),
            cumulative_milestones.len()
        );

        let plan = Plan {
            run_score: summary.run_score,
            cumulative_before: before,
            cumulative_after: after,
            run_milestones: run_milestones.iter().map(Milestone::threshold).collect(),
            cumulative_milestones: cumulative_milestones
                .iter()
                .map(Milestone::threshold)
                .collect(),
            response: None,
        };

        self.stage = if beats_best {
            self.outbox = Some(SubmissionRequest {
                identity: summary.identity,
                cohort: summary.cohort,
                run_score: summary.run_score,
                cosmetic_id: ctx.progress.selected,
            });
            Stage::Submitting
        } else {
            enter_run_milestones(&plan, ctx)
        };
        self.plan = Some(plan);
        self.settle(ctx, 0.0);
        true
    }

    /// Submission the host should send (handed out once)
    pub fn take_submission_request(&mut self) -> Option<SubmissionRequest> {
        self.outbox.take()
    }

    /// Feed the submission outcome. Failures only mean "no ranking data".
    pub fn resolve_submission(
        &mut self,
        ctx: &mut SequenceContext,
        result: Result<SubmissionResponse, SubmitError>,
    ) -> bool {
        if !matches!(self.stage, Stage::Submitting) {
            log::debug!("Ignoring submission result while sequencer is {:?}", self.phase());
            return false;
        }
        let Some(plan) = self.plan.as_mut() else {
            self.stage = Stage::Idle;
            return false;
        };
        self.outbox = None;

        let response = match result {
            Ok(response) => Some(response),
            Err(err) => {
                log::warn!("Score submission failed, skipping rank celebration: {}", err);
                None
            }
        };
        plan.response = response;

        self.stage = match response.as_ref().and_then(RankTier::highest) {
            Some(tier) => {
                ctx.cues.push(Cue::RankTierReached { tier });
                log::info!("Rank tier reached: {:?}", tier);
                Stage::Celebrating {
                    tier,
                    remaining_ms: tier.duration_ms(ctx.tuning),
                }
            }
            None => enter_run_milestones(plan, ctx),
        };
        self.settle(ctx, 0.0);
        true
    }

    /// Advance timers and animation by `elapsed_ms`
    pub fn update(&mut self, ctx: &mut SequenceContext, elapsed_ms: f32) {
        self.settle(ctx, elapsed_ms.max(0.0));
    }

    /// Player click/key on a blocking presentation
    pub fn acknowledge(&mut self, ctx: &mut SequenceContext) -> bool {
        let opened = match self.stage.reveal_mut() {
            Some(reveal) => reveal.open(ctx),
            None => false,
        };
        if opened {
            self.settle(ctx, 0.0);
        }
        opened
    }

    /// Cut an in-flight progress animation short and continue with whatever
    /// was queued after it
    pub fn force_complete_animation(&mut self, ctx: &mut SequenceContext) -> bool {
        let Stage::CumulativeAnimation { animation, .. } = &mut self.stage else {
            return false;
        };
        let next = match animation.force_complete(ctx.cues) {
            Some(next) => *next,
            None => enter_summary(ctx),
        };
        log::debug!("Progress animation force-completed");
        self.stage = next;
        self.settle(ctx, 0.0);
        true
    }

    fn settle(&mut self, ctx: &mut SequenceContext, mut elapsed_ms: f32) {
        let Some(plan) = self.plan.as_ref() else {
            self.stage = Stage::Idle;
            return;
        };
        loop {
            let stage = std::mem::replace(&mut self.stage, Stage::Idle);
            match step(stage, plan, ctx, &mut elapsed_ms) {
                Flow::Wait(stage) => {
                    self.stage = stage;
                    break;
                }
                Flow::Next(stage) => {
                    log::debug!("Sequencer -> {:?}", stage.phase());
                    self.stage = stage;
                }
            }
        }
        if self.is_idle() {
            log::info!("Sequence finished (run {})", plan.run_score);
            self.plan = None;
            self.outbox = None;
        }
    }

    pub fn view(
        &self,
        catalog: &RewardCatalog,
        progress: &CumulativeState,
        tuning: &ProgressTuning,
    ) -> SequencerView {
        let message = match &self.stage {
            Stage::Submitting => Some("Submitting score...".to_string()),
            Stage::Celebrating { tier, .. } => Some(tier.message().to_string()),
            Stage::Summary { .. } => self
                .plan
                .as_ref()
                .map(|plan| format!("Cumulative score: {}", plan.cumulative_after)),
            Stage::CollectionComplete { .. } => {
                Some("Collection complete! Every cosmetic unlocked".to_string())
            }
            _ => None,
        };
        let rank_tier = match &self.stage {
            Stage::Celebrating { tier, .. } => Some(*tier),
            _ => None,
        };
        SequencerView {
            phase: self.phase(),
            message,
            rank_tier,
            reveal: self.stage.reveal().map(|reveal| reveal.view(catalog)),
            progress: self.progress_bar(progress, tuning),
        }
    }

    fn progress_bar(&self, progress: &CumulativeState, tuning: &ProgressTuning) -> ProgressBar {
        let value = match (&self.stage, &self.plan) {
            (Stage::CumulativeAnimation { animation, .. }, _) => animation.value(),
            (
                Stage::Submitting | Stage::Celebrating { .. } | Stage::RunMilestones { .. },
                Some(plan),
            ) => plan.cumulative_before,
            _ => progress.cumulative_score,
        };
        let pinned = progress.collection_complete
            || matches!(self.stage, Stage::CollectionComplete { .. });
        if pinned {
            return ProgressBar {
                value,
                fraction: 1.0,
                next_milestone: None,
            };
        }
        let step = tuning.cumulative_step;
        ProgressBar {
            value,
            fraction: bucket_progress(value, step),
            next_milestone: checked_cumulative_threshold(bucket_index(value, step) + 1, step),
        }
    }
}

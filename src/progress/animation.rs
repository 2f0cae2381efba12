//! Cumulative progress-bar animation
//!
//! Counts from the previous total to the new one at a fixed rate, stopping
//! exactly on each crossed milestone until resumed. The completion value is
//! handed out exactly once, whether the animation runs out naturally or is
//! forced to finish.

use std::collections::VecDeque;

use crate::cue::Cue;

/// Result of advancing the animation
#[derive(Debug, PartialEq)]
pub enum AnimationStep<T> {
    /// Still counting
    Running,
    /// Stopped on a milestone boundary, waiting for `resume`
    Paused(u64),
    /// Reached the target; carries the completion on the first report only
    Finished(Option<T>),
}

#[derive(Debug)]
pub struct ProgressAnimation<T> {
    target: u64,
    value: f64,
    pauses: VecDeque<u64>,
    paused_at: Option<u64>,
    ms_per_point: f32,
    looping: bool,
    finished: bool,
    completion: Option<T>,
}

impl<T> ProgressAnimation<T> {
    /// `pauses` outside `(from, to]` are ignored
    pub fn new(from: u64, to: u64, pauses: &[u64], ms_per_point: f32, completion: T) -> Self {
        let mut pauses: Vec<u64> = pauses
            .iter()
            .copied()
            .filter(|p| *p > from && *p <= to)
            .collect();
        pauses.sort_unstable();
        pauses.dedup();
        Self {
            target: to.max(from),
            value: from as f64,
            pauses: pauses.into(),
            paused_at: None,
            ms_per_point: ms_per_point.max(f32::EPSILON),
            looping: false,
            finished: false,
            completion: Some(completion),
        }
    }

    /// Displayed value (whole points)
    pub fn value(&self) -> u64 {
        self.value.floor() as u64
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Count forward by `elapsed_ms`
    pub fn advance(&mut self, elapsed_ms: f32, cues: &mut Vec<Cue>) -> AnimationStep<T> {
        if self.finished {
            return AnimationStep::Finished(self.completion.take());
        }
        if let Some(at) = self.paused_at {
            return AnimationStep::Paused(at);
        }

        let limit = self.pauses.front().copied().unwrap_or(self.target);
        if self.value < limit as f64 && !self.looping {
            self.looping = true;
            cues.push(Cue::ProgressLoopStart);
        }

        self.value += f64::from(elapsed_ms.max(0.0) / self.ms_per_point);
        if self.value < limit as f64 {
            return AnimationStep::Running;
        }

        self.value = limit as f64;
        self.stop_loop(cues);
        if let Some(at) = self.pauses.pop_front() {
            self.paused_at = Some(at);
            return AnimationStep::Paused(at);
        }
        self.finished = true;
        AnimationStep::Finished(self.completion.take())
    }

    /// Continue from the boundary the animation stopped on
    pub fn resume(&mut self) {
        self.paused_at = None;
    }

    /// Jump to the target, silence the loop and hand out the completion
    /// (None if it was already handed out)
    pub fn force_complete(&mut self, cues: &mut Vec<Cue>) -> Option<T> {
        self.stop_loop(cues);
        self.value = self.target as f64;
        self.pauses.clear();
        self.paused_at = None;
        self.finished = true;
        self.completion.take()
    }

    fn stop_loop(&mut self, cues: &mut Vec<Cue>) {
        if self.looping {
            self.looping = false;
            cues.push(Cue::ProgressLoopStop);
        }
    }
}

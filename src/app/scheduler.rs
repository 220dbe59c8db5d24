use std::collections::VecDeque;

use crate::layout::{CanvasConfig, ContinuityMemo, LayoutMode, LayoutNode, compute_layout};
use crate::library::Item;

#[derive(Clone, Debug)]
pub struct LayoutRequest {
    pub mode: LayoutMode,
    pub items: Vec<Item>,
    pub seed: u64,
    pub canvas: CanvasConfig,
}

#[derive(Clone, Debug)]
pub struct LayoutJob {
    pub generation: u64,
    pub request: LayoutRequest,
}

impl LayoutJob {
    pub fn run(&self, memo: &ContinuityMemo) -> LayoutResult {
        let request = &self.request;
        LayoutResult {
            generation: self.generation,
            nodes: compute_layout(
                request.mode,
                &request.items,
                request.seed,
                memo,
                &request.canvas,
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LayoutResult {
    pub generation: u64,
    pub nodes: Vec<LayoutNode>,
}

/// Hands out increasing generations and defers jobs to the next `tick`.
#[derive(Debug, Default)]
pub struct LayoutScheduler {
    latest: u64,
    queue: VecDeque<LayoutJob>,
}

impl LayoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, request: LayoutRequest) -> u64 {
        let generation = self.next_generation();
        self.queue.push_back(LayoutJob {
            generation,
            request,
        });
        generation
    }

    pub fn immediate(&mut self, request: LayoutRequest) -> LayoutJob {
        LayoutJob {
            generation: self.next_generation(),
            request,
        }
    }

    /// Next job worth running; stale jobs are discarded unrun.
    pub fn next_job(&mut self) -> Option<LayoutJob> {
        while let Some(job) = self.queue.pop_front() {
            if self.is_current(job.generation) {
                return Some(job);
            }
            tracing::debug!(
                generation = job.generation,
                latest = self.latest,
                "dropping stale layout job"
            );
        }
        None
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn processing(&self) -> bool {
        self.queue
            .iter()
            .any(|job| job.generation == self.latest)
    }

    fn next_generation(&mut self) -> u64 {
        self.latest = self.latest.wrapping_add(1);
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(seed: u64) -> LayoutRequest {
        LayoutRequest {
            mode: LayoutMode::Scatter,
            items: Vec::new(),
            seed,
            canvas: CanvasConfig::default(),
        }
    }

    #[test]
    fn generations_increase() {
        let mut scheduler = LayoutScheduler::new();
        let first = scheduler.defer(request(1));
        let second = scheduler.immediate(request(2)).generation;
        assert!(second > first);
        assert_eq!(scheduler.latest(), second);
    }

    #[test]
    fn only_latest_deferred_job_runs() {
        let mut scheduler = LayoutScheduler::new();
        scheduler.defer(request(1));
        scheduler.defer(request(2));
        let latest = scheduler.defer(request(3));
        assert!(scheduler.processing());

        let job = scheduler.next_job().unwrap();
        assert_eq!(job.generation, latest);
        assert_eq!(job.request.seed, 3);
        assert!(scheduler.next_job().is_none());
        assert!(!scheduler.processing());
    }

    #[test]
    fn immediate_request_supersedes_queue() {
        let mut scheduler = LayoutScheduler::new();
        scheduler.defer(request(1));
        let job = scheduler.immediate(request(2));
        assert!(!scheduler.processing());
        assert!(scheduler.next_job().is_none());
        assert!(scheduler.is_current(job.generation));
    }

    #[test]
    fn results_carry_their_generation() {
        let mut scheduler = LayoutScheduler::new();
        scheduler.defer(request(4));
        let job = scheduler.next_job().unwrap();
        let result = job.run(&ContinuityMemo::new());
        assert_eq!(result.generation, job.generation);
        assert!(result.nodes.is_empty());
    }
}

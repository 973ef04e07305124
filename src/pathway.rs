//! Progress through the four pathway steps, held as an explicit value

use serde::{Deserialize, Serialize};

use crate::pillar::{Pillar, PillarResponses};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayState {
    pub responses: PillarResponses,
}

impl PathwayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_responses(responses: PillarResponses) -> Self {
        Self { responses }
    }

    /// Re-submitting a step replaces its answers
    pub fn submit_step(mut self, pillar: Pillar, answers: impl IntoIterator<Item = String>) -> Self {
        let cleaned: Vec<String> = answers
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        self.responses.set(pillar, cleaned);
        self
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn is_pillar_complete(&self, pillar: Pillar) -> bool {
        !self.responses.get(pillar).is_empty()
    }

    pub fn completed(&self) -> Vec<Pillar> {
        Pillar::ALL
            .into_iter()
            .filter(|p| self.is_pillar_complete(*p))
            .collect()
    }

    /// First unanswered step in canonical order
    pub fn next_step(&self) -> Option<Pillar> {
        Pillar::ALL
            .into_iter()
            .find(|p| !self.is_pillar_complete(*p))
    }

    pub fn is_complete(&self) -> bool {
        self.next_step().is_none()
    }

    pub fn progress_fraction(&self) -> f32 {
        self.completed().len() as f32 / Pillar::ALL.len() as f32
    }
}

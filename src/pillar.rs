//! The four ikigai pillars and the per-pillar response lists

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IkigaiError;

/// One of the four ikigai dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Love,
    GoodAt,
    WorldNeeds,
    PaidFor,
}

impl Pillar {
    /// Canonical step order of the pathway
    pub const ALL: [Pillar; 4] = [
        Pillar::Love,
        Pillar::GoodAt,
        Pillar::WorldNeeds,
        Pillar::PaidFor,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Pillar::Love => "love",
            Pillar::GoodAt => "good_at",
            Pillar::WorldNeeds => "world_needs",
            Pillar::PaidFor => "paid_for",
        }
    }

    /// Human-readable form used in prompts ("Good At")
    pub fn title(self) -> &'static str {
        match self {
            Pillar::Love => "Love",
            Pillar::GoodAt => "Good At",
            Pillar::WorldNeeds => "World Needs",
            Pillar::PaidFor => "Paid For",
        }
    }

    /// Outer chart label, two lines
    pub fn chart_label(self) -> &'static str {
        match self {
            Pillar::Love => "What you\nLOVE",
            Pillar::GoodAt => "What you are\nGOOD AT",
            Pillar::WorldNeeds => "What the\nWORLD NEEDS",
            Pillar::PaidFor => "What you can be\nPAID FOR",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Pillar {
    type Err = IkigaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "love" => Ok(Pillar::Love),
            "good_at" => Ok(Pillar::GoodAt),
            "world_needs" => Ok(Pillar::WorldNeeds),
            "paid_for" => Ok(Pillar::PaidFor),
            _ => Err(IkigaiError::UnknownPillar { key: s.to_string() }),
        }
    }
}

/// Loose, string-keyed shape accepted at API boundaries
pub type LooseResponses = BTreeMap<String, Vec<String>>;

/// Ordered responses per pillar. Missing pillars read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LooseResponses", into = "LooseResponses")]
pub struct PillarResponses {
    entries: BTreeMap<Pillar, Vec<String>>,
}

impl PillarResponses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from string keys, dropping keys that are not pillars
    pub fn from_loose(loose: LooseResponses) -> Self {
        let mut out = Self::new();
        for (key, items) in loose {
            match key.parse::<Pillar>() {
                Ok(pillar) => out.set(pillar, items),
                Err(_) => tracing::debug!("Ignoring unknown pillar key '{}'", key),
            }
        }
        out
    }

    pub fn with(mut self, pillar: Pillar, items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.set(pillar, items.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the list for one pillar
    pub fn set(&mut self, pillar: Pillar, items: Vec<String>) {
        self.entries.insert(pillar, items);
    }

    pub fn push(&mut self, pillar: Pillar, item: impl Into<String>) {
        self.entries.entry(pillar).or_default().push(item.into());
    }

    pub fn get(&self, pillar: Pillar) -> &[String] {
        self.entries.get(&pillar).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self, pillar: Pillar) {
        self.entries.remove(&pillar);
    }

    pub fn is_empty(&self) -> bool {
        Pillar::ALL.iter().all(|p| self.get(*p).is_empty())
    }

    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Pillars with at least one response, in canonical order
    pub fn answered(&self) -> Vec<Pillar> {
        Pillar::ALL
            .into_iter()
            .filter(|p| !self.get(*p).is_empty())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pillar, &[String])> {
        Pillar::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

impl From<LooseResponses> for PillarResponses {
    fn from(loose: LooseResponses) -> Self {
        Self::from_loose(loose)
    }
}

impl From<PillarResponses> for LooseResponses {
    fn from(responses: PillarResponses) -> Self {
        Pillar::ALL
            .into_iter()
            .map(|p| (p.key().to_string(), responses.get(p).to_vec()))
            .collect()
    }
}

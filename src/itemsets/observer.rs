//! Mining Observer

/// Observer notified as a miner moves through levels.
///
/// Levels are numbered by itemset size, starting at 1. For each level the miner reports the
/// number of candidates it will count, then the number that turned out frequent.
pub trait MiningObserver {
    /// Called before the candidates of `level` are counted.
    fn on_level_candidates(&mut self, level: usize, candidates: usize);

    /// Called once the frequent itemsets of `level` are final.
    fn on_level_frequent(&mut self, level: usize, frequent: usize);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MiningObserver for NoopObserver {
    fn on_level_candidates(&mut self, _level: usize, _candidates: usize) {}

    fn on_level_frequent(&mut self, _level: usize, _frequent: usize) {}
}

/// Candidate and frequent counts for one level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    /// Itemset size
    pub level: usize,

    /// Candidates counted
    pub candidates: usize,

    /// Candidates meeting the minimum support
    pub frequent: usize,
}

/// Observer collecting a [`LevelSummary`] per level.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LevelRecorder {
    levels: Vec<LevelSummary>,
}

impl LevelRecorder {
    /// Recorded levels, in mining order.
    pub fn levels(&self) -> &[LevelSummary] {
        &self.levels
    }

    fn summary_mut(&mut self, level: usize) -> Option<&mut LevelSummary> {
        if !self.levels.iter().any(|summary| summary.level == level) {
            self.levels.push(LevelSummary {
                level,
                ..LevelSummary::default()
            });
        }

        self.levels
            .iter_mut()
            .find(|summary| summary.level == level)
    }
}

impl MiningObserver for LevelRecorder {
    fn on_level_candidates(&mut self, level: usize, candidates: usize) {
        if let Some(summary) = self.summary_mut(level) {
            summary.candidates = candidates;
        }
    }

    fn on_level_frequent(&mut self, level: usize, frequent: usize) {
        if let Some(summary) = self.summary_mut(level) {
            summary.frequent = frequent;
        }
    }
}

//! The progression evaluator.

use tracing::info;

use super::{UnlockDelta, UnlockRule};
use crate::content::WorldBible;
use crate::error::CommitError;
use crate::mechanics::LifeRecord;
use crate::world_state::{CommitReport, WorldState, WorldStore};

/// Runs a fixed, ordered list of unlock rules against committed state.
#[derive(Debug, Clone, Default)]
pub struct ProgressionEvaluator {
    rules: Vec<UnlockRule>,
}

impl ProgressionEvaluator {
    pub fn new(rules: Vec<UnlockRule>) -> Self {
        Self { rules }
    }

    pub fn from_bible(bible: &WorldBible) -> Self {
        Self::new(bible.rules.clone())
    }

    pub fn rules(&self) -> &[UnlockRule] {
        &self.rules
    }

    /// Compute the unlocks that newly hold for `state`.
    ///
    /// Pure: the input is not modified. Passes repeat until nothing new
    /// unlocks, so a rule gated on something unlocked earlier in the same
    /// evaluation is still reported. Targets already unlocked are never
    /// reported again.
    pub fn evaluate(&self, state: &WorldState) -> UnlockDelta {
        let mut scratch = state.clone();
        let mut delta = UnlockDelta::default();

        loop {
            let mut progressed = false;
            for rule in &self.rules {
                if rule.unlocks.is_unlocked_in(&scratch) || !rule.when.holds(&scratch) {
                    continue;
                }
                rule.unlocks.apply_to(&mut scratch);
                delta.push(rule.id.clone(), rule.unlocks.clone());
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        delta
    }

    /// Commit a finished life and fold in the unlocks it earns, atomically.
    pub fn settle(&self, store: &mut WorldStore, record: &LifeRecord) -> Result<CommitReport, CommitError> {
        let report = store.commit_with(record, |staged| self.evaluate(staged))?;
        for unlocked in &report.unlocks.unlocked {
            info!(rule = %unlocked.rule, target = %unlocked.target, "Unlocked");
        }
        Ok(report)
    }
}

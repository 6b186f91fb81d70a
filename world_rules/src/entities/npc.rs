//! Non-player character definitions.

use serde::{Deserialize, Serialize};

use super::NpcId;
use crate::world_state::NpcMemory;

/// An NPC as authored in the world bible.
///
/// Dialogue is organised in stages. Progression rules move an NPC's stage
/// pointer forward; within a stage, lines rotate with each conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcDef {
    pub id: NpcId,
    pub name: String,
    /// Stage index -> lines spoken at that stage.
    pub dialogue: Vec<Vec<String>>,
}

impl NpcDef {
    /// Create an NPC with a single dialogue stage.
    pub fn new(id: impl Into<NpcId>, name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dialogue: vec![lines],
        }
    }

    /// Add another dialogue stage.
    pub fn with_stage(mut self, lines: Vec<String>) -> Self {
        self.dialogue.push(lines);
        self
    }

    /// The line this NPC says given what it remembers of the player.
    ///
    /// Stages past the last authored one reuse the last stage.
    pub fn line(&self, memory: &NpcMemory) -> String {
        let Some(last) = self.dialogue.len().checked_sub(1) else {
            return format!("Hello, I'm {}!", self.name);
        };
        let stage = &self.dialogue[(memory.stage as usize).min(last)];
        if stage.is_empty() {
            return format!("Hello, I'm {}!", self.name);
        }
        stage[memory.visits as usize % stage.len()].clone()
    }
}

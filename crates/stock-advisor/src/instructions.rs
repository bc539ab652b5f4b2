//! Analysis instructions shared by every stage

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};

/// Instructions used when none are supplied
pub const DEFAULT_INSTRUCTIONS: [&str; 2] = [
    "Synthesize data from financial, technical, and market research agents",
    "Provide comprehensive stock analysis and recommendations",
];

/// Ordered list of free-text instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionSet {
    items: Vec<String>,
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self {
            items: DEFAULT_INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InstructionSet {
    /// Start from the default instructions
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary text, dropping blank entries
    pub fn from_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self { items: Vec::new() };
        for item in items {
            set.add(item.as_ref());
        }
        set
    }

    /// Append an instruction; returns false when the text is blank
    pub fn add(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.items.push(text.to_string());
        true
    }

    /// Remove the instruction at `index` (0-based)
    ///
    /// The last remaining instruction cannot be removed.
    pub fn remove(&mut self, index: usize) -> Result<String> {
        if self.items.len() <= 1 {
            return Err(AdvisorError::InstructionError(
                "at least one instruction must remain".to_string(),
            ));
        }
        if index >= self.items.len() {
            return Err(AdvisorError::InstructionError(format!(
                "no instruction at position {}, there are {}",
                index + 1,
                self.items.len()
            )));
        }
        Ok(self.items.remove(index))
    }

    /// Restore the defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Instructions joined with a single space, as sent to the model
    pub fn joined(&self) -> String {
        self.items.join(" ")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

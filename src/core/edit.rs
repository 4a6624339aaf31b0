//! Operator edit buffer and its conversion to register values.
use serde::{Deserialize, Serialize};

use crate::protocol::{RegisterSetting, RegisterValues, REGISTER_COUNT};

/// How raw edit text is turned into register values on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPolicy {
    /// Empty or unparsable entries become 0. Unparsable text is logged.
    #[default]
    Permissive,
    /// Empty entries become 0; unparsable text rejects the whole submit.
    Strict,
}

/// An entry that could not be converted under [`CoercionPolicy::Strict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    pub index: usize,
    pub text: String,
}

/// Raw operator input, one entry per register. Text is stored verbatim so
/// partially typed numbers survive until submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    entries: [String; REGISTER_COUNT],
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Replace entry `index`. Returns `false` when the index is out of range.
    pub fn set(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                *entry = text.into();
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[String; REGISTER_COUNT] {
        &self.entries
    }

    /// Convert every entry to a register value under `policy`.
    pub fn to_values(&self, policy: CoercionPolicy) -> Result<RegisterValues, InvalidEntry> {
        let mut values = [0u16; REGISTER_COUNT];
        for (index, text) in self.entries.iter().enumerate() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            match trimmed.parse::<u16>() {
                Ok(value) => values[index] = value,
                Err(_) if policy == CoercionPolicy::Permissive => {
                    let label = RegisterSetting::from_index(index)
                        .map(|s| s.to_string())
                        .unwrap_or_default();
                    log::warn!("{label}: {text:?} is not a register value, sending 0");
                }
                Err(_) => {
                    return Err(InvalidEntry {
                        index,
                        text: text.clone(),
                    })
                }
            }
        }
        Ok(values)
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Validate;
use crate::replay::{DEFAULT_MAX_ACTIONS, DEFAULT_MAX_DURATION, ReplayLimits};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub max_actions: u32,
    pub max_duration_ms: u64,
    pub bot_max_moves: u32,
    pub log_prefix: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_actions: DEFAULT_MAX_ACTIONS as u32,
            max_duration_ms: DEFAULT_MAX_DURATION.as_millis() as u64,
            bot_max_moves: 500,
            log_prefix: None,
        }
    }
}

impl VerifierConfig {
    pub fn limits(&self) -> ReplayLimits {
        ReplayLimits {
            max_actions: self.max_actions as usize,
            max_duration: Duration::from_millis(self.max_duration_ms),
        }
    }
}

impl Validate for VerifierConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_actions < 1 || self.max_actions > 100_000 {
            return Err(format!(
                "Max actions must be between 1 and 100000, got {}",
                self.max_actions
            ));
        }
        if self.max_duration_ms < 1_000 || self.max_duration_ms > 3_600_000 {
            return Err(format!(
                "Max duration must be between 1000ms and 3600000ms, got {}",
                self.max_duration_ms
            ));
        }
        if self.bot_max_moves < 1 || self.bot_max_moves > self.max_actions {
            return Err(format!(
                "Bot max moves must be between 1 and max actions ({}), got {}",
                self.max_actions, self.bot_max_moves
            ));
        }
        if let Some(prefix) = &self.log_prefix
            && prefix.trim().is_empty()
        {
            return Err("Log prefix must not be blank".to_string());
        }
        Ok(())
    }
}

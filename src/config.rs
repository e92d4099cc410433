// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::SchedResult;
use crate::error::SchedulerError;

/// 180 days.
const SIX_MONTHS_IN_MINUTES: f64 = 180.0 * 24.0 * 60.0;

/// Tunable constants of the scheduling model. Every field has a default, so
/// a TOML file only needs to name the values it changes.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Lower bound of the difficulty score.
    pub min_difficulty: f64,
    /// Upper bound of the difficulty score.
    pub max_difficulty: f64,
    /// Difficulty assigned to a newly created card.
    pub initial_difficulty: f64,
    /// Interval after a miss, and after the first correct answer.
    pub base_interval_minutes: f64,
    /// Each additional correct answer in a streak multiplies the interval by
    /// this factor.
    pub growth_factor: f64,
    /// Flat amount subtracted from the difficulty on a miss.
    pub penalty_factor: f64,
    /// Fraction of the remaining headroom (`max_difficulty - difficulty`)
    /// added on a correct answer.
    pub step_up_ratio: f64,
    /// Intervals never exceed this.
    pub max_interval_minutes: f64,
    /// Cards at or below this difficulty are selected by the "difficult"
    /// study mode.
    pub difficult_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_difficulty: 0.0,
            max_difficulty: 5.0,
            initial_difficulty: 0.0,
            base_interval_minutes: 10.0,
            growth_factor: 2.0,
            penalty_factor: 0.5,
            step_up_ratio: 0.2,
            max_interval_minutes: SIX_MONTHS_IN_MINUTES,
            difficult_threshold: 2.0,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> SchedResult<()> {
        let fields = [
            ("min_difficulty", self.min_difficulty),
            ("max_difficulty", self.max_difficulty),
            ("initial_difficulty", self.initial_difficulty),
            ("base_interval_minutes", self.base_interval_minutes),
            ("growth_factor", self.growth_factor),
            ("penalty_factor", self.penalty_factor),
            ("step_up_ratio", self.step_up_ratio),
            ("max_interval_minutes", self.max_interval_minutes),
            ("difficult_threshold", self.difficult_threshold),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return invalid(format!("{name} must be a finite number"));
            }
        }
        if self.min_difficulty >= self.max_difficulty {
            return invalid("min_difficulty must be less than max_difficulty");
        }
        if self.initial_difficulty < self.min_difficulty
            || self.initial_difficulty > self.max_difficulty
        {
            return invalid("initial_difficulty must lie within the difficulty bounds");
        }
        if self.base_interval_minutes <= 0.0 {
            return invalid("base_interval_minutes must be positive");
        }
        if self.growth_factor < 1.0 {
            return invalid("growth_factor must be at least 1");
        }
        if self.penalty_factor < 0.0 {
            return invalid("penalty_factor must not be negative");
        }
        if !(0.0..=1.0).contains(&self.step_up_ratio) {
            return invalid("step_up_ratio must lie within [0, 1]");
        }
        if self.max_interval_minutes < self.base_interval_minutes {
            return invalid("max_interval_minutes must be at least base_interval_minutes");
        }
        Ok(())
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(s: &str) -> Fallible<Self> {
        let config: SchedulerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a TOML file.
    pub fn load(path: &Path) -> Fallible<Self> {
        log::debug!("Loading scheduler config from {}", path.display());
        let content = read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn invalid(message: impl Into<String>) -> SchedResult<()> {
    Err(SchedulerError::InvalidConfig(message.into()))
}

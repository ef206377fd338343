//! Tunable engine configuration.
//!
//! The engine adapts to how many rounds remain. [`StageBands`] maps rounds remaining onto a
//! [`Stage`], and each stage carries its own search budget and heuristic weights.

use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Early,
    Midgame,
    Endgame,
}

impl Stage {
    /// Ordered from the opening towards the last round.
    pub const ORDER: [Stage; 3] = [Stage::Early, Stage::Midgame, Stage::Endgame];

    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Early => "early",
            Stage::Midgame => "midgame",
            Stage::Endgame => "endgame",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive upper bounds on rounds remaining for the later stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageBands {
    /// Rounds remaining at or below this value are endgame (default: 4)
    pub endgame_max: usize,
    /// Rounds remaining at or below this value, above the endgame band, are midgame (default: 7)
    pub midgame_max: usize,
}

impl Default for StageBands {
    fn default() -> Self {
        Self {
            endgame_max: 4,
            midgame_max: 7,
        }
    }
}

impl StageBands {
    pub fn stage_for(&self, rounds_remaining: usize) -> Stage {
        if rounds_remaining <= self.endgame_max {
            Stage::Endgame
        } else if rounds_remaining <= self.midgame_max {
            Stage::Midgame
        } else {
            Stage::Early
        }
    }
}

/// Depth in rounds and number of sampled opponent hands for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    pub depth: usize,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSchedule {
    pub early: SearchBudget,
    pub midgame: SearchBudget,
    pub endgame: SearchBudget,
}

impl Default for SearchSchedule {
    fn default() -> Self {
        Self {
            early: SearchBudget {
                depth: 3,
                samples: 5,
            },
            midgame: SearchBudget {
                depth: 4,
                samples: 7,
            },
            endgame: SearchBudget {
                depth: 5,
                samples: 7,
            },
        }
    }
}

impl SearchSchedule {
    pub fn for_stage(&self, stage: Stage) -> SearchBudget {
        match stage {
            Stage::Early => self.early,
            Stage::Midgame => self.midgame,
            Stage::Endgame => self.endgame,
        }
    }
}

/// Per-signal weights of the heuristic evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub score: f64,
    pub high_card: f64,
    pub top_card: f64,
    pub card_count: f64,
    pub spread: f64,
    pub hand_value: f64,
}

impl SignalWeights {
    /// Every weight paired with its signal name, score first.
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("score", self.score),
            ("high_card", self.high_card),
            ("top_card", self.top_card),
            ("card_count", self.card_count),
            ("spread", self.spread),
            ("hand_value", self.hand_value),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightTable {
    pub early: SignalWeights,
    pub midgame: SignalWeights,
    pub endgame: SignalWeights,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            early: SignalWeights {
                score: 1.0,
                high_card: 1.5,
                top_card: 2.0,
                card_count: 1.5,
                spread: 0.05,
                hand_value: 0.12,
            },
            midgame: SignalWeights {
                score: 4.0,
                high_card: 2.0,
                top_card: 3.0,
                card_count: 1.0,
                spread: 0.05,
                hand_value: 0.08,
            },
            endgame: SignalWeights {
                score: 10.0,
                high_card: 1.2,
                top_card: 1.5,
                card_count: 0.5,
                spread: 0.05,
                hand_value: 0.04,
            },
        }
    }
}

impl WeightTable {
    pub fn for_stage(&self, stage: Stage) -> &SignalWeights {
        match stage {
            Stage::Early => &self.early,
            Stage::Midgame => &self.midgame,
            Stage::Endgame => &self.endgame,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bands: StageBands,
    pub schedule: SearchSchedule,
    pub weights: WeightTable,
    /// Alpha-beta cutoffs; turning them off only costs nodes (default: true)
    pub pruning: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bands: StageBands::default(),
            schedule: SearchSchedule::default(),
            weights: WeightTable::default(),
            pruning: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("stage bands require 1 <= endgame_max ({endgame_max}) < midgame_max ({midgame_max})")]
    InvalidBands {
        endgame_max: usize,
        midgame_max: usize,
    },
    #[error("{stage} search depth must be at least one round")]
    ZeroDepth { stage: Stage },
    #[error("{stage} search must draw at least one sample")]
    ZeroSamples { stage: Stage },
    #[error("{field} shrinks from {from} to {to}")]
    NonMonotoneSchedule {
        field: &'static str,
        from: Stage,
        to: Stage,
    },
    #[error("{stage} weight `{signal}` must be finite and non-negative, got {value}")]
    InvalidWeight {
        stage: Stage,
        signal: &'static str,
        value: f64,
    },
    #[error("{stage} score weight must be positive")]
    NonPositiveScoreWeight { stage: Stage },
    #[error("score weight loses ground to `{signal}` between {from} and {to}")]
    ScoreDominanceDecreases {
        signal: &'static str,
        from: Stage,
        to: Stage,
    },
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bands = self.bands;
        if bands.endgame_max == 0 || bands.endgame_max >= bands.midgame_max {
            return Err(ConfigError::InvalidBands {
                endgame_max: bands.endgame_max,
                midgame_max: bands.midgame_max,
            });
        }

        for stage in Stage::ORDER {
            let budget = self.schedule.for_stage(stage);
            if budget.depth == 0 {
                return Err(ConfigError::ZeroDepth { stage });
            }
            if budget.samples == 0 {
                return Err(ConfigError::ZeroSamples { stage });
            }

            let weights = self.weights.for_stage(stage);
            for (signal, value) in weights.named() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidWeight {
                        stage,
                        signal,
                        value,
                    });
                }
            }
            if weights.score <= 0.0 {
                return Err(ConfigError::NonPositiveScoreWeight { stage });
            }
        }

        for pair in Stage::ORDER.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let earlier = self.schedule.for_stage(from);
            let later = self.schedule.for_stage(to);
            if later.depth < earlier.depth {
                return Err(ConfigError::NonMonotoneSchedule {
                    field: "depth",
                    from,
                    to,
                });
            }
            if later.samples < earlier.samples {
                return Err(ConfigError::NonMonotoneSchedule {
                    field: "samples",
                    from,
                    to,
                });
            }

            // score/w must not shrink; cross-multiplied so zero weights need no special case
            let earlier_w = self.weights.for_stage(from);
            let later_w = self.weights.for_stage(to);
            for ((signal, early_value), (_, late_value)) in
                earlier_w.named().into_iter().zip(later_w.named()).skip(1)
            {
                if earlier_w.score * late_value > later_w.score * early_value {
                    return Err(ConfigError::ScoreDominanceDecreases { signal, from, to });
                }
            }
        }

        Ok(())
    }
}

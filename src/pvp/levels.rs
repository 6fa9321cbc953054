// Per-level CP multiplier table.
//
// Integer levels come straight from the table. A half level L+0.5 uses the
// quadratic mean of its neighbours: sqrt((m(L)^2 + m(L+1)^2) / 2).

use crate::error::GameDataError;

pub const MIN_LEVEL: f64 = 1.0;
pub const MAX_LEVEL: f64 = 51.0;

/// Every level a creature can sit at, ascending in half steps (1.0, 1.5, ... 51.0).
pub fn level_ladder() -> impl DoubleEndedIterator<Item = f64> {
    (2u32..=102).map(|half_steps| f64::from(half_steps) / 2.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelMultiplierTable {
    // index 0 holds level 1
    by_level: Vec<f64>,
}

impl LevelMultiplierTable {
    /// Builds a table from the multipliers for levels 1, 2, 3, ...
    ///
    /// Values must be finite, positive and strictly increasing.
    pub fn new(values: Vec<f64>) -> Result<Self, GameDataError> {
        if let Some(bad) = values.iter().position(|m| !m.is_finite() || *m <= 0.0) {
            return Err(GameDataError::InvalidMultipliers(format!(
                "level {} has non-positive multiplier {}",
                bad + 1,
                values[bad]
            )));
        }
        if let Some(i) = values.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GameDataError::InvalidMultipliers(format!(
                "multipliers not increasing at level {}",
                i + 2
            )));
        }
        Ok(Self { by_level: values })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }

    /// Number of integer levels covered.
    pub fn len(&self) -> usize {
        self.by_level.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.by_level
    }

    /// Multiplier for an integer or half level, `None` when the table cannot answer.
    pub fn multiplier(&self, level: f64) -> Option<f64> {
        if !level.is_finite() || level < MIN_LEVEL {
            return None;
        }
        let whole = level.floor();
        let frac = level - whole;
        if frac == 0.0 {
            return self.at_integer(whole as usize);
        }
        if (frac - 0.5).abs() > f64::EPSILON {
            return None;
        }
        let lower = self.at_integer(whole as usize)?;
        let upper = self.at_integer(whole as usize + 1)?;
        Some(((lower * lower + upper * upper) / 2.0).sqrt())
    }

    fn at_integer(&self, level: usize) -> Option<f64> {
        level.checked_sub(1).and_then(|i| self.by_level.get(i).copied())
    }
}

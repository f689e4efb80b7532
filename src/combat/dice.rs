//! Dice notation parsing and rolling
//!
//! Accepts standard tabletop notation like "2d6+3", "d20", "4d8-2".
//! Rolls keep the individual die results so viewers can see the full
//! breakdown, not just the total.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Upper bound on dice per roll
pub const MAX_COUNT: u32 = 100;
/// Upper bound on sides per die
pub const MAX_SIDES: u32 = 1000;

static NOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d*)[dD](\d+)\s*(?:([+-])\s*(\d+))?\s*$").unwrap());

/// Dice parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("unrecognized dice notation: {0}")]
    Notation(String),

    #[error("dice count must be between 1 and 100")]
    Count,

    #[error("die sides must be between 1 and 1000")]
    Sides,
}

/// A parsed dice expression: count, sides, and flat modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

/// One resolved roll: each die plus the modified total
#[derive(Debug, Clone, Serialize)]
pub struct RollOutcome {
    pub rolls: Vec<u32>,
    pub total: i32,
}

impl DiceExpr {
    /// Roll each die and total the results with the modifier applied
    pub fn roll(&self) -> RollOutcome {
        let mut rng = rand::rng();
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.random_range(1..=self.sides))
            .collect();
        let total = rolls.iter().sum::<u32>() as i32 + self.modifier;

        RollOutcome { rolls, total }
    }

    /// Lowest possible total
    pub fn min(&self) -> i32 {
        self.count as i32 + self.modifier
    }

    /// Highest possible total
    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.modifier
    }
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = NOTATION_RE
            .captures(s)
            .ok_or_else(|| DiceError::Notation(s.trim().to_string()))?;

        // An empty count means a single die ("d20" == "1d20")
        let count: u32 = match &caps[1] {
            "" => 1,
            digits => digits.parse().map_err(|_| DiceError::Count)?,
        };
        if count == 0 || count > MAX_COUNT {
            return Err(DiceError::Count);
        }

        let sides: u32 = caps[2].parse().map_err(|_| DiceError::Sides)?;
        if sides == 0 || sides > MAX_SIDES {
            return Err(DiceError::Sides);
        }

        let modifier = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(digits)) => {
                let value: i32 = digits
                    .as_str()
                    .parse()
                    .map_err(|_| DiceError::Notation(s.trim().to_string()))?;
                if sign.as_str() == "-" {
                    -value
                } else {
                    value
                }
            }
            _ => 0,
        };

        Ok(DiceExpr {
            count,
            sides,
            modifier,
        })
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

// League brackets and their CP ceilings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PvpError;

/// A ranked league. The set is closed: GL, UL and ML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bracket {
    #[serde(rename = "GL")]
    Great,
    #[serde(rename = "UL")]
    Ultra,
    #[serde(rename = "ML")]
    Master,
}

impl Bracket {
    pub const ALL: [Bracket; 3] = [Bracket::Great, Bracket::Ultra, Bracket::Master];

    pub fn cp_cap(self) -> u32 {
        match self {
            Bracket::Great => 1500,
            Bracket::Ultra => 2500,
            Bracket::Master => 10000,
        }
    }

    /// Short code used by clients and ranking file names ("GL", "UL", "ML").
    pub fn code(self) -> &'static str {
        match self {
            Bracket::Great => "GL",
            Bracket::Ultra => "UL",
            Bracket::Master => "ML",
        }
    }
}

impl FromStr for Bracket {
    type Err = PvpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GL" => Ok(Bracket::Great),
            "UL" => Ok(Bracket::Ultra),
            "ML" => Ok(Bracket::Master),
            _ => Err(PvpError::UnknownBracket(s.to_string())),
        }
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

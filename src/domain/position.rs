use crate::error::LaurelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse position grouping used for quota-based selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleCategory {
    Defenders,
    Midfielders,
    Forwards,
    Goalkeeper,
}

impl RoleCategory {
    /// Fixed roster order: defenders first, keeper last
    pub const ALL: [RoleCategory; 4] = [
        RoleCategory::Defenders,
        RoleCategory::Midfielders,
        RoleCategory::Forwards,
        RoleCategory::Goalkeeper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCategory::Defenders => "DEFENDERS",
            RoleCategory::Midfielders => "MIDFIELDERS",
            RoleCategory::Forwards => "FORWARDS",
            RoleCategory::Goalkeeper => "GOALKEEPER",
        }
    }
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained position code recorded on a match diary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    // Goalkeeper
    Gk,
    // Defenders
    Cb,
    Lcb,
    Rcb,
    Rb,
    Lb,
    Rwb,
    Lwb,
    Sw,
    // Midfielders
    Cdm,
    Dm,
    Cm,
    Lcm,
    Rcm,
    Cam,
    Am,
    Lm,
    Rm,
    // Forwards
    Lw,
    Rw,
    Cf,
    St,
    Ss,
    Lf,
    Rf,
}

impl Position {
    pub const ALL: [Position; 25] = [
        Position::Gk,
        Position::Cb,
        Position::Lcb,
        Position::Rcb,
        Position::Rb,
        Position::Lb,
        Position::Rwb,
        Position::Lwb,
        Position::Sw,
        Position::Cdm,
        Position::Dm,
        Position::Cm,
        Position::Lcm,
        Position::Rcm,
        Position::Cam,
        Position::Am,
        Position::Lm,
        Position::Rm,
        Position::Lw,
        Position::Rw,
        Position::Cf,
        Position::St,
        Position::Ss,
        Position::Lf,
        Position::Rf,
    ];

    /// The category this position is ranked in. Exhaustive by construction.
    pub fn category(&self) -> RoleCategory {
        use Position::*;
        match self {
            Gk => RoleCategory::Goalkeeper,
            Cb | Lcb | Rcb | Rb | Lb | Rwb | Lwb | Sw => RoleCategory::Defenders,
            Cdm | Dm | Cm | Lcm | Rcm | Cam | Am | Lm | Rm => RoleCategory::Midfielders,
            Lw | Rw | Cf | St | Ss | Lf | Rf => RoleCategory::Forwards,
        }
    }

    pub fn code(&self) -> &'static str {
        use Position::*;
        match self {
            Gk => "GK",
            Cb => "CB",
            Lcb => "LCB",
            Rcb => "RCB",
            Rb => "RB",
            Lb => "LB",
            Rwb => "RWB",
            Lwb => "LWB",
            Sw => "SW",
            Cdm => "CDM",
            Dm => "DM",
            Cm => "CM",
            Lcm => "LCM",
            Rcm => "RCM",
            Cam => "CAM",
            Am => "AM",
            Lm => "LM",
            Rm => "RM",
            Lw => "LW",
            Rw => "RW",
            Cf => "CF",
            St => "ST",
            Ss => "SS",
            Lf => "LF",
            Rf => "RF",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Position {
    type Err = LaurelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Position::ALL
            .iter()
            .copied()
            .find(|p| p.code() == normalized)
            .ok_or_else(|| LaurelError::UnknownPosition(s.to_string()))
    }
}

impl TryFrom<String> for Position {
    type Error = LaurelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(value: Position) -> Self {
        value.code().to_string()
    }
}

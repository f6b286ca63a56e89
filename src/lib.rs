pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ranking;
pub mod services;

pub use config::AppConfig;
pub use domain::{AwardKey, AwardKind, AwardPayload, AwardRecord, GroupKey, MatchFact, Position, RoleCategory, Window};
pub use error::{LaurelError, Result};
pub use services::{RankingEngine, RunSummary};

pub mod collector;
pub mod engine;
pub mod issuer;
pub mod notifier;

pub use collector::{CollectedFacts, FactCollector};
pub use engine::{build_selection, EngineSettings, MatchWinner, RankingEngine, RunSummary, Selection};
pub use issuer::{AwardIssuer, Issued};
pub use notifier::{Delivery, FanOutReport, NotificationFanout};

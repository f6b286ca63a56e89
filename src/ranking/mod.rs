//! Pure scoring and selection
//!
//! Everything in this module is synchronous and free of I/O:
//! - `calculator`: per-match performance score
//! - `aggregator`: window aggregation into `AggregatedEntry`
//! - `ranker`: per-category top-N
//! - `composite`: composite team per group
//! - `winner`: single-winner selection per match

pub mod aggregator;
pub mod calculator;
pub mod composite;
pub mod ranker;
pub mod winner;

pub use aggregator::{aggregate, aggregate_scored, merge_facts, score_facts, AggregatedEntry, Aggregation, ScoredFact};
pub use calculator::{match_score, result_bonus};
pub use composite::{select_composite_team, select_teams, GroupSelection};
pub use ranker::{rank_category, sort_ranked};
pub use winner::{nominees_by_match, select_winner, Nominee, Winner};

//! Category ranker

use super::aggregator::AggregatedEntry;
use crate::domain::RoleCategory;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// Sort key: score descending, then player id ascending so reruns reproduce
fn rank_key(entry: &AggregatedEntry) -> (Reverse<OrderedFloat<f64>>, String) {
    (Reverse(OrderedFloat(entry.total_score)), entry.player_id.clone())
}

/// Order entries best-first with the deterministic tie-break
pub fn sort_ranked(entries: &mut [AggregatedEntry]) {
    entries.sort_by_cached_key(rank_key);
}

/// Top `quota` entries of one category.
///
/// Returns fewer than `quota` when the pool is smaller; never pads.
pub fn rank_category(
    entries: &[AggregatedEntry],
    category: RoleCategory,
    quota: usize,
) -> Vec<AggregatedEntry> {
    let mut pool: Vec<AggregatedEntry> = entries
        .iter()
        .filter(|e| e.category == category)
        .cloned()
        .collect();

    sort_ranked(&mut pool);
    pool.truncate(quota);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GroupKey, Window};
    use chrono::NaiveDate;

    fn entry(player: &str, category: RoleCategory, score: f64) -> AggregatedEntry {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        AggregatedEntry {
            player_id: player.to_string(),
            category,
            group: GroupKey::Global,
            total_score: score,
            matches_counted: 1,
            window: Window::new(day, day).unwrap(),
        }
    }

    fn ids(entries: &[AggregatedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.player_id.as_str()).collect()
    }

    #[test]
    fn test_filters_sorts_and_truncates() {
        let entries = vec![
            entry("a", RoleCategory::Forwards, 10.0),
            entry("b", RoleCategory::Forwards, 30.0),
            entry("c", RoleCategory::Defenders, 99.0),
            entry("d", RoleCategory::Forwards, 20.0),
        ];
        let top = rank_category(&entries, RoleCategory::Forwards, 2);
        assert_eq!(ids(&top), vec!["b", "d"]);
    }

    #[test]
    fn test_ties_break_by_player_id() {
        let entries = vec![
            entry("zed", RoleCategory::Midfielders, 15.0),
            entry("amy", RoleCategory::Midfielders, 15.0),
            entry("kim", RoleCategory::Midfielders, 15.0),
        ];
        let top = rank_category(&entries, RoleCategory::Midfielders, 2);
        assert_eq!(ids(&top), vec!["amy", "kim"]);
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let mut entries = vec![
            entry("p3", RoleCategory::Defenders, 5.0),
            entry("p1", RoleCategory::Defenders, 5.0),
            entry("p2", RoleCategory::Defenders, 7.5),
            entry("p4", RoleCategory::Defenders, -3.0),
        ];
        let first = rank_category(&entries, RoleCategory::Defenders, 3);
        entries.reverse();
        let second = rank_category(&entries, RoleCategory::Defenders, 3);
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["p2", "p1", "p3"]);
    }

    #[test]
    fn test_small_pool_is_not_padded() {
        let entries = vec![entry("gk1", RoleCategory::Goalkeeper, 1.0)];
        assert_eq!(rank_category(&entries, RoleCategory::Goalkeeper, 3).len(), 1);
        assert!(rank_category(&entries, RoleCategory::Forwards, 3).is_empty());
        assert!(rank_category(&entries, RoleCategory::Goalkeeper, 0).is_empty());
    }
}

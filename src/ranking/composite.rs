//! Composite-team selection
//!
//! Unions the per-category top-N lists into one roster per group.

use super::aggregator::AggregatedEntry;
use super::ranker::rank_category;
use crate::config::CategoryQuotas;
use crate::domain::{CompositeTeam, GroupKey, RoleCategory, TeamMember};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Outcome of team selection for one group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupSelection {
    Selected(CompositeTeam),
    /// Too few candidates for a meaningful team
    Quiet { group: GroupKey, candidates: usize },
}

/// Rank every category against the current pool and concatenate
fn rank_all(pool: &[AggregatedEntry], quotas: &CategoryQuotas) -> Vec<AggregatedEntry> {
    RoleCategory::ALL
        .into_iter()
        .flat_map(|category| rank_category(pool, category, quotas.for_category(category)))
        .collect()
}

/// Picks of players selected in more than one category, except the
/// higher-scoring one. Equal scores keep the earlier category in roster order.
fn duplicate_picks(picks: &[AggregatedEntry]) -> Vec<(String, RoleCategory)> {
    let mut best: HashMap<&str, &AggregatedEntry> = HashMap::new();
    for pick in picks {
        best.entry(pick.player_id.as_str())
            .and_modify(|current| {
                let better = (OrderedFloat(pick.total_score), Reverse(pick.category))
                    > (OrderedFloat(current.total_score), Reverse(current.category));
                if better {
                    *current = pick;
                }
            })
            .or_insert(pick);
    }

    picks
        .iter()
        .filter(|p| best.get(p.player_id.as_str()).is_some_and(|b| b.category != p.category))
        .map(|p| (p.player_id.clone(), p.category))
        .collect()
}

/// Select the composite team for one group's entries.
///
/// Each category is ranked over all entries and the top lists are
/// concatenated. A player picked in several categories keeps the
/// higher-scoring slot; the other categories are re-ranked without that
/// player so their next candidate fills in. Repeats until no player holds
/// two slots. Exclusions only shrink pools, so a kept slot is never lost.
pub fn select_composite_team(
    entries: &[AggregatedEntry],
    quotas: &CategoryQuotas,
    period_key: &str,
    group: GroupKey,
) -> CompositeTeam {
    let mut excluded: HashSet<(String, RoleCategory)> = HashSet::new();
    let mut picks = rank_all(entries, quotas);

    loop {
        let duplicates = duplicate_picks(&picks);
        if duplicates.is_empty() {
            break;
        }
        debug!("{}: {} players picked twice, back-filling", group, duplicates.len());
        excluded.extend(duplicates);

        let pool: Vec<AggregatedEntry> = entries
            .iter()
            .filter(|e| !excluded.contains(&(e.player_id.clone(), e.category)))
            .cloned()
            .collect();
        picks = rank_all(&pool, quotas);
    }

    for category in RoleCategory::ALL {
        debug!(
            "{} {}: {}/{} selected",
            group,
            category,
            picks.iter().filter(|p| p.category == category).count(),
            quotas.for_category(category)
        );
    }

    CompositeTeam {
        period_key: period_key.to_string(),
        group,
        members: picks
            .into_iter()
            .map(|e| TeamMember {
                player_id: e.player_id,
                category: e.category,
                score: e.total_score,
            })
            .collect(),
    }
}

/// Partition entries by group and select a team for each group that has
/// at least `min_candidates` distinct players
pub fn select_teams(
    entries: &[AggregatedEntry],
    quotas: &CategoryQuotas,
    period_key: &str,
    min_candidates: usize,
) -> Vec<GroupSelection> {
    let mut by_group: BTreeMap<GroupKey, Vec<AggregatedEntry>> = BTreeMap::new();
    for entry in entries {
        by_group.entry(entry.group.clone()).or_default().push(entry.clone());
    }

    by_group
        .into_iter()
        .map(|(group, group_entries)| {
            let candidates = group_entries
                .iter()
                .map(|e| e.player_id.as_str())
                .collect::<HashSet<_>>()
                .len();

            if candidates < min_candidates {
                debug!(
                    "Group {} has {} candidates (< {}), skipping selection",
                    group, candidates, min_candidates
                );
                GroupSelection::Quiet { group, candidates }
            } else {
                GroupSelection::Selected(select_composite_team(
                    &group_entries,
                    quotas,
                    period_key,
                    group,
                ))
            }
        })
        .collect()
}

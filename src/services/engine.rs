//! Ranking & award engine
//!
//! One invocation is one batch job in three phases:
//! 1. compute: collect facts, score, aggregate, select (no writes)
//! 2. issue: conditional insert of every award
//! 3. notify: fan-out, only for awards this run created
//!
//! A failure in phase 1 aborts before anything is written, so the scheduler
//! can retry the whole run safely.
//! A failed insert in phase 2 stops issuance, but the awards created before
//! it are still notified before the error is returned.

use super::collector::FactCollector;
use super::issuer::AwardIssuer;
use super::notifier::{FanOutReport, NotificationFanout};
use crate::adapters::{AwardStore, PlayerDirectory};
use crate::config::{AppConfig, CategoryQuotas, Grouping, ScoringWeights};
use crate::domain::{
    AwardKey, AwardKind, AwardPayload, AwardRecord, GroupKey, IndividualAward, MatchFact, NotificationCategory,
    NotificationTemplate, Window,
};
use crate::error::{LaurelError, Result};
use crate::ranking::{aggregate, nominees_by_match, select_teams, select_winner, Aggregation, GroupSelection, Winner};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Engine tuning taken from configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub weights: ScoringWeights,
    pub quotas: CategoryQuotas,
    pub min_candidates: usize,
    pub vote_weight: f64,
    pub grouping: Grouping,
    pub persist_snapshots: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let config = AppConfig::default_config("");
        Self::from(&config)
    }
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            weights: config.scoring.clone(),
            quotas: config.selection.quotas,
            min_candidates: config.selection.min_candidates,
            vote_weight: config.selection.vote_weight,
            grouping: config.selection.grouping,
            persist_snapshots: config.sources.persist_snapshots,
        }
    }
}

/// Star of the match for one match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchWinner {
    pub match_id: String,
    pub winner: Winner,
}

/// Everything selected for a window, before any write
#[derive(Debug, Clone)]
pub struct Selection {
    pub window: Window,
    pub period_key: String,
    pub facts_collected: usize,
    pub aggregation: Aggregation,
    pub teams: Vec<GroupSelection>,
    pub winners: Vec<MatchWinner>,
    /// Matches with nominated players that produced no winner
    pub matches_without_winner: usize,
}

/// Pure selection over collected facts
pub fn build_selection(
    facts: &[MatchFact],
    window: &Window,
    settings: &EngineSettings,
    countries: &HashMap<String, Option<String>>,
) -> Selection {
    let period_key = window.period_key();

    let aggregation = aggregate(facts, window, &settings.weights, |fact| match settings.grouping {
        Grouping::Global => GroupKey::Global,
        Grouping::Country => GroupKey::country(countries.get(&fact.player_id).and_then(|c| c.as_deref())),
    });

    let teams = select_teams(
        &aggregation.entries,
        &settings.quotas,
        &period_key,
        settings.min_candidates,
    );

    let mut winners = Vec::new();
    let mut matches_without_winner = 0;
    for (match_id, nominees) in nominees_by_match(&aggregation.scored) {
        match select_winner(&nominees, settings.vote_weight) {
            Some(winner) => winners.push(MatchWinner { match_id, winner }),
            None => matches_without_winner += 1,
        }
    }

    Selection {
        window: *window,
        period_key,
        facts_collected: facts.len(),
        aggregation,
        teams,
        winners,
        matches_without_winner,
    }
}

/// Outcome of one run, for logs and the scheduler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub period_key: String,
    pub facts_collected: usize,
    pub facts_skipped: usize,
    pub teams_created: usize,
    pub teams_existing: usize,
    pub quiet_groups: usize,
    pub winners_created: usize,
    pub winners_existing: usize,
    pub notifications_attempted: usize,
    pub notifications_sent: usize,
}

impl RunSummary {
    pub fn composite_team_created(&self) -> bool {
        self.teams_created > 0
    }

    pub fn winner_created(&self) -> bool {
        self.winners_created > 0
    }

    pub fn log_summary(&self) {
        info!(
            "Run {} for {}: facts {} ({} skipped), teams {} new / {} existing / {} quiet, \
             winners {} new / {} existing, notifications {}/{}",
            self.run_id,
            self.period_key,
            self.facts_collected,
            self.facts_skipped,
            self.teams_created,
            self.teams_existing,
            self.quiet_groups,
            self.winners_created,
            self.winners_existing,
            self.notifications_sent,
            self.notifications_attempted,
        );
    }
}

/// Awards created by one issuance pass, and the insert failure that ended it early
#[derive(Debug, Default)]
struct Issuance {
    created: Vec<AwardRecord>,
    failure: Option<LaurelError>,
}

pub struct RankingEngine {
    collector: FactCollector,
    directory: Arc<dyn PlayerDirectory>,
    awards: Arc<dyn AwardStore>,
    fanout: NotificationFanout,
    settings: EngineSettings,
}

impl RankingEngine {
    pub fn new(
        collector: FactCollector,
        directory: Arc<dyn PlayerDirectory>,
        awards: Arc<dyn AwardStore>,
        fanout: NotificationFanout,
        settings: EngineSettings,
    ) -> Self {
        Self {
            collector,
            directory,
            awards,
            fanout,
            settings,
        }
    }

    /// Phase 1: fan-in and pure computation. Performs no writes.
    pub async fn compute(&self, window: &Window) -> Result<Selection> {
        let collected = self.collector.collect(window).await?;

        let countries = match self.settings.grouping {
            Grouping::Global => HashMap::new(),
            Grouping::Country => self.countries_for(&collected.facts).await?,
        };

        let selection = build_selection(&collected.facts, window, &self.settings, &countries);
        info!(
            "Computed {} entries, {} team selections, {} match winners for {}",
            selection.aggregation.entries.len(),
            selection.teams.len(),
            selection.winners.len(),
            window
        );
        Ok(selection)
    }

    async fn countries_for(&self, facts: &[MatchFact]) -> Result<HashMap<String, Option<String>>> {
        let ids: Vec<String> = facts
            .iter()
            .map(|f| f.player_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let contacts = self
            .directory
            .lookup_many(&ids)
            .await
            .map_err(|e| LaurelError::unavailable("directory", e))?;

        Ok(ids
            .into_iter()
            .map(|id| {
                let country = contacts.get(&id).and_then(|c| c.country.clone());
                (id, country)
            })
            .collect())
    }

    /// Run all three phases for a window
    pub async fn run(&self, window: &Window) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("ranking_run", %run_id, window = %window);

        async move {
            info!("Starting ranking run");
            let selection = self.compute(window).await?;

            let mut summary = RunSummary {
                run_id,
                period_key: selection.period_key.clone(),
                facts_collected: selection.facts_collected,
                facts_skipped: selection.aggregation.skipped.len(),
                ..Default::default()
            };

            let issuance = self.issue_all(&selection, run_id, &mut summary).await?;

            // Awards created before a failed insert are notified now; a retry
            // would find them existing and never notify.
            let report = self.notify_all(&issuance.created).await;
            summary.notifications_attempted = report.attempted;
            summary.notifications_sent = report.sent;

            summary.log_summary();
            match issuance.failure {
                Some(e) => {
                    error!(
                        "Issuance failed after {} awards were created: {}",
                        issuance.created.len(),
                        e
                    );
                    Err(e)
                }
                None => Ok(summary),
            }
        }
        .instrument(span)
        .await
    }

    /// Phase 2: conditional inserts in roster order, teams first.
    ///
    /// Stops at the first failed insert and reports it alongside the awards
    /// already created. Only a snapshot failure, which precedes every insert,
    /// is returned as an error.
    async fn issue_all(&self, selection: &Selection, run_id: Uuid, summary: &mut RunSummary) -> Result<Issuance> {
        if self.settings.persist_snapshots {
            self.awards
                .save_snapshot(&selection.period_key, &selection.aggregation.entries)
                .await?;
        }

        let mut pending: Vec<(AwardKey, AwardPayload)> = Vec::new();
        for team_selection in &selection.teams {
            match team_selection {
                GroupSelection::Selected(team) if !team.members.is_empty() => pending.push((
                    AwardKey::team(&selection.period_key, &team.group),
                    AwardPayload::Team(team.clone()),
                )),
                GroupSelection::Selected(team) => {
                    warn!("Empty roster for {}, not issuing", team.group);
                    summary.quiet_groups += 1;
                }
                GroupSelection::Quiet { group, candidates } => {
                    info!("Quiet period for {} ({} candidates)", group, candidates);
                    summary.quiet_groups += 1;
                }
            }
        }
        for MatchWinner { match_id, winner } in &selection.winners {
            let award = IndividualAward {
                subject_player_id: winner.nominee.player_id.clone(),
                kind: AwardKind::StarOfTheMatch,
                period_key: selection.period_key.clone(),
                reference: match_id.clone(),
                value: winner.value,
            };
            pending.push((
                AwardKey::for_match(AwardKind::StarOfTheMatch, match_id),
                AwardPayload::Individual(award),
            ));
        }

        let issuer = AwardIssuer::new(self.awards.clone(), run_id);
        let mut issuance = Issuance::default();

        for (key, payload) in pending {
            let is_team = matches!(payload, AwardPayload::Team(_));
            let issued = match issuer.issue(key, payload).await {
                Ok(issued) => issued,
                Err(e) => {
                    issuance.failure = Some(e);
                    break;
                }
            };

            match (is_team, issued.created) {
                (true, true) => summary.teams_created += 1,
                (true, false) => summary.teams_existing += 1,
                (false, true) => summary.winners_created += 1,
                (false, false) => summary.winners_existing += 1,
            }
            if issued.created {
                issuance.created.push(issued.record);
            }
        }

        Ok(issuance)
    }

    /// Phase 3: best-effort notifications for newly created awards
    async fn notify_all(&self, created: &[AwardRecord]) -> FanOutReport {
        let today = Utc::now().date_naive();
        let mut report = FanOutReport::default();

        for record in created {
            let template = template_for(record);
            let recipients = record.payload.recipients();
            report.merge(self.fanout.fan_out(&recipients, &template, today).await);
        }

        report
    }
}

fn template_for(record: &AwardRecord) -> NotificationTemplate {
    match &record.payload {
        AwardPayload::Team(team) => NotificationTemplate {
            category: NotificationCategory::TeamSelection,
            title: "You made the team of the week".to_string(),
            body: format!(
                "Congratulations {{name}}! You were selected for the team of {}.",
                team.period_key
            ),
        },
        AwardPayload::Individual(award) => NotificationTemplate {
            category: NotificationCategory::StarOfTheMatch,
            title: "Star of the match".to_string(),
            body: format!(
                "Congratulations {{name}}! Your teammates voted you star of match {}.",
                award.reference
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Position, RoleCategory};
    use chrono::{NaiveDate, TimeZone};

    fn window() -> Window {
        Window::new(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
        .unwrap()
    }

    fn fact(player: &str, match_id: &str, pos: Position, goals: u32, votes: u32) -> MatchFact {
        MatchFact {
            player_id: player.to_string(),
            match_id: match_id.to_string(),
            role_at_match: pos,
            minutes_played: Some(90),
            goals: Some(goals),
            assists: Some(0),
            yellow_cards: 0,
            red_cards: 0,
            team_goals: Some(2),
            opponent_goals: Some(1),
            mvp_votes: votes,
            match_timestamp: Utc.with_ymd_and_hms(2024, 3, 6, 19, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_country_grouping_builds_team_per_country() {
        let settings = EngineSettings {
            grouping: Grouping::Country,
            min_candidates: 1,
            ..EngineSettings::default()
        };
        let facts = vec![
            fact("br1", "m1", Position::St, 1, 0),
            fact("br2", "m1", Position::Cb, 0, 0),
            fact("ar1", "m1", Position::Gk, 0, 0),
            fact("xx1", "m1", Position::Cm, 0, 0),
        ];
        let countries: HashMap<String, Option<String>> = [
            ("br1".to_string(), Some("BR".to_string())),
            ("br2".to_string(), Some("br".to_string())),
            ("ar1".to_string(), Some("AR".to_string())),
        ]
        .into_iter()
        .collect();

        let selection = build_selection(&facts, &window(), &settings, &countries);
        let groups: Vec<String> = selection
            .teams
            .iter()
            .map(|t| match t {
                GroupSelection::Selected(team) => team.group.to_string(),
                GroupSelection::Quiet { group, .. } => format!("quiet {group}"),
            })
            .collect();
        assert_eq!(groups, vec!["country:AR", "country:BR", "country:UNKNOWN"]);
    }

    #[test]
    fn test_winner_per_nominated_match() {
        let settings = EngineSettings::default();
        let facts = vec![
            fact("a", "m1", Position::St, 2, 1),
            fact("b", "m1", Position::Cm, 0, 4),
            fact("c", "m2", Position::Cb, 0, 0),
        ];
        let selection = build_selection(&facts, &window(), &settings, &HashMap::new());

        assert_eq!(selection.winners.len(), 1);
        assert_eq!(selection.winners[0].match_id, "m1");
        // a: 20 + 9 + 30 + 2 - 1 + 5 = 65; b: 9 + 30 + 2 - 1 + 20 = 60
        assert_eq!(selection.winners[0].winner.nominee.player_id, "a");
        assert_eq!(selection.matches_without_winner, 0);
    }

    #[test]
    fn test_quiet_period_below_min_candidates() {
        let settings = EngineSettings::default();
        let facts = vec![fact("a", "m1", Position::St, 1, 0)];
        let selection = build_selection(&facts, &window(), &settings, &HashMap::new());
        assert!(matches!(selection.teams[0], GroupSelection::Quiet { candidates: 1, .. }));
        assert_eq!(selection.aggregation.entries[0].category, RoleCategory::Forwards);
    }

    #[test]
    fn test_templates_by_award_kind() {
        let record = AwardRecord {
            key: AwardKey::for_match(AwardKind::StarOfTheMatch, "m1"),
            payload: AwardPayload::Individual(IndividualAward {
                subject_player_id: "a".to_string(),
                kind: AwardKind::StarOfTheMatch,
                period_key: "20240304_20240310".to_string(),
                reference: "m1".to_string(),
                value: 65.0,
            }),
            issued_by_run: None,
            created_at: Utc::now(),
        };
        let template = template_for(&record);
        assert_eq!(template.category, NotificationCategory::StarOfTheMatch);
        assert!(template.body.contains("{name}"));
        assert!(template.body.contains("m1"));
    }
}

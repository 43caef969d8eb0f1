//! Aggregations over loaded rating rows.
//!
//! Everything here is a single in-memory pass over rows that were already
//! fetched (and possibly paginated and date-filtered). Results describe only
//! those rows.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rating joined with its response, question and rater.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RatingRecord {
    pub response_id: i32,
    pub query_id: i32,
    pub user_id: i32,
    pub user_email: String,
    /// True model identity.
    pub model_name: String,
    /// 1 is best.
    pub rank: i32,
    pub question: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Placement counts and average rank for one model.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ModelRankStats {
    pub model_name: String,
    pub first: u64,
    pub second: u64,
    pub third: u64,
    /// Placements worse than third.
    pub other: u64,
    pub total: u64,
    /// Mean of every rank received, including those counted in `other`, so it
    /// equals `(1*first + 2*second + 3*third) / total` only for groups of up to
    /// three responses.
    pub average_rank: f64,
}

impl ModelRankStats {
    fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            first: 0,
            second: 0,
            third: 0,
            other: 0,
            total: 0,
            average_rank: 0.0,
        }
    }
}

/// Per-model placements, best average rank first.
///
/// Ties keep the order in which models first appear in `rows`.
pub fn model_rankings(rows: &[RatingRecord]) -> Vec<ModelRankStats> {
    let mut order: Vec<ModelRankStats> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rank_sums: Vec<i64> = Vec::new();

    for row in rows {
        let i = *index.entry(row.model_name.as_str()).or_insert_with(|| {
            order.push(ModelRankStats::new(&row.model_name));
            rank_sums.push(0);
            order.len() - 1
        });
        let stats = &mut order[i];
        match row.rank {
            1 => stats.first += 1,
            2 => stats.second += 1,
            3 => stats.third += 1,
            _ => stats.other += 1,
        }
        stats.total += 1;
        rank_sums[i] += i64::from(row.rank);
    }

    for (stats, sum) in order.iter_mut().zip(&rank_sums) {
        stats.average_rank = *sum as f64 / stats.total as f64;
    }

    // Stable: equal averages stay in first-appearance order.
    order.sort_by(|a, b| a.average_rank.total_cmp(&b.average_rank));
    order
}

/// Qualitative reading of a head-to-head win percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WinBand {
    Advantage,
    Competitive,
    Disadvantage,
}

impl WinBand {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            60.. => Self::Advantage,
            40..=59 => Self::Competitive,
            _ => Self::Disadvantage,
        }
    }
}

/// How often `model` outranked `opponent` when both answered the same query
/// for the same rater.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct HeadToHeadCell {
    pub model: String,
    pub opponent: String,
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
    pub comparisons: u64,
    /// Rounded `wins / comparisons` as a percentage.
    pub win_rate: u32,
    pub band: WinBand,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct HeadToHead {
    /// Every model seen, in first-appearance order.
    pub models: Vec<String>,
    /// One cell per ordered pair with at least one comparison.
    pub cells: Vec<HeadToHeadCell>,
}

impl HeadToHead {
    pub fn cell(&self, model: &str, opponent: &str) -> Option<&HeadToHeadCell> {
        self.cells
            .iter()
            .find(|c| c.model == model && c.opponent == opponent)
    }
}

/// Rounded percentage, half up.
pub fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part * 200 + whole) / (whole * 2)) as u32
}

#[derive(Default)]
struct Tally {
    wins: u64,
    losses: u64,
    ties: u64,
}

/// Pairwise win matrix.
///
/// Rows are grouped by `(query_id, user_id)`. Within a group every pair of
/// distinct models is one comparison; the lower numeric rank wins.
pub fn head_to_head(rows: &[RatingRecord]) -> HeadToHead {
    let mut models: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut groups: BTreeMap<(i32, i32), Vec<&RatingRecord>> = BTreeMap::new();

    for row in rows {
        if seen.insert(row.model_name.as_str()) {
            models.push(row.model_name.clone());
        }
        groups
            .entry((row.query_id, row.user_id))
            .or_default()
            .push(row);
    }

    let mut tallies: HashMap<(&str, &str), Tally> = HashMap::new();
    for group in groups.values() {
        for a in group {
            for b in group {
                if a.model_name == b.model_name {
                    continue;
                }
                let t = tallies
                    .entry((a.model_name.as_str(), b.model_name.as_str()))
                    .or_default();
                match a.rank.cmp(&b.rank) {
                    std::cmp::Ordering::Less => t.wins += 1,
                    std::cmp::Ordering::Greater => t.losses += 1,
                    std::cmp::Ordering::Equal => t.ties += 1,
                }
            }
        }
    }

    let mut cells = Vec::new();
    for model in &models {
        for opponent in &models {
            let Some(t) = tallies.get(&(model.as_str(), opponent.as_str())) else {
                continue;
            };
            let comparisons = t.wins + t.losses + t.ties;
            let win_rate = percent(t.wins, comparisons);
            cells.push(HeadToHeadCell {
                model: model.clone(),
                opponent: opponent.clone(),
                wins: t.wins,
                losses: t.losses,
                ties: t.ties,
                comparisons,
                win_rate,
                band: WinBand::from_percent(win_rate),
            });
        }
    }

    HeadToHead { models, cells }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct DailyCount {
    /// Calendar date (UTC), `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Engagement {
    pub total_ratings: u64,
    pub unique_raters: u64,
    pub unique_queries: u64,
    pub unique_models: u64,
    pub ratings_per_day: Vec<DailyCount>,
    pub active_users_per_day: Vec<DailyCount>,
}

fn day_key(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Ratings and distinct raters bucketed by calendar date, oldest first.
pub fn engagement(rows: &[RatingRecord]) -> Engagement {
    let mut per_day: BTreeMap<String, u64> = BTreeMap::new();
    let mut users_per_day: BTreeMap<String, BTreeSet<i32>> = BTreeMap::new();
    let mut raters = HashSet::new();
    let mut queries = HashSet::new();
    let mut models = HashSet::new();

    for row in rows {
        let day = day_key(&row.created_at);
        *per_day.entry(day.clone()).or_default() += 1;
        users_per_day.entry(day).or_default().insert(row.user_id);
        raters.insert(row.user_id);
        queries.insert(row.query_id);
        models.insert(row.model_name.as_str());
    }

    Engagement {
        total_ratings: rows.len() as u64,
        unique_raters: raters.len() as u64,
        unique_queries: queries.len() as u64,
        unique_models: models.len() as u64,
        ratings_per_day: per_day
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect(),
        active_users_per_day: users_per_day
            .into_iter()
            .map(|(date, users)| DailyCount {
                date,
                count: users.len() as u64,
            })
            .collect(),
    }
}

//! Aggregations over the response history. Everything is recomputed from the
//! filtered records on each call; nothing is cached.

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use std::collections::HashMap;

use crate::core::models::report::{
    ClientComments, CommentEntry, Dashboard, DailyPoint, FilterOptions, GroupComments, GroupDailyPoint, GroupProgress, GroupStat, Overview, QuestionStat, Summary,
    WeightedResult,
};
use crate::core::models::{Answer, Catalog, ResponseQuery, ResponseRecord, Role};
use crate::core::ports::repository::AnswerCommon;
use crate::error::Error;

pub const TOP_QUESTIONS: usize = 10;

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Non-admins only ever see what they answered themselves.
pub fn restrict(mut query: ResponseQuery, username: &str, role: Role) -> ResponseQuery {
    if !role.is_admin() {
        query.username_eq = Some(username.to_owned());
    }
    query
}

pub async fn visible_records<S>(store: &S, query: ResponseQuery, username: &str, role: Role) -> Result<Vec<ResponseRecord>, Error>
where
    S: AnswerCommon,
{
    store.query(&restrict(query, username, role)).await
}

struct Tally {
    total: usize,
    yes: usize,
}

impl Tally {
    fn of<'r>(records: impl IntoIterator<Item = &'r ResponseRecord>) -> Self {
        let mut tally = Tally { total: 0, yes: 0 };
        for r in records {
            tally.total += 1;
            if r.response == Answer::Yes {
                tally.yes += 1;
            }
        }
        tally
    }

    fn no(&self) -> usize {
        self.total - self.yes
    }

    fn rate(&self) -> f64 {
        match self.total {
            0 => 0.0,
            total => round1(self.yes as f64 / total as f64 * 100.0),
        }
    }

    /// Mean of the 1/0 answer coefficients.
    fn score(&self) -> f64 {
        match self.total {
            0 => 0.0,
            total => round2(self.yes as f64 / total as f64),
        }
    }
}

pub fn summary(records: &[ResponseRecord]) -> Summary {
    let tally = Tally::of(records);
    Summary {
        total_responses: tally.total,
        unique_clients: records.iter().map(|r| &r.client_name).unique().count(),
        positive_rate: tally.rate(),
        average_score: tally.score(),
        last_response: records.iter().map(|r| r.date).max(),
    }
}

pub fn group_stats(records: &[ResponseRecord]) -> Vec<GroupStat> {
    records
        .iter()
        .map(|r| (r.group_key.as_str(), r))
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(key, group)| {
            let tally = Tally::of(group.iter().copied());
            GroupStat {
                group_key: key.to_owned(),
                group_title: group.iter().rev().map(|r| r.group_title.as_str()).find(|t| !t.is_empty()).unwrap_or_default().to_owned(),
                total: tally.total,
                yes: tally.yes,
                no: tally.no(),
                yes_percent: tally.rate(),
            }
        })
        .collect()
}

pub fn question_stats(records: &[ResponseRecord], group_key: Option<&str>) -> Vec<QuestionStat> {
    records
        .iter()
        .filter(|r| group_key.map_or(true, |k| r.group_key == k))
        .map(|r| ((r.group_key.as_str(), r.question_text.as_str()), r))
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|((key, text), group)| {
            let tally = Tally::of(group);
            QuestionStat {
                group_key: key.to_owned(),
                question_text: text.to_owned(),
                total: tally.total,
                yes: tally.yes,
                no: tally.no(),
                yes_percent: tally.rate(),
                average_score: tally.score(),
            }
        })
        .collect()
}

pub fn top_questions(stats: &[QuestionStat], n: usize) -> Vec<QuestionStat> {
    stats
        .iter()
        .sorted_by(|a, b| b.yes_percent.total_cmp(&a.yes_percent))
        .take(n)
        .cloned()
        .collect()
}

pub fn daily(records: &[ResponseRecord]) -> Vec<DailyPoint> {
    records
        .iter()
        .map(|r| (r.date.date(), r))
        .into_group_map()
        .into_iter()
        .sorted_by_key(|(date, _)| *date)
        .map(|(date, group)| {
            let tally = Tally::of(group);
            DailyPoint {
                date,
                responses: tally.total,
                average_score: tally.score(),
                positive_rate: tally.rate(),
            }
        })
        .collect()
}

pub fn trends(records: &[ResponseRecord]) -> Vec<GroupDailyPoint> {
    records
        .iter()
        .map(|r| ((r.date.date(), r.group_key.as_str()), r))
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|((date, key), group)| {
            let tally = Tally::of(group);
            GroupDailyPoint {
                date,
                group_key: key.to_owned(),
                responses: tally.total,
                average_score: tally.score(),
                positive_rate: tally.rate(),
            }
        })
        .collect()
}

fn mean_change(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    Some(changes.iter().sum::<f64>() / changes.len() as f64)
}

/// First and last day of each group's trend, and the mean day-over-day change.
pub fn progress(trends: &[GroupDailyPoint]) -> Vec<GroupProgress> {
    let mut by_group: HashMap<&str, Vec<&GroupDailyPoint>> = HashMap::new();
    for point in trends {
        by_group.entry(point.group_key.as_str()).or_default().push(point);
    }
    by_group
        .into_iter()
        .sorted_by_key(|(key, _)| *key)
        .filter_map(|(key, mut points)| {
            points.sort_by_key(|p| p.date);
            let (first, last) = (points.first()?, points.last()?);
            let rates: Vec<f64> = points.iter().map(|p| p.positive_rate).collect();
            let scores: Vec<f64> = points.iter().map(|p| p.average_score).collect();
            Some(GroupProgress {
                group_key: key.to_owned(),
                initial_rate: first.positive_rate,
                final_rate: last.positive_rate,
                mean_rate_change: mean_change(&rates).map(round1),
                initial_score: first.average_score,
                final_score: last.average_score,
                mean_score_change: mean_change(&scores).map(round2),
            })
        })
        .collect()
}

/// Commented records, by client then by group, newest first inside a group.
pub fn comments(records: &[ResponseRecord]) -> Vec<ClientComments> {
    records
        .iter()
        .filter(|r| r.comment.is_some())
        .map(|r| (r.client_name.as_str(), r))
        .into_group_map()
        .into_iter()
        .sorted_by_key(|(client, _)| *client)
        .map(|(client, records)| ClientComments {
            client_name: client.to_owned(),
            groups: records
                .into_iter()
                .map(|r| (r.group_key.as_str(), r))
                .into_group_map()
                .into_iter()
                .sorted_by_key(|(key, _)| *key)
                .map(|(key, records)| GroupComments {
                    group_key: key.to_owned(),
                    group_title: records[0].group_title.clone(),
                    entries: records
                        .into_iter()
                        .sorted_by(|a, b| b.date.cmp(&a.date))
                        .map(|r| CommentEntry {
                            date: r.date,
                            username: r.username.clone(),
                            question_text: r.question_text.clone(),
                            response: r.response,
                            comment: r.comment.clone().unwrap_or_default(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

pub fn filter_options(records: &[ResponseRecord], with_users: bool) -> FilterOptions {
    let (first_date, last_date) = match records.iter().map(|r| r.date.date()).minmax().into_option() {
        Some((first, last)) => (Some(first), Some(last)),
        None => (None, None),
    };
    FilterOptions {
        clients: records.iter().map(|r| r.client_name.clone()).unique().sorted().collect(),
        users: match with_users {
            true => records.iter().map(|r| r.username.clone()).unique().sorted().collect(),
            false => Vec::new(),
        },
        groups: records.iter().map(|r| r.group_key.clone()).unique().sorted().collect(),
        first_date,
        last_date,
    }
}

/// Question weight for a positive answer, 0 otherwise. Questions no longer
/// in the catalog weigh 1.
pub fn weighted_results(records: &[ResponseRecord], catalog: &Catalog) -> Vec<WeightedResult> {
    let weights: HashMap<(&str, &str), f64> = catalog
        .iter()
        .flat_map(|g| g.questions.iter().map(move |q| ((g.key.as_str(), q.text.as_str()), q.weight)))
        .collect();
    records
        .iter()
        .map(|r| {
            let weight = weights.get(&(r.group_key.as_str(), r.question_text.as_str())).copied().unwrap_or(1.0);
            WeightedResult {
                group_key: r.group_key.clone(),
                group_title: r.group_title.clone(),
                question_text: r.question_text.clone(),
                response: r.response,
                coefficient: weight * r.response.coefficient(),
            }
        })
        .collect()
}

/// Mean coefficient per group as `(key, title, mean)`, ordered by key.
pub fn group_weighted_means(results: &[WeightedResult]) -> Vec<(String, String, f64)> {
    results
        .iter()
        .map(|r| (r.group_key.as_str(), r))
        .into_group_map()
        .into_iter()
        .sorted_by_key(|(key, _)| *key)
        .map(|(key, rs)| {
            let mean = rs.iter().map(|r| r.coefficient).sum::<f64>() / rs.len() as f64;
            (key.to_owned(), rs[0].group_title.clone(), round2(mean))
        })
        .collect()
}

pub fn overview(records: &[ResponseRecord], now: NaiveDateTime) -> Overview {
    let summary = summary(records);
    let days_since_last = summary.last_response.map(|d| (now.date() - d.date()).num_days());
    Overview {
        summary,
        days_since_last,
        daily_by_group: trends(records),
    }
}

pub fn dashboard(records: &[ResponseRecord]) -> Dashboard {
    let questions = question_stats(records, None);
    let trends = trends(records);
    Dashboard {
        summary: summary(records),
        groups: group_stats(records),
        top_questions: top_questions(&questions, TOP_QUESTIONS),
        questions,
        daily: daily(records),
        progress: progress(&trends),
        trends,
    }
}

/// Parses a `YYYY-MM-DD` query value.
pub fn parse_day(value: &str) -> Result<NaiveDate, Error> {
    Ok(NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::{Question, QuestionGroup};

    fn record(day: u32, client: &str, group: &str, question: &str, response: Answer) -> ResponseRecord {
        ResponseRecord {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap().and_hms_opt(10, 0, 0).unwrap(),
            username: "alice".into(),
            client_name: client.into(),
            group_key: group.into(),
            group_title: format!("title {}", group),
            question_text: question.into(),
            response,
            comment: None,
        }
    }

    fn history() -> Vec<ResponseRecord> {
        vec![
            record(1, "ACME", "G1", "Q1", Answer::Yes),
            record(1, "ACME", "G1", "Q2", Answer::Yes),
            record(1, "ACME", "G2", "Q3", Answer::Yes),
            record(2, "Globex", "G1", "Q1", Answer::No),
        ]
    }

    #[test]
    fn test_summary() {
        let s = summary(&history());
        assert_eq!(s.total_responses, 4);
        assert_eq!(s.unique_clients, 2);
        assert_eq!(s.positive_rate, 75.0);
        assert_eq!(s.average_score, 0.75);
        assert_eq!(s.last_response.map(|d| d.date()), NaiveDate::from_ymd_opt(2024, 4, 2));

        let empty = summary(&[]);
        assert_eq!(empty.total_responses, 0);
        assert_eq!(empty.positive_rate, 0.0);
        assert!(empty.last_response.is_none());
    }

    #[test]
    fn test_rounding() {
        let records = vec![
            record(1, "A", "G1", "Q1", Answer::Yes),
            record(1, "A", "G1", "Q2", Answer::No),
            record(1, "A", "G1", "Q3", Answer::No),
        ];
        let s = summary(&records);
        assert_eq!(s.positive_rate, 33.3);
        assert_eq!(s.average_score, 0.33);
    }

    #[test]
    fn test_group_and_question_stats() {
        let groups = group_stats(&history());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_key, "G1");
        assert_eq!(groups[0].group_title, "title G1");
        assert_eq!((groups[0].total, groups[0].yes, groups[0].no), (3, 2, 1));
        assert_eq!(groups[0].yes_percent, 66.7);

        let questions = question_stats(&history(), Some("G1"));
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question_text, "Q1");
        assert_eq!(questions[0].yes_percent, 50.0);
        assert_eq!(questions[0].average_score, 0.5);

        let top = top_questions(&question_stats(&history(), None), 2);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|q| q.yes_percent == 100.0));
    }

    #[test]
    fn test_daily_trends_and_progress() {
        let days = daily(&history());
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].responses, 3);
        assert_eq!(days[1].positive_rate, 0.0);

        let trends = trends(&history());
        assert_eq!(trends.len(), 3);
        let progress = progress(&trends);
        let g1 = progress.iter().find(|p| p.group_key == "G1").unwrap();
        assert_eq!(g1.initial_rate, 100.0);
        assert_eq!(g1.final_rate, 0.0);
        assert_eq!(g1.mean_rate_change, Some(-100.0));
        let g2 = progress.iter().find(|p| p.group_key == "G2").unwrap();
        assert_eq!(g2.mean_rate_change, None);
    }

    #[test]
    fn test_comments_grouped() {
        let mut records = history();
        records[0].comment = Some("fast answer".into());
        records[3].comment = Some("no budget".into());
        let grouped = comments(&records);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].client_name, "ACME");
        assert_eq!(grouped[0].groups[0].entries[0].comment, "fast answer");
        assert_eq!(grouped[1].groups[0].group_key, "G1");
    }

    #[test]
    fn test_filter_options() {
        let options = filter_options(&history(), false);
        assert_eq!(options.clients, vec!["ACME", "Globex"]);
        assert!(options.users.is_empty());
        assert_eq!(options.groups, vec!["G1", "G2"]);
        assert_eq!(options.first_date, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(filter_options(&history(), true).users, vec!["alice"]);
    }

    #[test]
    fn test_weighted_results() {
        let catalog = vec![QuestionGroup {
            key: "G1".into(),
            title: "title G1".into(),
            description: String::new(),
            questions: vec![Question {
                text: "Q1".into(),
                default_answer: None,
                weight: 2.0,
            }],
        }];
        let results = weighted_results(&history(), &catalog);
        let coefficients: Vec<f64> = results.iter().map(|r| r.coefficient).collect();
        // Q2 and Q3 are not in the catalog any more.
        assert_eq!(coefficients, vec![2.0, 1.0, 1.0, 0.0]);
        let means = group_weighted_means(&results);
        assert_eq!(means[0], ("G1".to_owned(), "title G1".to_owned(), 1.0));
        assert_eq!(means[1].2, 1.0);
    }

    #[test]
    fn test_restrict_to_own_records() {
        let q = restrict(
            ResponseQuery {
                username_eq: Some("bob".into()),
                ..Default::default()
            },
            "alice",
            Role::User,
        );
        assert_eq!(q.username_eq.as_deref(), Some("alice"));
        let q = restrict(ResponseQuery::default(), "admin", Role::Admin);
        assert!(q.username_eq.is_none());
    }

    #[test]
    fn test_group_rate_after_filtering() {
        let by = |user: &str, mut r: ResponseRecord| {
            r.username = user.into();
            r
        };
        let mut records = vec![
            by("alice", record(3, "ACME", "G1", "Q1", Answer::Yes)),
            by("alice", record(3, "ACME", "G1", "Q2", Answer::Yes)),
            by("alice", record(4, "ACME", "G1", "Q3", Answer::Yes)),
            by("alice", record(4, "ACME", "G1", "Q4", Answer::No)),
        ];
        // Off by one dimension each.
        records.push(by("alice", record(3, "Globex", "G1", "Q1", Answer::No)));
        records.push(by("bob", record(3, "ACME", "G1", "Q1", Answer::No)));
        records.push(by("alice", record(1, "ACME", "G1", "Q1", Answer::No)));
        records.push(by("alice", record(9, "ACME", "G1", "Q1", Answer::No)));

        let query = ResponseQuery {
            username_eq: Some("alice".into()),
            client_name_eq: Some("ACME".into()),
            date_from: NaiveDate::from_ymd_opt(2024, 4, 3),
            date_to: NaiveDate::from_ymd_opt(2024, 4, 4),
            group_key_in: None,
        };
        let filtered: Vec<ResponseRecord> = records.into_iter().filter(|r| query.matches(r)).collect();
        let groups = group_stats(&filtered);
        assert_eq!(groups.len(), 1);
        assert_eq!((groups[0].total, groups[0].yes, groups[0].no), (4, 3, 1));
        assert_eq!(groups[0].yes_percent, 75.0);
        assert_eq!(summary(&filtered).positive_rate, 75.0);
    }
}

// Filter evaluation for requeue candidates
// All checks are conjunctive and pure; criteria are resolved once per run.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::db::store::{RecordStatus, RecordingRecord};
use crate::error::{RequeueError, Result};

/// Operator-supplied selection criteria, immutable for one run.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Matched case-insensitively against Name or SeriesTitle (equality,
    /// not substring). Empty means no title restriction.
    pub titles: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub movies_only: bool,
    pub include_partial: bool,
    /// Explicit opt-in to run with no other filter set.
    pub allow_unfiltered: bool,
}

impl FilterCriteria {
    /// Statuses structurally eligible for requeueing under these criteria.
    pub fn eligible_statuses(&self) -> &'static [RecordStatus] {
        if self.include_partial {
            &[RecordStatus::Failed, RecordStatus::Partial]
        } else {
            &[RecordStatus::Failed]
        }
    }

    /// True when at least one restricting filter is present or mass
    /// selection was explicitly allowed.
    pub fn has_scope(&self) -> bool {
        !self.titles.is_empty()
            || self.since.is_some()
            || self.movies_only
            || self.include_partial
            || self.allow_unfiltered
    }
}

/// Case-insensitive equality against a record's title or series title.
pub(crate) fn title_matches(needle: &str, title: &str, series_title: Option<&str>) -> bool {
    let needle = needle.to_lowercase();
    title.to_lowercase() == needle
        || series_title.map(|s| s.to_lowercase() == needle).unwrap_or(false)
}

/// Decide whether one record qualifies for re-queueing.
pub fn eligible(record: &RecordingRecord, criteria: &FilterCriteria) -> bool {
    if !criteria.eligible_statuses().contains(&record.status) {
        return false;
    }
    if !criteria.titles.is_empty()
        && !criteria
            .titles
            .iter()
            .any(|t| title_matches(t, &record.title, record.series_title.as_deref()))
    {
        return false;
    }
    if let Some(since) = criteria.since {
        // A row whose timestamp is missing or unparseable never passes a
        // date filter.
        match record.updated_at {
            Some(ts) if ts >= since => {}
            _ => return false,
        }
    }
    if criteria.movies_only && !record.is_movie() {
        return false;
    }
    true
}

/// Resolve a `--since` token into an absolute UTC lower bound.
/// Keywords: today, yesterday, this-week (weeks start Monday),
/// this-month, or an explicit MM-DD-YY date. All boundaries are
/// midnight UTC.
pub fn resolve_since(token: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let midnight = |d: DateTime<Utc>| d.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    match token.to_lowercase().as_str() {
        "today" => Ok(midnight(now)),
        "yesterday" => Ok(midnight(now - Duration::days(1))),
        "this-week" | "week" | "w" => {
            let days_into_week = now.weekday().num_days_from_monday() as i64;
            Ok(midnight(now - Duration::days(days_into_week)))
        }
        "this-month" | "month" | "m" => {
            let first = now.date_naive().with_day(1).unwrap();
            Ok(first.and_hms_opt(0, 0, 0).unwrap().and_utc())
        }
        other => NaiveDate::parse_from_str(other, "%m-%d-%y")
            .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc())
            .map_err(|_| RequeueError::InvalidSince(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(status: RecordStatus) -> RecordingRecord {
        RecordingRecord {
            id: 1,
            title: "Episode 2".to_string(),
            series_title: Some("The Test Show".to_string()),
            season: Some(1),
            episode: Some(2),
            status,
            rank: Some(-1.0),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()),
            error: Some("Failed".to_string()),
        }
    }

    #[test]
    fn test_status_gate() {
        let criteria = FilterCriteria {
            allow_unfiltered: true,
            ..Default::default()
        };
        assert!(eligible(&record(RecordStatus::Failed), &criteria));
        assert!(!eligible(&record(RecordStatus::Partial), &criteria));
        assert!(!eligible(&record(RecordStatus::Queued), &criteria));
        assert!(!eligible(&record(RecordStatus::Complete), &criteria));

        let with_partial = FilterCriteria {
            include_partial: true,
            ..Default::default()
        };
        assert!(eligible(&record(RecordStatus::Partial), &with_partial));
        assert!(eligible(&record(RecordStatus::Failed), &with_partial));
        assert!(!eligible(&record(RecordStatus::Recording), &with_partial));
    }

    #[test]
    fn test_title_match_is_case_insensitive_equality() {
        assert!(title_matches("the test show", "Episode 2", Some("The Test Show")));
        assert!(title_matches("EPISODE 2", "Episode 2", None));
        assert!(!title_matches("Test", "Episode 2", Some("The Test Show")));

        let criteria = FilterCriteria {
            titles: vec!["the test show".to_string()],
            ..Default::default()
        };
        assert!(eligible(&record(RecordStatus::Failed), &criteria));

        let no_match = FilterCriteria {
            titles: vec!["Another Show".to_string()],
            ..Default::default()
        };
        assert!(!eligible(&record(RecordStatus::Failed), &no_match));
    }

    #[test]
    fn test_date_gate() {
        let early = FilterCriteria {
            since: Some(Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(eligible(&record(RecordStatus::Failed), &early));

        let late = FilterCriteria {
            since: Some(Utc.with_ymd_and_hms(2024, 6, 11, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(!eligible(&record(RecordStatus::Failed), &late));

        // Unparseable/missing timestamp fails any date filter.
        let mut r = record(RecordStatus::Failed);
        r.updated_at = None;
        assert!(!eligible(&r, &early));
    }

    #[test]
    fn test_movies_only_gate() {
        let criteria = FilterCriteria {
            movies_only: true,
            ..Default::default()
        };
        assert!(!eligible(&record(RecordStatus::Failed), &criteria));

        let mut movie = record(RecordStatus::Failed);
        movie.season = None;
        movie.episode = None;
        assert!(eligible(&movie, &criteria));

        // A season without an episode is still not a movie.
        let mut half = record(RecordStatus::Failed);
        half.episode = None;
        assert!(!eligible(&half, &criteria));
    }

    #[test]
    fn test_checks_are_conjunctive() {
        let criteria = FilterCriteria {
            titles: vec!["The Test Show".to_string()],
            since: Some(Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap()),
            include_partial: true,
            ..Default::default()
        };
        assert!(eligible(&record(RecordStatus::Failed), &criteria));
        assert!(eligible(&record(RecordStatus::Partial), &criteria));

        let mut wrong_title = record(RecordStatus::Failed);
        wrong_title.title = "Something Else".to_string();
        wrong_title.series_title = None;
        assert!(!eligible(&wrong_title, &criteria));
    }

    #[test]
    fn test_eligible_iff_every_check_passes() {
        // Drive each of the four checks through both outcomes and confirm
        // the conjunction.
        let criteria = FilterCriteria {
            titles: vec!["The Test Show".to_string()],
            since: Some(Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap()),
            movies_only: false,
            include_partial: false,
            allow_unfiltered: false,
        };

        for status_ok in [true, false] {
            for title_ok in [true, false] {
                for date_ok in [true, false] {
                    let mut r = record(if status_ok {
                        RecordStatus::Failed
                    } else {
                        RecordStatus::Complete
                    });
                    if !title_ok {
                        r.title = "Unrelated".to_string();
                        r.series_title = None;
                    }
                    if !date_ok {
                        r.updated_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
                    }
                    let expected = status_ok && title_ok && date_ok;
                    assert_eq!(
                        eligible(&r, &criteria),
                        expected,
                        "status_ok={} title_ok={} date_ok={}",
                        status_ok,
                        title_ok,
                        date_ok
                    );
                }
            }
        }
    }

    #[test]
    fn test_has_scope() {
        assert!(!FilterCriteria::default().has_scope());
        assert!(FilterCriteria {
            titles: vec!["x".to_string()],
            ..Default::default()
        }
        .has_scope());
        assert!(FilterCriteria {
            movies_only: true,
            ..Default::default()
        }
        .has_scope());
        assert!(FilterCriteria {
            allow_unfiltered: true,
            ..Default::default()
        }
        .has_scope());
    }

    #[test]
    fn test_resolve_since_keywords() {
        // Wednesday, June 12th 2024, mid-afternoon.
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 15, 30, 45).unwrap();

        assert_eq!(
            resolve_since("today", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 12, 0, 0, 0).unwrap()
        );
        assert_eq!(
            resolve_since("yesterday", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 11, 0, 0, 0).unwrap()
        );
        // Week starts Monday.
        assert_eq!(
            resolve_since("this-week", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(resolve_since("w", now).unwrap(), resolve_since("week", now).unwrap());
        assert_eq!(
            resolve_since("this-month", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            resolve_since("06-01-24", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            resolve_since("TODAY", now).unwrap(),
            resolve_since("today", now).unwrap()
        );
        assert!(matches!(
            resolve_since("fortnight", now),
            Err(RequeueError::InvalidSince(_))
        ));
        assert!(matches!(
            resolve_since("2024-06-01", now),
            Err(RequeueError::InvalidSince(_))
        ));
    }

    #[test]
    fn test_resolve_since_week_on_monday() {
        // A Monday resolves to itself.
        let monday = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        assert_eq!(
            resolve_since("this-week", monday).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
        );
    }
}

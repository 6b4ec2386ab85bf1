//! On-demand reporting over the record sequence. Nothing is cached; every
//! call walks the records again.

use chrono::{Duration, NaiveDate, TimeZone};
use std::collections::BTreeMap;

use crate::models::{DailySummary, PostureRecord, PostureType};

fn starts_on<Tz: TimeZone>(record: &PostureRecord, date: NaiveDate, tz: &Tz) -> bool {
    record.start_time.with_timezone(tz).date_naive() == date
}

/// Seconds spent in each bad posture on `date`, bucketed by record start day.
/// Only types with at least one record appear.
pub fn summary_for_day<Tz: TimeZone>(
    records: &[PostureRecord],
    date: NaiveDate,
    tz: &Tz,
) -> BTreeMap<PostureType, f64> {
    let mut totals = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.posture_type.is_bad() && starts_on(r, date, tz))
    {
        *totals.entry(record.posture_type).or_insert(0.0) += record.duration_secs();
    }
    totals
}

/// Day summary ordered by descending duration, ties by posture order.
pub fn ranked_summary_for_day<Tz: TimeZone>(
    records: &[PostureRecord],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<(PostureType, f64)> {
    let mut ranked: Vec<_> = summary_for_day(records, date, tz).into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

/// The `n` calendar days ending with `today`, oldest first.
pub fn recent_days(n: usize, today: NaiveDate) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = (0..n)
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset as i64)))
        .collect();
    days.sort();
    days
}

/// Total bad-posture seconds for each of the last `n` days, zero days included.
pub fn summary_for_last_n_days<Tz: TimeZone>(
    records: &[PostureRecord],
    n: usize,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DailySummary> {
    recent_days(n, today)
        .into_iter()
        .map(|date| DailySummary {
            date,
            total_bad_secs: records
                .iter()
                .filter(|r| r.posture_type.is_bad() && starts_on(r, date, tz))
                .map(PostureRecord::duration_secs)
                .sum(),
        })
        .collect()
}

/// `"<1 min"` under a minute, otherwise whole minutes.
pub fn format_minutes(secs: f64) -> String {
    let minutes = (secs / 60.0).floor() as i64;
    if minutes < 1 {
        "<1 min".to_string()
    } else {
        format!("{minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{PostureHistory, SessionRecorder};
    use crate::monitor::SedentaryMonitor;
    use chrono::{DateTime, FixedOffset, Utc};
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn noon(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, d, 12, 0, 0).unwrap()
    }

    fn record(posture: PostureType, start: DateTime<Utc>, secs: i64) -> PostureRecord {
        let mut record = PostureRecord::open(posture, start);
        record.end_time = start + Duration::seconds(secs);
        record
    }

    #[test]
    fn day_summary_through_recorder() {
        let start = noon(17);
        let mut recorder = SessionRecorder::new(
            PostureHistory::new(),
            SedentaryMonitor::new(Duration::seconds(3600)),
            Duration::seconds(3),
            start,
        );
        let feed = |recorder: &mut SessionRecorder, posture: PostureType, range: std::ops::RangeInclusive<i64>| {
            for s in range {
                recorder.record(Some(posture), start + Duration::seconds(s));
            }
        };
        feed(&mut recorder, PostureType::Good, 0..=10);
        feed(&mut recorder, PostureType::FaceTilt, 11..=16);
        feed(&mut recorder, PostureType::Good, 17..=20);
        feed(&mut recorder, PostureType::FaceTilt, 21..=24);

        let summary = summary_for_day(recorder.history().records(), day(17), &Utc);
        assert_eq!(
            summary.into_iter().collect::<Vec<_>>(),
            vec![(PostureType::FaceTilt, 8.0)]
        );
    }

    #[test]
    fn day_summary_ignores_other_days_and_good() {
        let records = vec![
            record(PostureType::Good, noon(17), 600),
            record(PostureType::SideLean, noon(17) + Duration::seconds(600), 30),
            record(PostureType::Good, noon(17) + Duration::seconds(630), 10),
            record(PostureType::ForwardLean, noon(17) + Duration::seconds(640), 90),
            record(PostureType::SideLean, noon(18), 45),
        ];
        let summary = summary_for_day(&records, day(17), &Utc);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[&PostureType::SideLean], 30.0);
        assert_eq!(summary[&PostureType::ForwardLean], 90.0);

        assert_eq!(
            ranked_summary_for_day(&records, day(17), &Utc),
            vec![(PostureType::ForwardLean, 90.0), (PostureType::SideLean, 30.0)]
        );
    }

    #[test]
    fn day_boundary_follows_timezone() {
        // 23:30 UTC on the 17th is 08:30 on the 18th in UTC+9
        let late = Utc.with_ymd_and_hms(2025, 9, 17, 23, 30, 0).unwrap();
        let records = vec![record(PostureType::FaceTilt, late, 20)];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        assert!(summary_for_day(&records, day(17), &tokyo).is_empty());
        assert_eq!(summary_for_day(&records, day(18), &tokyo)[&PostureType::FaceTilt], 20.0);
        assert_eq!(summary_for_day(&records, day(17), &Utc)[&PostureType::FaceTilt], 20.0);
    }

    #[test]
    fn last_n_days_includes_empty_days_in_order() {
        let records = vec![
            record(PostureType::FaceTilt, noon(14), 120),
            record(PostureType::Good, noon(15), 3_000),
            record(PostureType::ShoulderTilt, noon(16), 60),
            record(PostureType::SideLean, noon(16) + Duration::seconds(100), 15),
            record(PostureType::FaceTilt, noon(10), 999),
        ];
        let summaries = summary_for_last_n_days(&records, 3, day(16), &Utc);
        assert_eq!(
            summaries,
            vec![
                DailySummary { date: day(14), total_bad_secs: 120.0 },
                DailySummary { date: day(15), total_bad_secs: 0.0 },
                DailySummary { date: day(16), total_bad_secs: 75.0 },
            ]
        );
    }

    #[test]
    fn zero_days_is_empty() {
        assert!(summary_for_last_n_days(&[], 0, day(16), &Utc).is_empty());
        assert_eq!(recent_days(2, day(1)), vec![NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(), day(1)]);
    }

    #[test]
    fn minutes_formatting() {
        assert_eq!(format_minutes(0.0), "<1 min");
        assert_eq!(format_minutes(59.9), "<1 min");
        assert_eq!(format_minutes(60.0), "1 min");
        assert_eq!(format_minutes(3_725.0), "62 min");
    }
}

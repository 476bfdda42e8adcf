//! Daily trend series
//!
//! Records are bucketed by local calendar date once; the food, service and
//! atmosphere series are all read off the same buckets.

use chrono::{Duration, FixedOffset, NaiveDate};
use std::collections::HashMap;

use crate::types::{Category, FeedbackRecord, TrendSeries};

/// Running score sums for one calendar day.
#[derive(Debug, Default, Clone, Copy)]
struct DayBucket {
    /// Indexed like `Category::ALL`.
    sums: [u32; 3],
    count: u32,
}

impl DayBucket {
    fn add(&mut self, record: &FeedbackRecord) {
        for (slot, category) in self.sums.iter_mut().zip(Category::ALL) {
            *slot += u32::from(record.ratings.get(category).score());
        }
        self.count += 1;
    }

    /// Mean score rounded to one decimal, 0 for an empty day.
    fn mean(&self, idx: usize) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let avg = f64::from(self.sums[idx]) / f64::from(self.count);
        (avg * 10.0).round() / 10.0
    }
}

/// Chart label for a day, e.g. "Oct 19".
pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Build the `days`-long series ending on `today` (oldest first).
pub fn daily_trends(
    records: &[FeedbackRecord],
    today: NaiveDate,
    days: u32,
    tz: FixedOffset,
) -> TrendSeries {
    let days = days.max(1);
    let first = today - Duration::days(i64::from(days - 1));

    let mut buckets: HashMap<NaiveDate, DayBucket> = HashMap::new();
    for record in records {
        let date = record.created_at.with_timezone(&tz).date_naive();
        if date < first || date > today {
            continue;
        }
        buckets.entry(date).or_default().add(record);
    }

    let capacity = days as usize;
    let mut series = TrendSeries {
        labels: Vec::with_capacity(capacity),
        dates: Vec::with_capacity(capacity),
        food: Vec::with_capacity(capacity),
        service: Vec::with_capacity(capacity),
        atmosphere: Vec::with_capacity(capacity),
    };

    for offset in 0..days {
        let date = first + Duration::days(i64::from(offset));
        let bucket = buckets.get(&date).copied().unwrap_or_default();
        series.labels.push(day_label(date));
        series.dates.push(date);
        series.food.push(bucket.mean(0));
        series.service.push(bucket.mean(1));
        series.atmosphere.push(bucket.mean(2));
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rating, Ratings, SentimentLabel};
    use chrono::{DateTime, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn record(food: Rating, created_at: DateTime<Utc>) -> FeedbackRecord {
        FeedbackRecord {
            id: String::new(),
            restaurant_id: "default".to_string(),
            ratings: Ratings::new(food, Rating::Positive, Rating::Negative),
            comment: String::new(),
            sentiment_score: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            created_at,
        }
    }

    #[test]
    fn test_labels() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(day_label(d), "Oct 19");
        let d = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(day_label(d), "Mar 5");
    }

    #[test]
    fn test_series_spans_window_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let series = daily_trends(&[], today, 7, utc());
        assert_eq!(series.labels.first().map(String::as_str), Some("Oct 13"));
        assert_eq!(series.labels.last().map(String::as_str), Some("Oct 19"));
        assert_eq!(series.food, vec![0.0; 7]);
    }

    #[test]
    fn test_day_mean_rounds_to_one_decimal() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let records = vec![
            record(Rating::Positive, at("2026-10-18T09:00:00Z")),
            record(Rating::Positive, at("2026-10-18T10:00:00Z")),
            record(Rating::Neutral, at("2026-10-18T11:00:00Z")),
        ];
        let series = daily_trends(&records, today, 7, utc());
        // 8/3 = 2.666..
        assert_eq!(series.food[5], 2.7);
        assert_eq!(series.service[5], 3.0);
        assert_eq!(series.atmosphere[5], 1.0);
        assert_eq!(series.food[6], 0.0);
    }

    #[test]
    fn test_records_outside_window_are_ignored() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let records = vec![record(Rating::Negative, at("2026-10-01T12:00:00Z"))];
        let series = daily_trends(&records, today, 7, utc());
        assert!(series.food.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_offset_moves_late_records_to_next_day() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        // 22:30 UTC on the 18th is 01:30 on the 19th at UTC+3.
        let records = vec![record(Rating::Neutral, at("2026-10-18T22:30:00Z"))];
        let series = daily_trends(&records, today, 7, tz);
        assert_eq!(series.food[6], 2.0);
        assert_eq!(series.food[5], 0.0);
    }
}

//! CSV export of raw feedback records.
//!
//! One row per record, ratings rendered as face glyphs, dates and times in the
//! reporting timezone. The comment column is always quoted. The output starts
//! with a UTF-8 BOM so spreadsheet tools pick the right encoding.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::types::{FeedbackRecord, Period, Rating, Ratings, SentimentLabel};

/// Byte-order mark written at the start of every export.
pub const BOM: char = '\u{feff}';

/// Column header row.
pub const HEADER: [&str; 8] = [
    "Date",
    "Time",
    "Food Rating",
    "Service Rating",
    "Atmosphere Rating",
    "Comment",
    "Sentiment",
    "Sentiment Score",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV header missing or unrecognized")]
    MissingHeader,
    #[error("CSV line {line}: {message}")]
    Row { line: usize, message: String },
}

/// Glyph shown for a rating in exported files.
pub const fn rating_glyph(rating: Rating) -> &'static str {
    match rating {
        Rating::Positive => "😊",
        Rating::Neutral => "😐",
        Rating::Negative => "😞",
    }
}

/// Download filename, e.g. `feelrate-feedback-7days-2026-10-19.csv`.
pub fn export_filename(period: Period, date: NaiveDate) -> String {
    format!("feelrate-feedback-{}-{}.csv", period, date.format("%Y-%m-%d"))
}

// ============================================================================
// Writing
// ============================================================================

/// Quote a comment: `"` doubled, `\n` to space, `\r` dropped.
fn quote_comment(comment: &str) -> String {
    let mut out = String::with_capacity(comment.len() + 2);
    out.push('"');
    for ch in comment.chars() {
        match ch {
            '"' => out.push_str("\"\""),
            '\n' => out.push(' '),
            '\r' => {}
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render `records` as CSV text, in the order given.
pub fn to_csv(records: &[FeedbackRecord], tz: FixedOffset) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(HEADER.join(","));

    for record in records {
        let local = record.created_at.with_timezone(&tz);
        let row = [
            local.format("%Y-%m-%d").to_string(),
            local.format("%H:%M:%S").to_string(),
            rating_glyph(record.ratings.food).to_string(),
            rating_glyph(record.ratings.service).to_string(),
            rating_glyph(record.ratings.atmosphere).to_string(),
            quote_comment(&record.comment),
            record.sentiment_label.to_string(),
            record.sentiment_score.to_string(),
        ];
        lines.push(row.join(","));
    }

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&lines.join("\n"));
    out
}

// ============================================================================
// Reading
// ============================================================================

/// One parsed export row.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub ratings: Ratings,
    pub comment: String,
    pub sentiment: SentimentLabel,
    pub sentiment_score: f64,
}

impl CsvRow {
    /// Local timestamp of the row as a UTC instant.
    pub fn created_at(&self, tz: FixedOffset) -> Option<DateTime<Utc>> {
        self.date
            .and_time(self.time)
            .and_local_timezone(tz)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Split a CSV line, honouring quoted fields and `""` escapes.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

fn parse_row(fields: &[String]) -> Result<CsvRow, String> {
    let [date, time, food, service, atmosphere, comment, sentiment, score] = fields else {
        return Err(format!("expected {} fields, found {}", HEADER.len(), fields.len()));
    };

    let rating = |v: &str| v.trim().parse::<Rating>().map_err(|e| e.to_string());

    Ok(CsvRow {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| format!("date: {e}"))?,
        time: NaiveTime::parse_from_str(time, "%H:%M:%S").map_err(|e| format!("time: {e}"))?,
        ratings: Ratings::new(
            rating(food.as_str())?,
            rating(service.as_str())?,
            rating(atmosphere.as_str())?,
        ),
        comment: comment.clone(),
        sentiment: sentiment.parse()?,
        sentiment_score: score
            .trim()
            .parse()
            .map_err(|e| format!("sentiment score: {e}"))?,
    })
}

/// Parse text produced by [`to_csv`].
pub fn parse_csv(text: &str) -> Result<Vec<CsvRow>, ExportError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut lines = text.lines();

    let header = lines.next().ok_or(ExportError::MissingHeader)?;
    if csv_split(header) != HEADER {
        return Err(ExportError::MissingHeader);
    }

    lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            parse_row(&csv_split(line)).map_err(|message| ExportError::Row {
                line: idx + 2,
                message,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn record(comment: &str, label: SentimentLabel, score: f64) -> FeedbackRecord {
        FeedbackRecord {
            id: "id".to_string(),
            restaurant_id: "default".to_string(),
            ratings: Ratings::new(Rating::Positive, Rating::Neutral, Rating::Negative),
            comment: comment.to_string(),
            sentiment_score: score,
            sentiment_label: label,
            created_at: DateTime::parse_from_rfc3339("2026-10-19T18:05:09Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_layout() {
        let csv = to_csv(&[record("Nice, \"really\"", SentimentLabel::Positive, 3.0)], utc());
        assert!(csv.starts_with('\u{feff}'));
        let lines: Vec<_> = csv.trim_start_matches(BOM).split('\n').collect();
        assert_eq!(
            lines[0],
            "Date,Time,Food Rating,Service Rating,Atmosphere Rating,Comment,Sentiment,Sentiment Score"
        );
        assert_eq!(
            lines[1],
            "2026-10-19,18:05:09,😊,😐,😞,\"Nice, \"\"really\"\"\",positive,3"
        );
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let csv = to_csv(&[], utc());
        assert_eq!(csv.trim_start_matches(BOM), HEADER.join(","));
        assert!(parse_csv(&csv).unwrap().is_empty());
    }

    #[test]
    fn test_newlines_flattened() {
        let csv = to_csv(&[record("line one\r\nline two", SentimentLabel::Neutral, 0.0)], utc());
        assert_eq!(csv.lines().count(), 2);
        let rows = parse_csv(&csv).unwrap();
        assert_eq!(rows[0].comment, "line one line two");
    }

    #[test]
    fn test_round_trip_recovers_fields() {
        let records = vec![
            record("Great food, slow service", SentimentLabel::Positive, 2.5),
            record("", SentimentLabel::Neutral, 0.0),
            record("\"Meh\"", SentimentLabel::Negative, -4.0),
        ];
        let rows = parse_csv(&to_csv(&records, utc())).unwrap();
        assert_eq!(rows.len(), records.len());
        for (row, rec) in rows.iter().zip(&records) {
            assert_eq!(row.ratings, rec.ratings);
            assert_eq!(row.comment, rec.comment);
            assert_eq!(row.sentiment, rec.sentiment_label);
            assert_eq!(row.sentiment_score, rec.sentiment_score);
            assert_eq!(row.created_at(utc()), Some(rec.created_at));
        }
    }

    #[test]
    fn test_local_time_columns() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let csv = to_csv(&[record("", SentimentLabel::Neutral, 0.0)], tz);
        let rows = parse_csv(&csv).unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(rows[0].time, NaiveTime::from_hms_opt(3, 5, 9).unwrap());
    }

    #[test]
    fn test_bad_input_rejected() {
        assert!(matches!(parse_csv(""), Err(ExportError::MissingHeader)));
        assert!(matches!(parse_csv("a,b,c"), Err(ExportError::MissingHeader)));
        let text = format!("{}\n2026-10-19,12:00:00,😊,😊", HEADER.join(","));
        assert!(matches!(parse_csv(&text), Err(ExportError::Row { line: 2, .. })));
    }

    #[test]
    fn test_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            export_filename(Period::Last7Days, date),
            "feelrate-feedback-7days-2026-10-19.csv"
        );
    }

    #[test]
    fn test_csv_split_quotes() {
        assert_eq!(csv_split(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
        assert_eq!(csv_split(r#""say ""hi""""#), vec![r#"say "hi""#]);
    }
}

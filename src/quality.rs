//! Quality checks on the raw usage dataset.
//!
//! The checks are informational: a failed gate is reported, never raised.

use std::fmt;

use chrono::NaiveDate;

use crate::dataset::UsageTable;

/// Row-count gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCountCheck {
    pub count: usize,
    pub threshold: usize,
}

impl RowCountCheck {
    pub fn above_threshold(&self) -> bool {
        self.count > self.threshold
    }
}

impl fmt::Display for RowCountCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.above_threshold() {
            write!(
                f,
                "There are more than {} rows in the dataset, {} rows.",
                self.threshold, self.count
            )
        } else {
            write!(
                f,
                "There are not more than {} rows in the dataset, {} rows.",
                self.threshold, self.count
            )
        }
    }
}

/// Inclusive calendar-day range membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeCheck {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub count: usize,
}

impl DateRangeCheck {
    pub fn has_records(&self) -> bool {
        self.count > 0
    }
}

impl fmt::Display for DateRangeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.has_records() { "are" } else { "are not" };
        write!(
            f,
            "There {} records between {} and {} (inclusive), {} rows.",
            verb, self.start, self.end, self.count
        )
    }
}

/// Rows where at least one device counter is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositivityCheck {
    pub total: usize,
    pub non_positive: usize,
}

impl PositivityCheck {
    pub fn all_positive(&self) -> bool {
        self.non_positive == 0
    }
}

impl fmt::Display for PositivityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_positive() {
            write!(f, "All values in the dataset are positive.")
        } else {
            write!(
                f,
                "Not all values in the dataset are positive: {} rows have values <= 0.",
                self.non_positive
            )
        }
    }
}

/// Findings of all three checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityReport {
    pub row_count: RowCountCheck,
    pub date_range: DateRangeCheck,
    pub positivity: PositivityCheck,
}

pub fn check_row_count(table: &UsageTable, threshold: usize) -> RowCountCheck {
    RowCountCheck {
        count: table.len(),
        threshold,
    }
}

/// Count rows dated on or after `start` and on or before `end`.
pub fn check_date_range(table: &UsageTable, start: NaiveDate, end: NaiveDate) -> DateRangeCheck {
    let count = table
        .rows
        .iter()
        .filter(|row| {
            let date = row.time.date();
            date >= start && date <= end
        })
        .count();

    DateRangeCheck { start, end, count }
}

/// `total_count` minus the number of rows whose counters are all `> 0`.
pub fn check_all_positive(table: &UsageTable, total_count: usize) -> PositivityCheck {
    let all_positive = table
        .rows
        .iter()
        .filter(|row| row.counts.iter().all(|&count| count > 0))
        .count();

    PositivityCheck {
        total: total_count,
        non_positive: total_count.saturating_sub(all_positive),
    }
}

pub fn run_quality_checks(
    table: &UsageTable,
    min_rows: usize,
    start: NaiveDate,
    end: NaiveDate,
) -> QualityReport {
    let row_count = check_row_count(table, min_rows);
    let date_range = check_date_range(table, start, end);
    let positivity = check_all_positive(table, row_count.count);

    tracing::debug!(
        rows = row_count.count,
        in_range = date_range.count,
        non_positive = positivity.non_positive,
        "Quality checks finished"
    );

    QualityReport {
        row_count,
        date_range,
        positivity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawUsageRow;
    use crate::time_key::parse_timestamp;

    fn devices() -> Vec<String> {
        (19..=26).map(|d| d.to_string()).collect()
    }

    fn sample_table() -> UsageTable {
        let rows = vec![
            ("2020-04-24 00:00:00+00:00", vec![12; 8]),
            ("2020-04-25 00:00:00+00:00", vec![12; 8]),
            ("2020-04-26 00:00:00+00:00", vec![12; 8]),
            ("2020-04-27 00:00:00+00:00", vec![13, 14, 15, 13, 18, 20, 23, 20]),
        ];
        UsageTable::new(
            devices(),
            rows.into_iter()
                .map(|(time, counts)| RawUsageRow {
                    time: parse_timestamp(time).unwrap(),
                    counts,
                })
                .collect(),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // ==================== Row Count Tests ====================

    #[test]
    fn test_row_count_above_threshold() {
        let check = check_row_count(&sample_table(), 2);
        assert_eq!(check.count, 4);
        assert!(check.above_threshold());
        assert!(check.to_string().starts_with("There are more than 2 rows"));
    }

    #[test]
    fn test_row_count_at_threshold_is_not_above() {
        let check = check_row_count(&sample_table(), 4);
        assert!(!check.above_threshold());
        assert!(check.to_string().contains("not more than 4"));
    }

    #[test]
    fn test_row_count_empty_table() {
        let check = check_row_count(&UsageTable::default(), 0);
        assert_eq!(check.count, 0);
        assert!(!check.above_threshold());
    }

    // ==================== Date Range Tests ====================

    #[test]
    fn test_date_range_is_inclusive_of_both_endpoints() {
        let check = check_date_range(&sample_table(), date("2020-04-24"), date("2020-04-25"));
        assert_eq!(check.count, 2);
        assert!(check.has_records());
    }

    #[test]
    fn test_date_range_single_day() {
        let check = check_date_range(&sample_table(), date("2020-04-27"), date("2020-04-27"));
        assert_eq!(check.count, 1);
    }

    #[test]
    fn test_date_range_counts_late_hours_on_end_date() {
        let table = UsageTable::new(
            vec!["19".to_string()],
            vec![RawUsageRow {
                time: parse_timestamp("2021-05-11 23:59:59+00:00").unwrap(),
                counts: vec![1],
            }],
        );
        let check = check_date_range(&table, date("2020-04-24"), date("2021-05-11"));
        assert_eq!(check.count, 1);
    }

    #[test]
    fn test_date_range_outside() {
        let check = check_date_range(&sample_table(), date("2021-01-01"), date("2021-12-31"));
        assert_eq!(check.count, 0);
        assert!(check.to_string().starts_with("There are not records"));
    }

    // ==================== Positivity Tests ====================

    #[test]
    fn test_all_positive() {
        let check = check_all_positive(&sample_table(), 4);
        assert_eq!(check.non_positive, 0);
        assert!(check.all_positive());
    }

    #[test]
    fn test_zero_and_negative_counts_are_flagged() {
        let mut table = sample_table();
        table.rows[0].counts[3] = 0;
        table.rows[2].counts[7] = -5;

        let check = check_all_positive(&table, table.len());
        assert_eq!(check.non_positive, 2);
        assert!(check.to_string().contains("2 rows"));
    }

    #[test]
    fn test_run_quality_checks_wires_row_count_into_positivity() {
        let report = run_quality_checks(&sample_table(), 2, date("2020-04-24"), date("2020-04-25"));
        assert_eq!(report.row_count.count, 4);
        assert_eq!(report.date_range.count, 2);
        assert_eq!(report.positivity.total, 4);
    }
}

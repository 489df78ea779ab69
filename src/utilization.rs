use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{UtilizationSnapshot, UtilizationWeekRecord, WeekTrend};
use crate::week;

/// Planned and trailing utilization for one person relative to the
/// given reference date.
///
/// Planned looks at forecast records from the reference week onward;
/// the trailing average looks at current-year records up to and
/// including the reference week, falling back to all of the person's
/// records when the current year holds nothing. Missing data degrades
/// to `None`, never to an error.
pub fn aggregate(
    records: &[UtilizationWeekRecord],
    person_key: &str,
    reference: NaiveDate,
) -> UtilizationSnapshot {
    let person_records: Vec<&UtilizationWeekRecord> = records
        .iter()
        .filter(|record| matches_person(record, person_key))
        .collect();

    if person_records.is_empty() {
        return UtilizationSnapshot {
            planned: None,
            average: None,
        };
    }

    let (current_year, current_week) = week::current_year_week(reference);

    let planned = rounded_mean(
        person_records
            .iter()
            .filter(|record| !record.is_historical)
            .filter(|record| {
                record.year > current_year
                    || (record.year == current_year && record.week_number >= current_week)
            })
            .filter(|record| record.final_value.is_finite())
            .map(|record| record.final_value),
    );

    let current_year_values: Vec<f64> = person_records
        .iter()
        .filter(|record| record.year == current_year && record.week_number <= current_week)
        .filter(|record| record.final_value.is_finite())
        .map(|record| record.final_value)
        .collect();

    let average = if current_year_values.is_empty() {
        // Nothing booked this year yet, fall back to everything we have.
        rounded_mean(
            person_records
                .iter()
                .filter(|record| record.final_value.is_finite())
                .map(|record| record.final_value),
        )
    } else {
        rounded_mean(current_year_values.into_iter())
    };

    UtilizationSnapshot { planned, average }
}

/// Mean planned utilization per upcoming week across everyone in the
/// record set, from the reference week onward. One entry per distinct
/// (year, week), in chronological order.
pub fn weekly_forecast_trend(
    records: &[UtilizationWeekRecord],
    reference: NaiveDate,
) -> Vec<WeekTrend> {
    let (current_year, current_week) = week::current_year_week(reference);
    let mut buckets: BTreeMap<(i32, u32), (f64, usize, BTreeSet<&str>)> = BTreeMap::new();

    for record in records {
        if record.is_historical || !record.final_value.is_finite() {
            continue;
        }
        let upcoming = record.year > current_year
            || (record.year == current_year && record.week_number >= current_week);
        if !upcoming {
            continue;
        }

        let bucket = buckets
            .entry((record.year, record.week_number))
            .or_insert((0.0, 0, BTreeSet::new()));
        bucket.0 += record.final_value;
        bucket.1 += 1;
        bucket
            .2
            .insert(record.person_id.as_deref().unwrap_or(record.person.as_str()));
    }

    buckets
        .into_iter()
        .map(|((year, week_number), (sum, count, people))| WeekTrend {
            year,
            week_number,
            avg_planned: sum / count as f64,
            person_count: people.len(),
        })
        .collect()
}

fn matches_person(record: &UtilizationWeekRecord, person_key: &str) -> bool {
    record
        .person_id
        .as_deref()
        .map_or(false, |id| id == person_key)
        || record.person == person_key
}

/// Arithmetic mean rounded half-up to whole percent.
fn rounded_mean(values: impl Iterator<Item = f64>) -> Option<i64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }

    if count == 0 {
        None
    } else {
        Some((sum / count as f64).round() as i64)
    }
}

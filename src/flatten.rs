use serde_json::Value;

use crate::models::{SourceRow, UtilizationWeekRecord};
use crate::week;

/// Extracts a finite number from a sheet cell. Strings, booleans,
/// nulls, nested values and non-finite numbers all come back `None`.
pub fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// Turns the historical ("actual") and forecast sheets into one flat
/// list of per-week records. Cells without a finite numeric value and
/// cells under an unparseable week key are skipped.
pub fn flatten_rows(
    historical: &[SourceRow],
    forecast: &[SourceRow],
) -> Vec<UtilizationWeekRecord> {
    let mut records = Vec::new();
    collect_rows(&mut records, historical, true);
    collect_rows(&mut records, forecast, false);
    records
}

fn collect_rows(
    records: &mut Vec<UtilizationWeekRecord>,
    rows: &[SourceRow],
    is_historical: bool,
) {
    for row in rows {
        for (week_key, value) in &row.values {
            let final_value = match finite_number(value) {
                Some(v) => v,
                None => continue,
            };
            let parsed = match week::parse_week_key(week_key) {
                Some(parsed) => parsed,
                None => continue,
            };

            records.push(UtilizationWeekRecord {
                person: row.person.clone(),
                person_id: row.person_id.clone(),
                week_key: week_key.clone(),
                year: parsed.year,
                week_number: parsed.week_number,
                final_value,
                is_historical,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn row(person: &str, values: Vec<(&str, Value)>) -> SourceRow {
        SourceRow {
            person: person.to_string(),
            person_id: None,
            values: values
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn drops_values_that_are_not_finite_numbers() {
        let rows = vec![row(
            "Jane Doe",
            vec![
                ("24/01", json!("not-a-number")),
                ("24/02", json!(42)),
                ("24/03", json!(null)),
                ("24/04", json!(true)),
            ],
        )];

        let records = flatten_rows(&rows, &[]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].week_number, 2);
        assert_eq!(records[0].final_value, 42.0);
        assert_eq!(records[0].year, 2024);
        assert!(records[0].is_historical);
    }

    #[test]
    fn drops_unparseable_week_keys() {
        let rows = vec![row(
            "Jane Doe",
            vec![("total", json!(95)), ("24/10", json!(80.5))],
        )];

        let records = flatten_rows(&[], &rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].week_key, "24/10");
        assert_eq!(records[0].final_value, 80.5);
        assert!(!records[0].is_historical);
    }

    #[test]
    fn flags_records_by_sheet() {
        let historical = vec![row("Jane Doe", vec![("23/50", json!(100))])];
        let forecast = vec![row("Jane Doe", vec![("24/02", json!(60))])];

        let records = flatten_rows(&historical, &forecast);
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.is_historical && r.week_key == "23/50"));
        assert!(records.iter().any(|r| !r.is_historical && r.week_key == "24/02"));
    }

    #[test]
    fn keeps_person_identity_on_records() {
        let mut sheet = row("Jane Doe", vec![("24/05", json!(70))]);
        sheet.person_id = Some("emp-1".to_string());

        let records = flatten_rows(&[], &[sheet]);
        assert_eq!(records[0].person, "Jane Doe");
        assert_eq!(records[0].person_id.as_deref(), Some("emp-1"));
    }
}

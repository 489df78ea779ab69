use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{EmployeeUtilization, WeekTrend};
use crate::week::{self, WeekKey};

/// Whole-percent display with the placeholder the staffing board shows
/// for missing data.
pub fn format_percent(value: Option<i64>) -> String {
    match value {
        Some(v) => format!("{v}%"),
        None => "—".to_string(),
    }
}

pub fn build_report(
    practice: Option<&str>,
    as_of: NaiveDate,
    rows: &[EmployeeUtilization],
    trends: &[WeekTrend],
) -> String {
    let mut output = String::new();
    let scope_label = practice.unwrap_or("all practices");
    let current_week = week::iso_week_number(as_of);

    let _ = writeln!(output, "# Staffing Utilization Report");
    let _ = writeln!(
        output,
        "Generated for {} as of {} (calendar week {})",
        scope_label, as_of, current_week
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Utilization Overview");

    if rows.is_empty() {
        let _ = writeln!(output, "No consultants found for this scope.");
    } else {
        for row in rows.iter() {
            let _ = writeln!(
                output,
                "- {} ({}, {}): planned {}, trailing average {}",
                row.full_name,
                row.email,
                row.practice,
                format_percent(row.planned),
                format_percent(row.average)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest Planned Utilization");

    let mut ranked: Vec<&EmployeeUtilization> =
        rows.iter().filter(|row| row.planned.is_some()).collect();
    ranked.sort_by_key(|row| row.planned);

    if ranked.is_empty() {
        let _ = writeln!(output, "No forecast data for this scope.");
    } else {
        for row in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) planned {}",
                row.full_name,
                row.practice,
                format_percent(row.planned)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Forecast Trend");

    if trends.is_empty() {
        let _ = writeln!(output, "No forecast weeks ahead in this scope.");
    } else {
        for trend in trends.iter() {
            let key = WeekKey {
                year: trend.year,
                week_number: trend.week_number,
            };
            let _ = writeln!(
                output,
                "- week {}: avg planned {:.1}% across {} consultants",
                key, trend.avg_planned, trend.person_count
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consultant(
        name: &str,
        practice: &str,
        planned: Option<i64>,
        average: Option<i64>,
    ) -> EmployeeUtilization {
        EmployeeUtilization {
            full_name: name.to_string(),
            email: format!(
                "{}@consultwerk.de",
                name.to_lowercase().replace(' ', ".")
            ),
            practice: practice.to_string(),
            planned,
            average,
        }
    }

    #[test]
    fn renders_placeholder_for_missing_data() {
        let rows = vec![consultant("Jane Doe", "Digital", None, Some(72))];
        let report = build_report(None, NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(), &rows, &[]);

        assert!(report.contains("# Staffing Utilization Report"));
        assert!(report.contains("planned —, trailing average 72%"));
        assert!(report.contains("No forecast data for this scope."));
        assert!(report.contains("No forecast weeks ahead in this scope."));
    }

    #[test]
    fn ranks_lowest_planned_first() {
        let rows = vec![
            consultant("Jane Doe", "Digital", Some(90), Some(85)),
            consultant("John Roe", "Strategy", Some(40), Some(60)),
            consultant("Max Mustermann", "Digital", None, None),
        ];
        let report = build_report(
            Some("Digital"),
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            &rows,
            &[],
        );

        assert!(report.contains("Generated for Digital"));
        let ranking = report.split("## Lowest Planned Utilization").nth(1).unwrap();
        let john = ranking.find("John Roe").unwrap();
        let jane = ranking.find("Jane Doe").unwrap();
        assert!(john < jane);
        assert!(!ranking.contains("Max Mustermann"));
    }

    #[test]
    fn lists_weekly_trend_rows() {
        let trends = vec![WeekTrend {
            year: 2026,
            week_number: 33,
            avg_planned: 82.5,
            person_count: 3,
        }];
        let report = build_report(
            None,
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            &[],
            &trends,
        );

        assert!(report.contains("- week 26/33: avg planned 82.5% across 3 consultants"));
    }
}

use std::collections::BTreeMap;

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EmployeeRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub practice: String,
}

/// One utilization sheet as it comes out of the upstream document store:
/// a person plus a map from week key ("YY/WW") to whatever value the
/// sheet holds for that week. Values are kept untyped; the flattener
/// decides what counts as usable.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SourceRow {
    pub person: String,
    #[serde(default, rename = "personId", alias = "id")]
    pub person_id: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct UtilizationWeekRecord {
    pub person: String,
    pub person_id: Option<String>,
    pub week_key: String,
    pub year: i32,
    pub week_number: u32,
    pub final_value: f64,
    pub is_historical: bool,
}

/// Planned and trailing utilization for one person, in whole percent.
/// `None` means no usable data for that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct UtilizationSnapshot {
    pub planned: Option<i64>,
    pub average: Option<i64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EmployeeUtilization {
    pub full_name: String,
    pub email: String,
    pub practice: String,
    pub planned: Option<i64>,
    pub average: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct WeekTrend {
    pub year: i32,
    pub week_number: u32,
    pub avg_planned: f64,
    pub person_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSource {
    Actual,
    Forecast,
}

impl SheetSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SheetSource::Actual => "actual",
            SheetSource::Forecast => "forecast",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "actual" => Ok(SheetSource::Actual),
            "forecast" => Ok(SheetSource::Forecast),
            other => anyhow::bail!(
                "unknown utilization source {other:?}, expected actual or forecast"
            ),
        }
    }
}

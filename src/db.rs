use std::collections::BTreeMap;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{EmployeeRecord, SheetSource, SourceRow};
use crate::week;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let employees = vec![
        (
            Uuid::parse_str("7b0c9a2e-51f4-4d2a-9a3e-2f8f4f1c6b01")?,
            "Miriam Hoffmann",
            "miriam.hoffmann@consultwerk.de",
            "Digital",
        ),
        (
            Uuid::parse_str("2e64c7d9-8a3b-4f0e-b1c4-9d5a7e3f2a02")?,
            "Jonas Weber",
            "jonas.weber@consultwerk.de",
            "Strategy",
        ),
        (
            Uuid::parse_str("c1a5f3b8-0d2e-4c6a-8e9b-4f7d1a6c3e03")?,
            "Aylin Kaya",
            "aylin.kaya@consultwerk.de",
            "Engineering",
        ),
    ];

    for (id, name, email, practice) in employees {
        sqlx::query(
            r#"
            INSERT INTO staffing.employees (id, full_name, email, practice)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, practice = EXCLUDED.practice
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(practice)
        .execute(pool)
        .await?;
    }

    let entries = vec![
        ("miriam.hoffmann@consultwerk.de", "26/29", 100.0, "actual"),
        ("miriam.hoffmann@consultwerk.de", "26/30", 90.0, "actual"),
        ("miriam.hoffmann@consultwerk.de", "26/31", 95.0, "actual"),
        ("miriam.hoffmann@consultwerk.de", "26/32", 80.0, "forecast"),
        ("miriam.hoffmann@consultwerk.de", "26/33", 80.0, "forecast"),
        ("miriam.hoffmann@consultwerk.de", "26/34", 60.0, "forecast"),
        ("jonas.weber@consultwerk.de", "26/29", 40.0, "actual"),
        ("jonas.weber@consultwerk.de", "26/30", 55.0, "actual"),
        ("jonas.weber@consultwerk.de", "26/31", 50.0, "actual"),
        ("jonas.weber@consultwerk.de", "26/32", 45.0, "forecast"),
        ("jonas.weber@consultwerk.de", "26/33", 70.0, "forecast"),
        ("jonas.weber@consultwerk.de", "26/34", 75.0, "forecast"),
        ("aylin.kaya@consultwerk.de", "26/30", 85.0, "actual"),
        ("aylin.kaya@consultwerk.de", "26/31", 85.0, "actual"),
        ("aylin.kaya@consultwerk.de", "26/32", 100.0, "forecast"),
        ("aylin.kaya@consultwerk.de", "26/33", 100.0, "forecast"),
    ];

    for (email, week_key, percent, source) in entries {
        let employee_id: Uuid =
            sqlx::query("SELECT id FROM staffing.employees WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO staffing.utilization_entries
            (id, employee_id, week_key, percent, source)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (employee_id, week_key, source) DO UPDATE
            SET percent = EXCLUDED.percent
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(week_key)
        .bind(percent)
        .bind(source)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_employees(
    pool: &PgPool,
    practice: Option<&str>,
) -> anyhow::Result<Vec<EmployeeRecord>> {
    let mut query = String::from(
        "SELECT id, full_name, email, practice FROM staffing.employees",
    );
    if practice.is_some() {
        query.push_str(" WHERE practice = $1");
    }
    query.push_str(" ORDER BY full_name");

    let mut rows = sqlx::query(&query);
    if let Some(value) = practice {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut employees = Vec::new();

    for row in records {
        employees.push(EmployeeRecord {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            practice: row.get("practice"),
        });
    }

    Ok(employees)
}

pub async fn find_employee_by_email(
    pool: &PgPool,
    email: &str,
) -> anyhow::Result<Option<EmployeeRecord>> {
    let row = sqlx::query(
        "SELECT id, full_name, email, practice FROM staffing.employees WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| EmployeeRecord {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        practice: row.get("practice"),
    }))
}

/// Reads one sheet ("actual" or "forecast") and regroups the flat
/// entries into the per-person document shape the flattener consumes.
pub async fn fetch_sheet_rows(
    pool: &PgPool,
    source: SheetSource,
    email: Option<&str>,
) -> anyhow::Result<Vec<SourceRow>> {
    let mut query = String::from(
        "SELECT e.id AS employee_id, e.full_name, u.week_key, u.percent \
         FROM staffing.utilization_entries u \
         JOIN staffing.employees e ON e.id = u.employee_id \
         WHERE u.source = $1",
    );
    if email.is_some() {
        query.push_str(" AND e.email = $2");
    }
    query.push_str(" ORDER BY e.full_name, u.week_key");

    let mut rows = sqlx::query(&query).bind(source.as_str());
    if let Some(value) = email {
        rows = rows.bind(value);
    }

    let mut sheets: BTreeMap<Uuid, SourceRow> = BTreeMap::new();

    for row in rows.fetch_all(pool).await? {
        let employee_id: Uuid = row.get("employee_id");
        let full_name: String = row.get("full_name");
        let week_key: String = row.get("week_key");
        let percent: f64 = row.get("percent");

        let sheet = sheets.entry(employee_id).or_insert_with(|| SourceRow {
            person: full_name.clone(),
            person_id: Some(employee_id.to_string()),
            values: BTreeMap::new(),
        });
        sheet
            .values
            .insert(week_key, serde_json::Value::from(percent));
    }

    Ok(sheets.into_values().collect())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        practice: String,
        week_key: String,
        percent: f64,
        source: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source = SheetSource::parse(&row.source)?;
        if week::parse_week_key(&row.week_key).is_none() {
            anyhow::bail!(
                "invalid week key {:?} for {}, expected \"YY/WW\"",
                row.week_key,
                row.email
            );
        }

        let employee_id: Uuid = sqlx::query(
            r#"
            INSERT INTO staffing.employees (id, full_name, email, practice)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, practice = EXCLUDED.practice
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(&row.practice)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO staffing.utilization_entries
            (id, employee_id, week_key, percent, source)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (employee_id, week_key, source) DO UPDATE
            SET percent = EXCLUDED.percent
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(&row.week_key)
        .bind(row.percent)
        .bind(source.as_str())
        .execute(pool)
        .await?;

        imported += 1;
    }

    Ok(imported)
}

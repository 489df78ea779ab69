use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod db;
mod flatten;
mod models;
mod report;
mod utilization;
mod week;

use models::{EmployeeRecord, EmployeeUtilization, SheetSource, UtilizationWeekRecord};

#[derive(Parser)]
#[command(name = "staffing-utilization")]
#[command(about = "Staffing utilization tracker for Consultwerk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import weekly utilization entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show planned and trailing utilization for one consultant
    Show {
        #[arg(long)]
        email: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Rank consultants by planned utilization, lowest first
    Board {
        #[arg(long)]
        practice: Option<String>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        practice: Option<String>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let imported = db::import_csv(&pool, &csv).await?;
            println!("Imported {imported} utilization entries from {}.", csv.display());
        }
        Commands::Show { email, as_of, json } => {
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let employee = db::find_employee_by_email(&pool, &email)
                .await?
                .with_context(|| format!("no consultant with email {email}"))?;

            let historical = db::fetch_sheet_rows(&pool, SheetSource::Actual, Some(&email)).await?;
            let forecast = db::fetch_sheet_rows(&pool, SheetSource::Forecast, Some(&email)).await?;
            let records = flatten::flatten_rows(&historical, &forecast);
            let snapshot = utilization::aggregate(&records, &employee.id.to_string(), as_of);

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!(
                    "{} ({}, {})",
                    employee.full_name, employee.email, employee.practice
                );
                println!(
                    "  planned from calendar week {}: {}",
                    week::iso_week_number(as_of),
                    report::format_percent(snapshot.planned)
                );
                println!(
                    "  trailing average: {}",
                    report::format_percent(snapshot.average)
                );
            }
        }
        Commands::Board {
            practice,
            as_of,
            limit,
            json,
        } => {
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let employees = db::fetch_employees(&pool, practice.as_deref()).await?;
            let historical = db::fetch_sheet_rows(&pool, SheetSource::Actual, None).await?;
            let forecast = db::fetch_sheet_rows(&pool, SheetSource::Forecast, None).await?;
            let records = flatten::flatten_rows(&historical, &forecast);

            let mut rows = snapshot_employees(&employees, &records, as_of);
            rows.sort_by_key(|row| row.planned.unwrap_or(-1));
            rows.truncate(limit);

            if rows.is_empty() {
                println!("No consultants found.");
                return Ok(());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Consultants by planned utilization (as of {as_of}):");
                for row in rows.iter() {
                    println!(
                        "- {} ({}, {}) planned {} / trailing average {}",
                        row.full_name,
                        row.email,
                        row.practice,
                        report::format_percent(row.planned),
                        report::format_percent(row.average)
                    );
                }
            }
        }
        Commands::Report {
            practice,
            as_of,
            out,
        } => {
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let employees = db::fetch_employees(&pool, practice.as_deref()).await?;
            let historical = db::fetch_sheet_rows(&pool, SheetSource::Actual, None).await?;
            let forecast = db::fetch_sheet_rows(&pool, SheetSource::Forecast, None).await?;
            let records = flatten::flatten_rows(&historical, &forecast);

            let rows = snapshot_employees(&employees, &records, as_of);

            let ids: HashSet<String> = employees.iter().map(|e| e.id.to_string()).collect();
            let scoped: Vec<UtilizationWeekRecord> = records
                .into_iter()
                .filter(|record| {
                    record
                        .person_id
                        .as_deref()
                        .map_or(false, |id| ids.contains(id))
                })
                .collect();
            let trends = utilization::weekly_forecast_trend(&scoped, as_of);

            let report = report::build_report(practice.as_deref(), as_of, &rows, &trends);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn snapshot_employees(
    employees: &[EmployeeRecord],
    records: &[UtilizationWeekRecord],
    as_of: NaiveDate,
) -> Vec<EmployeeUtilization> {
    employees
        .iter()
        .map(|employee| {
            let snapshot = utilization::aggregate(records, &employee.id.to_string(), as_of);
            EmployeeUtilization {
                full_name: employee.full_name.clone(),
                email: employee.email.clone(),
                practice: employee.practice.clone(),
                planned: snapshot.planned,
                average: snapshot.average,
            }
        })
        .collect()
}

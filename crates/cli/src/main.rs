use crate::{
    commands::{Commands, FilterSource, SettingsSource},
    env::EnvManager,
    error::CliError,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use filter_engine::{
    FilterSettings, RecordFilterBackend, SqlFilterBackend, TableSchema, evaluate,
};
use filter_syntax::{FilterNode, encoder::encode, parser::parse};
use model::records::row::Record;
use planner::query::{
    dialect,
    renderer::{Statement, render},
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod output;

#[derive(Parser)]
#[command(
    name = "filterctl",
    version = "0.1.0",
    about = "Inspect, compile and apply table filter payloads"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Serialize)]
struct CheckReport {
    nodes: usize,
    fields: Vec<String>,
}

#[derive(Serialize)]
struct CompiledQuery {
    select: Statement,
    count: Statement,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { filter } => {
            let nodes = load_filter(&filter).await?;
            let mut fields: Vec<String> = Vec::new();
            for name in nodes.iter().flat_map(|n| n.fields()) {
                if !fields.iter().any(|f| f == name) {
                    fields.push(name.to_string());
                }
            }
            info!("Payload is valid");
            output::print_json(&CheckReport {
                nodes: nodes.len(),
                fields,
            })?;
        }
        Commands::Compile {
            filter,
            settings,
            table,
            schema,
            alias,
            columns,
            dialect: dialect_name,
            select,
            now,
        } => {
            let dialect = dialect::by_name(&dialect_name)
                .ok_or_else(|| CliError::UnsupportedDialect(dialect_name.clone()))?;
            let nodes = load_filter(&filter).await?;
            let settings = load_settings(&settings).await?;
            let now = parse_now(now.as_deref())?;
            let table_schema = build_schema(&table, schema.as_deref(), alias.as_deref(), &columns);

            let backend = SqlFilterBackend::new(&table_schema);
            let condition = evaluate(&nodes, &backend, now, settings)?;
            info!("Compiled filter for '{}' using {}", table, dialect.name());

            if select {
                let query = table_schema.select().filter(condition).build();
                output::print_json(&CompiledQuery {
                    count: render(&query.to_count(), dialect),
                    select: render(&query, dialect),
                })?;
            } else {
                // `null` means the payload does not restrict the rows.
                let statement = condition.map(|expr| render(&expr, dialect));
                output::print_json(&statement)?;
            }
        }
        Commands::Eval {
            filter,
            settings,
            records,
            now,
            output: output_file,
        } => {
            let nodes = load_filter(&filter).await?;
            let settings = load_settings(&settings).await?;
            let now = parse_now(now.as_deref())?;
            let rows = load_records(&records).await?;

            let backend =
                RecordFilterBackend::from_records(&rows).with_timezone(settings.timezone);
            let matched: Vec<serde_json::Value> = match evaluate(&nodes, &backend, now, settings)? {
                Some(predicate) => predicate.filter(&rows).into_iter().map(Record::to_json).collect(),
                None => rows.iter().map(Record::to_json).collect(),
            };
            info!("{} of {} record(s) matched", matched.len(), rows.len());

            match output_file {
                Some(path) => output::write_json(&matched, &path).await?,
                None => output::print_json(&matched)?,
            }
        }
        Commands::Normalize { filter } => {
            let nodes = load_filter(&filter).await?;
            output::print_json(&encode(&nodes))?;
        }
    }

    Ok(())
}

async fn load_filter(source: &FilterSource) -> Result<Vec<FilterNode>, CliError> {
    let payload = match (&source.filter, &source.filter_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        (None, None) => return Err(CliError::MissingFilter),
    };
    Ok(parse(&payload)?)
}

async fn load_settings(source: &SettingsSource) -> Result<FilterSettings, CliError> {
    let base = match &source.settings {
        Some(path) => FilterSettings::from_json_str(&tokio::fs::read_to_string(path).await?)?,
        None => FilterSettings::default(),
    };

    let mut env = EnvManager::new();
    if let Some(path) = &source.env_file {
        env.load_from_file(path)?;
    }
    env.filter_settings(base)
}

async fn load_records(path: &str) -> Result<Vec<Record>, CliError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            Record::from_json("record", row)
                .ok_or_else(|| CliError::Config(format!("Record {index} is not a JSON object")))
        })
        .collect()
}

fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| CliError::InvalidTimestamp(raw.to_string())),
        None => Ok(Utc::now()),
    }
}

/// `field=column` entries expose a column under another field name.
fn build_schema(
    table: &str,
    schema: Option<&str>,
    alias: Option<&str>,
    columns: &[String],
) -> TableSchema {
    let mut table_schema = columns.iter().fold(TableSchema::new(table), |acc, entry| {
        match entry.split_once('=') {
            Some((field, column)) => acc.field(field.trim(), column.trim()),
            None => acc.column(entry.trim()),
        }
    });
    if let Some(schema) = schema {
        table_schema = table_schema.in_schema(schema);
    }
    if let Some(alias) = alias {
        table_schema = table_schema.with_alias(alias);
    }
    table_schema
}

use clap::Parser;
use rustybridge::common::{Error, LogObserver, Observer, Result};
use rustybridge::config::{PipelineConfig, ReplayConfig, Settings};
use rustybridge::metrics::{latency_summary, total_cost_eur};
use rustybridge::sql::engine::{Connector, MemoryWarehouse, Session, Source};
use rustybridge::sql::read_sql_file;
use rustybridge::storage::csv;
use std::path::PathBuf;

/// Replays the extract-join-write pipeline against in-memory warehouses
/// seeded from CSV extracts.
#[derive(Parser, Debug)]
#[command(name = "rustybridge", version, about)]
struct Args {
    /// TOML configuration file. Environment variables prefixed with
    /// RUSTYBRIDGE_ override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the import and join logs are written to.
    #[arg(long, default_value = "metrics")]
    metrics_dir: PathBuf,

    /// Also save the joined table to this CSV file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref())?;
    settings.validate()?;
    let pipeline = settings
        .pipeline
        .clone()
        .ok_or_else(|| Error::Config("no [pipeline] section configured".to_string()))?;
    let replay = pipeline
        .replay
        .clone()
        .ok_or_else(|| Error::Config("no [pipeline.replay] extracts configured".to_string()))?;

    let observer = LogObserver::new_with_handle();
    let left_query = read_sql_file(&pipeline.left_sql, observer.as_ref());
    let right_query = read_sql_file(&pipeline.right_sql, observer.as_ref());
    let connectors = seed(&pipeline, &replay, &left_query, &right_query)?;

    let mut session = Session::new(settings, connectors, observer.clone());
    let left = session.execute(pipeline.left_source, &left_query)?;
    let right = session.execute(pipeline.right_source, &right_query)?;
    session.describe(&left, "left");
    session.describe(&right, "right");

    let joined = session.join(
        &left,
        &right,
        &pipeline.join_columns,
        &pipeline.output_columns,
    )?;
    session.validate(&joined, &pipeline.output_columns);
    session.write(&joined, &pipeline.target_table)?;
    if let Some(path) = &args.output {
        csv::write_table(&joined, path, false)?;
    }

    session.export_metrics(&args.metrics_dir)?;
    report(&session, observer.as_ref())?;
    println!("{joined}");
    session.close();
    Ok(())
}

/// Creates one in-memory warehouse per source and seeds each with the
/// extract answering its query.
fn seed(
    pipeline: &PipelineConfig,
    replay: &ReplayConfig,
    left_query: &str,
    right_query: &str,
) -> Result<Vec<(Source, Box<dyn Connector>)>> {
    let snowflake = MemoryWarehouse::new();
    let bigquery = MemoryWarehouse::new();
    let extracts = [
        (pipeline.left_source, left_query, &replay.left_csv),
        (pipeline.right_source, right_query, &replay.right_csv),
    ];
    for (source, query, path) in extracts {
        let warehouse = match source {
            Source::Snowflake => &snowflake,
            Source::BigQuery => &bigquery,
        };
        warehouse.load_csv(query, path)?;
    }
    Ok(vec![
        (Source::Snowflake, Box::new(snowflake.connector()) as Box<dyn Connector>),
        (Source::BigQuery, Box::new(bigquery.connector()) as Box<dyn Connector>),
    ])
}

fn report(session: &Session, observer: &dyn Observer) -> Result<()> {
    if let Some(latency) = latency_summary(session.import_log())? {
        observer.info(&format!(
            "Queries: {}, p50 {} ms, p95 {} ms, max {} ms.",
            latency.count, latency.p50_ms, latency.p95_ms, latency.max_ms
        ));
    }
    observer.info(&format!(
        "Estimated total cost: {:.4} EUR.",
        total_cost_eur(session.import_log())
    ));
    Ok(())
}

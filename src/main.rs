use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use kairosdb_datasource::config::Config;
use kairosdb_datasource::infra::ReqwestTransport;
use kairosdb_datasource::logging;
use kairosdb_datasource::request::{
    AnnotationOptions, DatasourceTarget, QueryOptions, Tags, TimeRange,
};
use kairosdb_datasource::templating::StaticTemplateService;
use kairosdb_datasource::KairosDBDatasource;

#[derive(Parser)]
#[command(name = "kairosdb_datasource")]
#[command(about = "Query a KairosDB backend the way the dashboard datasource does")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (defaults to $KAIROSDB_CONFIG or datasource.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable and healthy
    Health,
    /// List the metric names, prefixed by the template variables
    MetricNames,
    /// Show the feature catalog (backend or built-in)
    Features,
    /// Show the tags of a metric
    Tags {
        #[arg(long)]
        metric: String,
        /// Tag constraint as key=value (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
    },
    /// Resolve a template variable query, e.g. `"metric": "cpu", "tagKey": "host"`
    Find { query: String },
    /// Run a datapoints query for the targets stored in a JSON file
    Query {
        /// JSON list of targets, or an annotation definition with --annotation
        #[arg(long)]
        targets: PathBuf,
        /// Range start, Unix seconds
        #[arg(long)]
        from: i64,
        /// Range end, Unix seconds
        #[arg(long)]
        to: i64,
        #[arg(long)]
        annotation: bool,
        #[arg(long)]
        panel_id: Option<u64>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_filters(filters: &[String]) -> anyhow::Result<Tags> {
    let mut tags = Tags::new();
    for filter in filters {
        let Some((key, value)) = filter.split_once('=') else {
            bail!("Invalid filter '{}', expected key=value", filter);
        };
        tags.entry(key.to_string()).or_default().push(value.to_string());
    }
    Ok(tags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    debug!("Using datasource {} at {}", config.datasource.name, config.datasource.url);

    let transport = ReqwestTransport::new(&config.datasource).context("Failed to build HTTP client")?;
    let datasource = KairosDBDatasource::new(
        config.datasource.clone(),
        Arc::new(transport),
        Arc::new(StaticTemplateService::new(config.variables.clone())),
    );

    match cli.command {
        Commands::Health => {
            let status = datasource.test_datasource().await;
            print_json(&status)?;
            if !status.is_success() {
                std::process::exit(1);
            }
        }
        Commands::MetricNames => {
            datasource.initialize().await;
            if datasource.has_initialization_error() {
                bail!("Failed to load metric names");
            }
            let names = datasource.metric_names_store().get().await.unwrap_or_default();
            print_json(&names)?;
        }
        Commands::Features => {
            let features = datasource.get_features().await;
            let catalog: Vec<_> = features
                .iter()
                .map(|feature| {
                    json!({
                        "name": feature.name,
                        "label": feature.label,
                        "components": feature.components.iter().map(|c| &c.name).collect::<Vec<_>>(),
                    })
                })
                .collect();
            print_json(&catalog)?;
        }
        Commands::Tags { metric, filters } => {
            let tags = datasource.get_metric_tags(&metric, &parse_filters(&filters)?).await?;
            print_json(&tags)?;
        }
        Commands::Find { query } => {
            print_json(&datasource.metric_find_query(&query).await?)?;
        }
        Commands::Query {
            targets,
            from,
            to,
            annotation,
            panel_id,
        } => {
            let content = std::fs::read_to_string(&targets)
                .with_context(|| format!("Failed to read {}", targets.display()))?;
            let range = TimeRange { from, to };

            if annotation {
                let annotation: AnnotationOptions = serde_json::from_str(&content)?;
                let options = QueryOptions::new(range, Vec::new()).with_annotation(annotation);
                let annotations = datasource.annotation_query(&options).await?;
                info!("Query produced {} annotations", annotations.len());
                print_json(&annotations)?;
            } else {
                let targets: Vec<DatasourceTarget> = serde_json::from_str(&content)?;
                let mut options = QueryOptions::new(range, targets);
                if let Some(panel_id) = panel_id {
                    options = options.with_panel_id(panel_id);
                }
                let series = datasource.query(&options).await?;
                info!("Query produced {} series", series.len());
                print_json(&series)?;
            }
        }
    }

    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use datasource_http::context::{apply_assignment, load_data_file, load_env_file, DataContext};
use datasource_http::datasource::{load_definition, load_request_config, Datasource, RequestConfig};
use datasource_http::executor::{print_outcome, print_response_error, ExecutorOptions, RequestExecutor};
use datasource_http::DatasourceError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "datasource-http",
    version,
    about = "Run templated datasource HTTP requests",
    disable_help_subcommand = true
)]
struct Cli {
    /// Datasource definition (.json) or a directory containing datasource.json
    #[arg(value_name = "DATASOURCE")]
    datasource: PathBuf,

    /// Endpoint to call
    #[arg(short = 'E', long)]
    endpoint: Option<String>,

    /// Request config file (endpoint, queryString, outboundConfig, dataMapping)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON object used as the data context
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Env file merged into the data context
    #[arg(short, long)]
    env: Option<PathBuf>,

    /// Set a context value, KEY=VALUE (repeatable, dotted keys nest)
    #[arg(short = 'v', long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,

    /// Query string appended to the endpoint URL
    #[arg(short, long)]
    query: Option<String>,

    /// Verify TLS certificates instead of accepting any
    #[arg(long)]
    verify_certs: bool,

    /// Print only the result JSON
    #[arg(long)]
    raw: bool,

    /// Override base directory used for resolving paths
    #[arg(long)]
    cwd: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let base_dir = cli
        .cwd
        .as_ref()
        .map(|p| resolve_path(Path::new(p)))
        .transpose()?
        .unwrap_or(std::env::current_dir()?);

    let loaded = load_definition(&resolve_relative(&base_dir, &cli.datasource))
        .context("loading datasource")?;
    let datasource = Datasource::from_definition(loaded.definition)
        .with_context(|| format!("configuring datasource {}", loaded.path.display()))?;

    let config = build_request_config(&cli, &base_dir)?;
    let context = build_context(&cli, &base_dir)?;

    let executor = RequestExecutor::with_options(
        datasource,
        ExecutorOptions {
            accept_invalid_certs: !cli.verify_certs,
        },
    )?;

    match executor.request(&context, &config).await {
        Ok(outcome) => {
            if cli.raw {
                println!("{}", outcome.into_value());
            } else {
                print_outcome(&outcome);
            }
            Ok(())
        }
        Err(DatasourceError::HttpResponse(err)) => {
            print_response_error(&err);
            bail!("datasource request failed with status {}", err.status)
        }
        Err(err) => Err(err).with_context(|| format!("calling endpoint {}", config.endpoint)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_request_config(cli: &Cli, base_dir: &Path) -> Result<RequestConfig> {
    let mut config = match &cli.config {
        Some(path) => load_request_config(&resolve_relative(base_dir, path))?,
        None => RequestConfig::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(query) = &cli.query {
        config.query_string = Some(query.clone());
    }
    if config.endpoint.is_empty() {
        bail!("No endpoint selected; pass --endpoint or set it in --config");
    }
    Ok(config)
}

fn build_context(cli: &Cli, base_dir: &Path) -> Result<DataContext> {
    let mut context = match &cli.data {
        Some(path) => load_data_file(&resolve_relative(base_dir, path))?,
        None => DataContext::new(),
    };

    if let Some(env) = &cli.env {
        load_env_file(&resolve_relative(base_dir, env), &mut context)?;
    }
    for assignment in &cli.vars {
        apply_assignment(assignment, &mut context)?;
    }
    Ok(context)
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

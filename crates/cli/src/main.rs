//! Courier CLI - Command-line front end for the Courier HTTP request manager

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier_core::{
    on_progress, ManagerConfig, RequestDescriptor, RequestItem, RequestManager, ResultFormat,
};
use courier_infra_http::ReqwestTransport;

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Courier HTTP request manager CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Manager timeout in milliseconds (0 = none)
    #[arg(long, global = true, env = "COURIER_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Allow plain http urls
    #[arg(long, global = true)]
    allow_http: bool,

    /// Base url for relative request urls
    #[arg(long, global = true, env = "COURIER_BASE_URL")]
    base_url: Option<String>,

    /// Run requests one at a time instead of concurrently
    #[arg(long, global = true)]
    sync: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Output::Table)]
    output: Output,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one or more urls as a batch
    Fetch {
        /// Urls (absolute, or relative to --base-url)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Serialize the requests through this queue
        #[arg(short, long)]
        queue: Option<String>,

        /// Decode responses as JSON
        #[arg(long)]
        json: bool,

        /// POST parameter as key=value (repeatable, switches to POST)
        #[arg(long = "post", value_parser = parse_pair)]
        post: Vec<(String, String)>,
    },

    /// Print the url query string for key=value pairs
    Query {
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },

    /// Check whether a url answers with a success status
    Exists { url: String },

    /// Check internet connectivity
    Online,

    /// Print the response headers of a url
    Headers { url: String },

    /// Load every resource named in a list file
    Resources {
        /// Url of the list file (one resource name per line)
        list_url: String,

        /// Url the resource names are relative to
        base_url: String,
    },
}

/// Parse `key=value`
fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// JSON literals (`1`, `true`, `[1,2]`) keep their type, anything else is a string
fn pair_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn init_tracing() {
    let log_format = std::env::var("COURIER_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("courier=info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so command output stays pipeable
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn build_manager(cli: &Cli) -> Result<RequestManager> {
    let mut config = ManagerConfig::from_env().context("Invalid COURIER_* configuration")?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if cli.allow_http {
        config.is_only_https = false;
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.trim().to_string();
    }
    if cli.sync {
        config.asynchronous = false;
    }

    debug!(config = ?config, "Manager configuration");
    let transport = ReqwestTransport::new().context("Failed to build HTTP client")?;
    Ok(RequestManager::with_config(config, Arc::new(transport)))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let manager = build_manager(&cli)?;

    match &cli.command {
        Commands::Fetch {
            urls,
            queue,
            json,
            post,
        } => {
            if let Some(queue) = queue {
                manager.create_queue(queue)?;
            }

            let items: Vec<RequestItem> = urls
                .iter()
                .map(|url| {
                    let mut descriptor = if post.is_empty() {
                        RequestDescriptor::get(url)
                    } else {
                        post.iter().fold(RequestDescriptor::post(url), |d, (k, v)| {
                            d.with_post_param(k, pair_value(v))
                        })
                    };
                    if *json {
                        descriptor = descriptor.with_result_format(ResultFormat::Json);
                    }
                    descriptor.into()
                })
                .collect();

            let show_progress = cli.output == Output::Table;
            let progress = on_progress(move |url, total| {
                if show_progress {
                    eprintln!("  {} {} (of {})", "•".cyan(), url, total);
                }
            });

            let handle = match queue {
                Some(queue) => manager.queue(items, queue, None, progress)?,
                None => manager.execute(items, None, progress)?,
            };
            let outcome = handle.wait().await?;
            match cli.output {
                Output::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                Output::Table => render::print_outcome(&outcome),
            }
        }

        Commands::Query { pairs } => {
            let map: IndexMap<String, Value> = pairs
                .iter()
                .map(|(k, v)| (k.clone(), pair_value(v)))
                .collect();
            println!("{}", manager.generate_url_query_string(&map)?);
        }

        Commands::Exists { url } => {
            let found = Arc::new(Mutex::new(None));
            let (yes, no) = (Arc::clone(&found), Arc::clone(&found));
            manager
                .url_exists(
                    url,
                    move || *yes.lock().unwrap_or_else(|e| e.into_inner()) = Some(true),
                    move || *no.lock().unwrap_or_else(|e| e.into_inner()) = Some(false),
                )?
                .wait()
                .await?;

            let exists = found.lock().unwrap_or_else(|e| e.into_inner()).unwrap_or(false);
            render::print_flag(cli.output, "exists", exists, url);
        }

        Commands::Online => {
            let online = Arc::new(Mutex::new(false));
            let flag = Arc::clone(&online);
            manager
                .is_internet_available(
                    move || *flag.lock().unwrap_or_else(|e| e.into_inner()) = true,
                    || {},
                )?
                .wait()
                .await?;

            let online = *online.lock().unwrap_or_else(|e| e.into_inner());
            render::print_flag(cli.output, "online", online, "internet");
        }

        Commands::Headers { url } => {
            let lines = Arc::new(Mutex::new(Vec::new()));
            let failure = Arc::new(Mutex::new(None));
            let (sink, fail) = (Arc::clone(&lines), Arc::clone(&failure));
            manager
                .get_url_headers(
                    url,
                    move |found| {
                        sink.lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .extend_from_slice(found)
                    },
                    move |msg, code| {
                        *fail.lock().unwrap_or_else(|e| e.into_inner()) =
                            Some((msg.to_string(), code))
                    },
                )?
                .wait()
                .await?;

            if let Some((msg, code)) = failure.lock().unwrap_or_else(|e| e.into_inner()).take() {
                anyhow::bail!("Could not read headers of {} ({}): {}", url, code, msg);
            }
            let lines = lines.lock().unwrap_or_else(|e| e.into_inner()).clone();
            render::print_headers(cli.output, &lines)?;
        }

        Commands::Resources { list_url, base_url } => {
            type Loaded = (Vec<String>, Vec<String>);
            let loaded: Arc<Mutex<Option<Loaded>>> = Arc::new(Mutex::new(None));
            let failure = Arc::new(Mutex::new(None));
            let (sink, fail) = (Arc::clone(&loaded), Arc::clone(&failure));

            manager
                .load_resources_from_list(
                    list_url,
                    base_url,
                    move |names, bodies| {
                        *sink.lock().unwrap_or_else(|e| e.into_inner()) =
                            Some((names.to_vec(), bodies.to_vec()))
                    },
                    move |url, msg, code| {
                        *fail.lock().unwrap_or_else(|e| e.into_inner()) =
                            Some((url.to_string(), msg.to_string(), code))
                    },
                    None,
                )?
                .wait()
                .await?;

            if let Some((url, msg, code)) = failure.lock().unwrap_or_else(|e| e.into_inner()).take() {
                anyhow::bail!("Failed to load {} ({}): {}", url, code, msg);
            }
            let (names, bodies) = loaded
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take()
                .unwrap_or_default();
            render::print_resources(cli.output, &names, &bodies)?;
        }
    }

    Ok(())
}

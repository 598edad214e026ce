//! Catalog-Ripple main entry point
//!
//! This is the command-line interface for the Catalog-Ripple catalog mapper.

use anyhow::Context;
use catalog_ripple::config::{load_config, validate, Config};
use catalog_ripple::output::{format_tree, write_markdown, CatalogReport};
use catalog_ripple::{CatalogCrawler, CatalogError, Filter};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Ripple: an ArcGIS REST catalog mapper
///
/// Catalog-Ripple resolves a working REST endpoint from a host name or URL
/// and lists its folders, services, layers and fields, optionally filtered.
#[derive(Parser, Debug)]
#[command(name = "catalog-ripple")]
#[command(version)]
#[command(about = "An ArcGIS REST catalog mapper", long_about = None)]
struct Cli {
    /// Host name or REST URL (server, folder, service or layer)
    #[arg(value_name = "CONNECTION")]
    connection: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Proxy page for hosts that reject direct requests
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Filter flag (repeatable): cached-services, feature-services,
    /// image-services, geoprocessing-services, editable-layers, spatial-layers
    #[arg(short, long = "filter", value_name = "NAME")]
    filters: Vec<String>,

    /// Levels to expand below the root level
    #[arg(short, long, value_name = "N")]
    depth: Option<u32>,

    /// Only classify or resolve the connection, without crawling
    #[arg(long, conflicts_with = "info")]
    resolve: bool,

    /// Show the resolved server and its authentication support
    #[arg(long, conflicts_with = "resolve")]
    info: bool,

    /// Write a markdown report to this path
    #[arg(long, value_name = "PATH")]
    markdown: Option<PathBuf>,

    /// Print the result as JSON instead of a text tree
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let crawler = CatalogCrawler::new(&config).context("Failed to build HTTP client")?;
    let proxy = config.client.proxy_url.as_deref();

    if cli.resolve {
        handle_resolve(&crawler, &cli, proxy).await
    } else if cli.info {
        handle_info(&crawler, &cli, proxy).await
    } else {
        handle_crawl(&crawler, &cli, &config, proxy).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_ripple=info,warn"),
            1 => EnvFilter::new("catalog_ripple=debug,info"),
            2 => EnvFilter::new("catalog_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Adds a hint when a host refused direct access and no proxy was given
fn explain(error: CatalogError, proxy: Option<&str>) -> anyhow::Error {
    if error.is_security() && proxy.is_none() {
        anyhow::Error::new(error).context("The host rejected direct access; retry with --proxy URL")
    } else {
        error.into()
    }
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(proxy) = &cli.proxy {
        config.client.proxy_url = Some(proxy.clone());
    }
    if !cli.filters.is_empty() {
        config.crawl.filter = cli.filters.clone();
    }
    if let Some(depth) = cli.depth {
        config.crawl.max_depth = depth;
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Handles --resolve: classifies the connection or resolves its server
async fn handle_resolve(
    crawler: &CatalogCrawler,
    cli: &Cli,
    proxy: Option<&str>,
) -> anyhow::Result<()> {
    let resource = crawler
        .resolve(&cli.connection, proxy)
        .await
        .map_err(|e| explain(e, proxy))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resource)?);
    } else {
        println!("{}", resource);
        println!("  URL: {}", resource.url);
        if let Some(tag) = &resource.tag {
            println!("  Tag: {}", tag);
        }
        if let Some(proxy) = &resource.proxy_url {
            println!("  Proxy: {}", proxy);
        }
    }
    Ok(())
}

/// Handles --info: shows the resolved server
async fn handle_info(
    crawler: &CatalogCrawler,
    cli: &Cli,
    proxy: Option<&str>,
) -> anyhow::Result<()> {
    let info = crawler
        .get_server_info(&cli.connection, proxy)
        .await
        .map_err(|e| explain(e, proxy))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Services URL: {}", info.url);
        println!("Base URL: {}", info.base_url);
        if let Some(proxy) = &info.proxy_url {
            println!("Proxy: {}", proxy);
        }
        println!(
            "Token authentication: {}",
            if info.authentication_info.supports_token_authentication {
                "supported"
            } else {
                "not supported"
            }
        );
        if let Some(tokens) = &info.authentication_info.token_services_url {
            println!("Token service: {}", tokens);
        }
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    crawler: &CatalogCrawler,
    cli: &Cli,
    config: &Config,
    proxy: Option<&str>,
) -> anyhow::Result<()> {
    let filter = Filter::from_names(&config.crawl.filter)?;
    tracing::info!(
        "Crawling '{}' (filter: {}, depth: {})",
        cli.connection,
        if filter.is_empty() {
            "none".to_string()
        } else {
            filter.names().join(", ")
        },
        config.crawl.max_depth
    );

    let crawl = crawler.crawl_tree(&cli.connection, filter, proxy, config.crawl.max_depth);
    let nodes = tokio::select! {
        result = crawl => result.map_err(|e| explain(e, proxy))?,
        _ = tokio::signal::ctrl_c() => {
            crawler.cancel();
            anyhow::bail!("Interrupted");
        }
    };

    // Resolution already happened, so this is a cache lookup for host connections
    let server = crawler.get_server_info(&cli.connection, proxy).await.ok();
    let report = CatalogReport::new(cli.connection.clone(), filter, nodes).with_server(server);
    tracing::info!(
        "Found {} resources ({} services, {} layers)",
        report.total(),
        report.service_count(),
        report.layer_count()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.nodes)?);
    } else {
        print!("{}", format_tree(&report.nodes));
    }

    if let Some(path) = &cli.markdown {
        write_markdown(&report, path)?;
        if !cli.quiet {
            eprintln!("✓ Report written to: {}", path.display());
        }
    }

    Ok(())
}

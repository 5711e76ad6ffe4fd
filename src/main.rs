#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use std::str::FromStr;

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use subshift::cli::Args;
use subshift::config::ConverterConfig;
use subshift::generator::{self, Target, read_source, write_output};
use subshift::{parser, rules, transform};
use tracing::Level;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    if args.list_presets {
        let catalogue = serde_json::to_string_pretty(&rules::catalogue())
            .context("Failed to serialize preset catalogue")?;
        println!("{catalogue}");
        return Ok(());
    }

    let config_source = args
        .config
        .as_deref()
        .ok_or_else(|| anyhow!("A converter config is required"))?;
    tracing::info!("Loading converter config from: {}", config_source);
    let mut config = ConverterConfig::load(config_source).await?;

    if let Some(target) = args.target {
        Target::from_str(&target).map_err(|e| anyhow!("Invalid target override: {}", e))?;
        config.target = target;
    }
    let target = config.get_target()?;

    let content = read_source(&config.subscription).await?;
    let nodes = parser::parse_subscription(&content);
    tracing::info!("Decoded {} nodes", nodes.len());

    if args.dump_nodes {
        let dump =
            serde_json::to_string_pretty(&nodes).context("Failed to serialize decoded nodes")?;
        println!("{dump}");
        return Ok(());
    }

    let nodes = transform::annotate(nodes, &config.annotate_options());
    tracing::info!("{} nodes after filtering", nodes.len());

    let payload = generator::encode(&nodes, target, &config.conversion_options());
    if payload.is_empty() && !nodes.is_empty() {
        bail!("Target {} produced empty output", target);
    }

    let output_path = match args.output {
        Some(path) => generator::expand_tilde(&path),
        None => config.output_path()?,
    };
    write_output(&output_path, &payload).await?;

    tracing::info!("Conversion to {} complete!", target);
    Ok(())
}

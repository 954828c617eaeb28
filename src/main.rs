use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;

use repost_watch::{
    PipelineError,
    cli::CliArgs,
    config::load_config,
    core::{PipelineParams, RepostFinder},
    display,
    engines::{Serper, WebSearch},
    providers::{BlogIndex, DocumentSource, HtmlExtractor, ManualQuery, SingleDocument},
};

fn document_source(args: &CliArgs, extractor: HtmlExtractor) -> Result<Box<dyn DocumentSource>> {
    if let Some(query) = args.query.as_deref()
        && !query.trim().is_empty()
    {
        log::info!("Using the manual query, the blog is not fetched");
        return Ok(Box::new(ManualQuery(query.to_string())));
    }

    if let Some(url) = &args.document_url {
        return Ok(Box::new(SingleDocument::new(url, extractor)));
    }

    if let Some(url) = &args.blog_url {
        return Ok(Box::new(BlogIndex::new(url, extractor)));
    }

    bail!("Nothing to track: pass --blog-url, --document-url or --query")
}

async fn run() -> Result<()> {
    let args = CliArgs::parse();
    args.warn_unusual();

    let config = load_config(&args)?;

    let engine = Serper::new(&config.search)?;
    engine
        .check_credentials()
        .map_err(|e| PipelineError::Auth(e.to_string()))
        .context("Pass --api-key or set SERPER_API_KEY")?;

    let extractor =
        HtmlExtractor::new(&config.candidates).context("Failed to build the HTTP client")?;

    let source = document_source(&args, extractor.clone())?;
    log::info!("Collecting documents ({})", source.name());
    let docs = source.documents().await;

    if docs.is_empty() {
        bail!("No documents found. Check the url or the structure of the blog.");
    }

    log::info!(
        "Tracking {} documents:\n{}",
        docs.len(),
        display::table::documents(&docs)
    );

    let finder = RepostFinder::new(Arc::new(engine), Arc::new(extractor), &config);
    let findings = finder
        .find_reposts(&docs, &PipelineParams::from_config(&config))
        .await?;

    if findings.is_empty() {
        log::warn!("No pages similar enough to your articles were found");
    }

    display::write(
        &findings,
        config.output.format,
        config.output.path.as_deref(),
    )
    .await
}

#[tokio::main]
async fn main() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(err) = run().await {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

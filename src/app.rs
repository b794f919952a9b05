use std::sync::Arc;

use clap::{error::ErrorKind, Parser};
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::controller::{Completion, ViewController};
use crate::fetcher::{FetcherOptions, HttpListFetcher, ListFetcher, DEFAULT_API_BASE};
use crate::filters::{self, FilterTables};
use crate::model::Category;
use crate::output::{self, Loader, OutputFormat};
use crate::route;

#[derive(Clone, Debug, PartialEq, Eq)]
struct RunConfig {
    query: String,
    interactive: bool,
    pages: u32,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
    fetcher: FetcherOptions,
}

/// Composes the view query from `--query`, or from `--category`/`--filter`
/// with the config file's category as fallback.
fn build_query(args: &CliArgs, cfg: &ConfigFile) -> Result<String, String> {
    if let Some(query) = args.query.as_deref() {
        return Ok(query.trim().trim_start_matches('?').to_string());
    }
    let category = match args.category.as_deref().or(cfg.category.as_deref()) {
        Some(raw) => raw
            .parse::<Category>()
            .map_err(|e| format!("invalid category '{raw}': {e}"))?,
        None => Category::default(),
    };
    let mut pairs: Vec<(String, String)> = Vec::new();
    for raw in args.filter.iter() {
        let pair = validation::parse_filter_arg(raw)
            .map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
        pairs.push(pair);
    }
    let borrowed: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    Ok(route::location(category, &filters::encode_pairs(&borrowed)))
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let query = build_query(&args, &cfg)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let pages = args.pages.or(cfg.pages).unwrap_or(1);
    if pages == 0 {
        return Err("invalid pages, expected positive integer".to_string());
    }

    let output_format = if args.json {
        OutputFormat::Json
    } else {
        let raw = args
            .output_format
            .clone()
            .or(cfg.output_format.clone())
            .unwrap_or_else(|| "text".to_string());
        OutputFormat::parse(&raw).ok_or_else(|| format!("invalid output format '{raw}'"))?
    };

    let api_base = args
        .api_base
        .or(cfg.api_base)
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    reqwest::Url::parse(&api_base).map_err(|e| format!("invalid api base '{api_base}': {e}"))?;

    let fetcher = FetcherOptions {
        api_base,
        timeout_seconds: args.timeout.or(cfg.timeout).unwrap_or(0),
        rate: args.rate.or(cfg.rate).unwrap_or(0),
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
    };

    Ok(RunConfig {
        query,
        interactive: args.interactive,
        pages,
        output_format,
        no_color,
        verbose: args.verbose,
        fetcher,
    })
}

fn configure_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("catalogview={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_batch(run: &RunConfig, fetcher: &dyn ListFetcher) -> Result<(), String> {
    let text = run.output_format == OutputFormat::Text;
    let (mut view, request) = match ViewController::mount(&run.query, FilterTables::default()) {
        Ok(mounted) => mounted,
        Err(redirect) => {
            eprint!(
                "{}",
                output::render_redirect_page(
                    &redirect.requested,
                    "run again with --category Characters to go back to the main view",
                    run.no_color
                )
            );
            return Err(redirect.to_string());
        }
    };

    if text {
        print!("{}", output::render_header(view.category(), run.no_color));
    }

    let mut next = Some(request);
    let mut fetched = 0u32;
    while let Some(request) = next.take() {
        let loader = Loader::start(
            format!("loading {} page {}", request.query.category, request.query.page),
            !text,
        );
        let completion = view.run(fetcher, request).await;
        loader.finish();
        fetched += 1;
        info!(?completion, "page completed");
        if matches!(completion, Completion::Empty | Completion::Failed) {
            break;
        }
        if fetched < run.pages {
            next = view.load_more();
        }
    }

    match run.output_format {
        OutputFormat::Text => print!("{}", output::render_view(&view, run.no_color)),
        OutputFormat::Json => {
            let rendered = output::render_json(&view);
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            stdout
                .write_all(b"\n")
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
    }

    view.teardown();
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let fetcher = HttpListFetcher::new(&run.fetcher).map_err(|e| e.to_string())?;
    info!(api_base = fetcher.api_base(), query = %run.query, "starting view");
    if run.interactive {
        crate::session::run_session(Arc::new(fetcher), &run.query, run.no_color).await
    } else {
        run_batch(&run, &fetcher).await
    }
}

fn load_user_config(args: &CliArgs) -> Result<ConfigFile, String> {
    match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
}

fn init_config(args: &CliArgs) -> Result<(), String> {
    let path = match args.config.as_deref() {
        Some(path) => config::expand_tilde(path),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!("wrote default config to {}", path.display());
    } else {
        println!("config already exists at {}", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        return init_config(&args);
    }

    let cfg = load_user_config(&args)?;
    let run = build_run_config(args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }
    configure_logging(run.verbose);

    // everything runs on one thread; page requests are the only suspension points
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

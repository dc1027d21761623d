use boq_tagger::{cli, config, error, pipeline, scanner, tags, workbook};
use boq_tagger::classifier::{ClassificationCache, CliClassifier, RetryPolicy};
use boq_tagger_common::score_predictions;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::{BoqError, Result};
use pipeline::{Pipeline, PipelineOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.max_attempts,
        base_delay: Duration::from_millis(config.retry_base_delay_ms),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(provider) = cli.ai_provider {
        config.provider = provider;
    }
    tracing::debug!("config: {:?}", config);

    match cli.command {
        Commands::Run { data_dir, tag_map, output_dir, strategy, concurrency, use_cache, mismatches } => {
            println!("boq-tagger - classify and score\n");

            let tag_map_path = tag_map.unwrap_or_else(|| config.tag_map_path.clone());
            let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());

            println!("[1/3] Loading tag map...");
            let tag_map = pipeline::load_tag_map(&tag_map_path)?;
            println!("✔ {} raw tags, {} trades\n", tag_map.len(), tag_map.trade_count());

            println!("[2/3] Scanning workbooks...");
            let workbooks = scanner::scan_folder(&data_dir)?;
            if workbooks.is_empty() {
                return Err(BoqError::NoInputFound(data_dir.display().to_string()));
            }
            println!("✔ {} workbook(s) found\n", workbooks.len());

            println!(
                "[3/3] Classifying with {}...{}",
                config.provider,
                if use_cache { " (cache enabled)" } else { "" }
            );
            let options = PipelineOptions {
                strategy,
                concurrency: concurrency.unwrap_or(config.max_concurrency),
                retry: retry_policy(&config),
                fallback_tag: config.fallback_tag.clone(),
                output_dir,
                use_cache,
                write_mismatches: mismatches,
                show_progress: !cli.verbose,
            };
            let pipeline = Pipeline::new(CliClassifier::from_config(&config), tag_map, options);
            let reports = pipeline.run(&workbooks).await?;

            let items: usize = reports.iter().map(|r| r.items).sum();
            println!("\n✅ Done: {} file(s), {} work item(s)", reports.len(), items);
        }

        Commands::Extract { file, strategy, output } => {
            let items = workbook::extract_items(&file, strategy)?;
            let json = serde_json::to_string_pretty(&items)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✔ {} work items saved to {}", items.len(), path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Score { predictions, tag_map, mismatches } => {
            let tag_map_path = tag_map.unwrap_or_else(|| config.tag_map_path.clone());
            let tag_map = pipeline::load_tag_map(&tag_map_path)?;
            let predictions = pipeline::load_predictions(&predictions)?;

            let score = score_predictions(&predictions, &tag_map);
            if mismatches {
                for m in &score.mismatches {
                    println!(
                        "{}/{} row {}: predicted {:?}, {} maps to {:?}",
                        m.file, m.sheet, m.row, m.predicted_tag, m.raw_tag, m.mapped_trade
                    );
                }
            }
            println!("{score}");
        }

        Commands::Tags { data_dir, output } => {
            println!("boq-tagger - build tag map\n");

            let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());
            let output = output.unwrap_or_else(|| config.tag_map_path.clone());

            let workbooks = scanner::scan_folder(&data_dir)?;
            if workbooks.is_empty() {
                return Err(BoqError::NoInputFound(data_dir.display().to_string()));
            }

            let options = tags::TagBuildOptions {
                concurrency: config.max_concurrency,
                retry: retry_policy(&config),
                show_progress: !cli.verbose,
            };
            let count = tags::build_tag_map(&CliClassifier::from_config(&config), &workbooks, &output, &options).await?;
            println!("\n✅ {} tags written to {}", count, output.display());
        }

        Commands::Config { set_provider, set_model, show } => {
            if let Some(provider) = set_provider {
                config.set_provider(provider)?;
                println!("✔ AI provider set: {}", provider);
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ Model set: {}", config.model.as_deref().unwrap_or_default());
            }

            if show {
                println!("Settings:");
                println!("  Provider: {}", config.provider);
                println!("  Model: {}", config.model.as_deref().unwrap_or("(provider default)"));
                println!("  Timeout: {}s", config.timeout_seconds);
                println!("  Concurrency: {}", config.max_concurrency);
                println!("  Attempts: {} (base delay {}ms)", config.max_attempts, config.retry_base_delay_ms);
                println!("  Fallback tag: {}", config.fallback_tag);
                println!("  Tag map: {}", config.tag_map_path.display());
                println!("  Data dir: {}", config.data_dir.display());
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = ClassificationCache::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = ClassificationCache::load(&target);
                    println!("Cache info:");
                    println!("  Path: {}", cache_path.display());
                    println!("  Entries: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  Size: {} bytes", meta.len());
                    }
                } else {
                    println!("No cache file: {}", cache_path.display());
                }
            }

            if clear {
                match ClassificationCache::clear(&target) {
                    Ok(true) => println!("✔ Cache deleted: {}", cache_path.display()),
                    Ok(false) => println!("No cache file"),
                    Err(e) => eprintln!("Failed to delete cache: {}", e),
                }
            }
        }
    }

    Ok(())
}

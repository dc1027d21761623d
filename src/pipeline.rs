//! Pipeline driver
//!
//! Per workbook: extract work items, classify each one through the oracle
//! (bounded concurrency, optional cache), persist predictions, and score
//! them against the reference tag map.

use crate::classifier::cache::cache_key;
use crate::classifier::{classify_batch, Classification, Classifier, ClassificationCache, Outcome, RetryPolicy};
use crate::error::{BoqError, Result};
use crate::scanner::WorkbookInfo;
use crate::workbook;
use boq_tagger_common::{
    score_predictions, ExtractionStrategy, Mismatch, Prediction, ScoreResult, TagMap, WorkItem,
    FALLBACK_TAG,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub strategy: ExtractionStrategy,
    /// Oracle calls in flight at once
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub fallback_tag: String,
    pub output_dir: PathBuf,
    pub use_cache: bool,
    pub write_mismatches: bool,
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::Auto,
            concurrency: 4,
            retry: RetryPolicy::default(),
            fallback_tag: FALLBACK_TAG.into(),
            output_dir: PathBuf::from("."),
            use_cache: false,
            write_mismatches: false,
            show_progress: true,
        }
    }
}

/// Per-file classification counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationStats {
    pub cache_hits: usize,
    pub off_list: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub items: usize,
    pub predictions_path: PathBuf,
    pub score: ScoreResult,
    pub stats: ClassificationStats,
}

pub struct Pipeline<C> {
    classifier: C,
    tag_map: TagMap,
    allowed: Vec<String>,
    options: PipelineOptions,
}

impl<C: Classifier> Pipeline<C> {
    pub fn new(classifier: C, tag_map: TagMap, options: PipelineOptions) -> Self {
        let allowed = tag_map.allowed_labels(&options.fallback_tag);
        Self {
            classifier,
            tag_map,
            allowed,
            options,
        }
    }

    /// Labels offered to the oracle; every prediction is one of these
    pub fn allowed_labels(&self) -> &[String] {
        &self.allowed
    }

    /// Classify work items in order. Cached answers skip the oracle.
    pub async fn classify_items(
        &self,
        items: &[WorkItem],
        cache: &mut ClassificationCache,
    ) -> (Vec<Prediction>, ClassificationStats) {
        let identity = self.classifier.cache_identity();
        let keys: Vec<String> = items
            .iter()
            .map(|item| cache_key(&identity, &item.description, &self.allowed))
            .collect();

        let mut results: Vec<Option<Classification>> = keys
            .iter()
            .map(|key| if self.options.use_cache { cache.get(key) } else { None })
            .collect();

        let pending: Vec<usize> = (0..items.len()).filter(|&i| results[i].is_none()).collect();
        let mut stats = ClassificationStats {
            cache_hits: items.len() - pending.len(),
            ..Default::default()
        };
        if stats.cache_hits > 0 {
            tracing::debug!("{} classification(s) served from cache", stats.cache_hits);
        }

        let descriptions: Vec<&str> = pending.iter().map(|&i| items[i].description.as_str()).collect();
        let progress = progress_bar(descriptions.len(), self.options.show_progress);
        let fresh = classify_batch(
            &self.classifier,
            &descriptions,
            &self.allowed,
            &self.options.fallback_tag,
            self.options.retry,
            self.options.concurrency,
            &progress,
        )
        .await;
        progress.finish_and_clear();

        for (idx, classification) in pending.into_iter().zip(fresh) {
            if self.options.use_cache {
                cache.insert(keys[idx].clone(), &items[idx].description, &classification);
            }
            results[idx] = Some(classification);
        }

        let predictions: Vec<Prediction> = items
            .iter()
            .zip(results.into_iter().flatten())
            .map(|(item, classification)| {
                match classification.outcome {
                    Outcome::Accepted => {}
                    Outcome::OffList(_) => stats.off_list += 1,
                    Outcome::Failed(_) => stats.failed += 1,
                }
                Prediction::from_item(item, classification.tag)
            })
            .collect();

        (predictions, stats)
    }

    /// Extract, classify, persist and score one workbook
    pub async fn process_file(&self, workbook_info: &WorkbookInfo) -> Result<FileReport> {
        let path = workbook_info.path.clone();
        let strategy = self.options.strategy;
        let items = tokio::task::spawn_blocking(move || workbook::extract_items(&path, strategy))
            .await
            .map_err(|e| BoqError::Workbook(format!("{}: extraction task failed: {}", workbook_info.file_name, e)))??;
        println!("Found {} work items", items.len());

        let output_dir = &self.options.output_dir;
        std::fs::create_dir_all(output_dir)?;

        let mut cache = if self.options.use_cache {
            ClassificationCache::load(output_dir)
        } else {
            ClassificationCache::default()
        };

        let (predictions, stats) = self.classify_items(&items, &mut cache).await;

        if self.options.use_cache {
            cache.save(output_dir)?;
        }

        let predictions_path = output_dir.join(format!("predictions_{}.json", workbook_info.stem()));
        save_predictions(&predictions, &predictions_path)?;
        println!(
            "Saved {} predictions of {} file to {}",
            predictions.len(),
            workbook_info.file_name,
            predictions_path.display()
        );

        let score = score_predictions(&predictions, &self.tag_map);
        if self.options.write_mismatches {
            let mismatches_path = output_dir.join(format!("mismatches_{}.json", workbook_info.stem()));
            save_mismatches(&score.mismatches, &mismatches_path)?;
        }

        Ok(FileReport {
            file_name: workbook_info.file_name.clone(),
            items: items.len(),
            predictions_path,
            score,
            stats,
        })
    }

    /// Process every workbook. A file that fails is reported and the batch
    /// continues; the batch then ends with `FilesFailed`.
    pub async fn run(&self, workbooks: &[WorkbookInfo]) -> Result<Vec<FileReport>> {
        let mut reports = Vec::new();
        let mut failed = 0;

        for workbook_info in workbooks {
            println!("Processing file: {}", workbook_info.file_name);

            match self.process_file(workbook_info).await {
                Ok(report) => {
                    println!("{}", report.score);
                    if report.stats.off_list + report.stats.failed > 0 {
                        tracing::info!(
                            "{}: {} off-list answer(s), {} failed call(s) tagged {:?}",
                            report.file_name,
                            report.stats.off_list,
                            report.stats.failed,
                            self.options.fallback_tag
                        );
                    }
                    reports.push(report);
                }
                Err(e) => {
                    eprintln!("✖ {}: {}", workbook_info.file_name, e);
                    tracing::error!("{} failed: {}", workbook_info.file_name, e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(BoqError::FilesFailed(failed));
        }
        Ok(reports)
    }
}

/// Write predictions as an indented JSON array
pub fn save_predictions(predictions: &[Prediction], path: &Path) -> Result<()> {
    write_json(predictions, path)
}

pub fn load_predictions(path: &Path) -> Result<Vec<Prediction>> {
    if !path.exists() {
        return Err(BoqError::FileNotFound(path.display().to_string()));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_mismatches(mismatches: &[Mismatch], path: &Path) -> Result<()> {
    write_json(mismatches, path)
}

/// Load the reference tag map from a CSV file
pub fn load_tag_map(path: &Path) -> Result<TagMap> {
    if !path.exists() {
        return Err(BoqError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    Ok(TagMap::from_reader(BufReader::new(file))?)
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("  {spinner} [{bar:40}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

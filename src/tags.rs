//! Reference tag-map builder
//!
//! Collects the distinct vendor tags (`TAG` column) of every workbook,
//! classifies each tag once against the default trade list, and writes the
//! `raw_tag,suggested_allowed_trade` CSV consumed by the scorer.

use crate::classifier::{classify_batch, Classifier, RetryPolicy};
use crate::error::Result;
use crate::pipeline::progress_bar;
use crate::scanner::WorkbookInfo;
use crate::workbook;
use boq_tagger_common::tag_map::{RAW_TAG_COLUMN, TRADE_COLUMN};
use boq_tagger_common::{DEFAULT_TRADES, UNMAPPED_TAG};
use std::collections::BTreeSet;
use std::path::Path;

/// Tags classified per progress line
pub const BATCH_SIZE: usize = 30;

#[derive(Debug, Clone)]
pub struct TagBuildOptions {
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub show_progress: bool,
}

/// Distinct tags across all workbooks, sorted. Unreadable workbooks are skipped.
pub fn collect_unique_tags(workbooks: &[WorkbookInfo]) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    for workbook_info in workbooks {
        match workbook::collect_tags(&workbook_info.path) {
            Ok(found) => tags.extend(found),
            Err(e) => tracing::warn!("skipping {}: {}", workbook_info.file_name, e),
        }
    }
    tags
}

/// Classify `tags` against the default trades. Failures and off-list answers become `UNMAPPED`.
pub async fn classify_tags<C: Classifier>(
    classifier: &C,
    tags: &[String],
    options: &TagBuildOptions,
) -> Vec<(String, String)> {
    let allowed: Vec<String> = DEFAULT_TRADES.iter().map(|t| t.to_string()).collect();
    let batches = tags.len().div_ceil(BATCH_SIZE);
    let mut mapping = Vec::with_capacity(tags.len());

    for (batch_idx, batch) in tags.chunks(BATCH_SIZE).enumerate() {
        println!("Classifying batch {} / {}", batch_idx + 1, batches);

        let descriptions: Vec<&str> = batch.iter().map(String::as_str).collect();
        let progress = progress_bar(descriptions.len(), options.show_progress);
        let results = classify_batch(
            classifier,
            &descriptions,
            &allowed,
            UNMAPPED_TAG,
            options.retry,
            options.concurrency,
            &progress,
        )
        .await;
        progress.finish_and_clear();

        mapping.extend(
            batch
                .iter()
                .cloned()
                .zip(results.into_iter().map(|c| c.tag)),
        );
    }

    mapping
}

/// Write the reference CSV
pub fn write_tag_map(mapping: &[(String, String)], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([RAW_TAG_COLUMN, TRADE_COLUMN])?;
    for (tag, trade) in mapping {
        writer.write_record([tag.as_str(), trade.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Collect, classify and write. Returns the number of tags written.
pub async fn build_tag_map<C: Classifier>(
    classifier: &C,
    workbooks: &[WorkbookInfo],
    output: &Path,
    options: &TagBuildOptions,
) -> Result<usize> {
    let tags: Vec<String> = collect_unique_tags(workbooks).into_iter().collect();
    println!("Extracted {} unique tags.", tags.len());

    let mapping = classify_tags(classifier, &tags, options).await;
    write_tag_map(&mapping, output)?;
    Ok(mapping.len())
}

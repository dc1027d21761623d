//! BOQ trade tagger
//!
//! Extracts work items from BOQ workbooks, classifies them into trade
//! categories through an AI CLI, and scores the predictions against a
//! reference tag map.

pub mod ai_provider;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scanner;
pub mod tags;
pub mod workbook;

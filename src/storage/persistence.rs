//! Chain document persistence
//!
//! Provides save/load for the JSON chain document. The document carries the
//! difficulty parameters so a chain can be re-validated from the file alone.

use crate::core::{format_bits, parse_bits, Block, ConfigError, DifficultyParams};
use crate::mining::MiningStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Difficulty parameters as written in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentConfig {
    /// Compact bits as 8 hex digits
    pub pow_limit_bits: String,
    pub target_spacing_seconds: i64,
    pub difficulty_adjustment_interval: u64,
}

impl DocumentConfig {
    /// Parse back into validated parameters
    pub fn to_params(&self) -> Result<DifficultyParams, ConfigError> {
        DifficultyParams::new(
            parse_bits(&self.pow_limit_bits)?,
            self.target_spacing_seconds,
            self.difficulty_adjustment_interval,
        )
    }
}

impl From<&DifficultyParams> for DocumentConfig {
    fn from(params: &DifficultyParams) -> Self {
        Self {
            pow_limit_bits: format_bits(params.pow_limit_bits),
            target_spacing_seconds: params.target_spacing_seconds,
            difficulty_adjustment_interval: params.difficulty_adjustment_interval,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::from(&DifficultyParams::default())
    }
}

/// The persisted chain document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDocument {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    #[serde(default)]
    pub config: DocumentConfig,
    #[serde(default)]
    pub stats: MiningStats,
    pub chain: Vec<Block>,
}

impl ChainDocument {
    /// Create a document stamped with the current time
    pub fn new(
        source: impl Into<String>,
        params: &DifficultyParams,
        stats: MiningStats,
        chain: Vec<Block>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.into(),
            config: DocumentConfig::from(params),
            stats,
            chain,
        }
    }

    /// Parameters the embedded chain must validate under
    pub fn params(&self) -> Result<DifficultyParams, ConfigError> {
        self.config.to_params()
    }
}

/// Sibling temp file used for atomic writes
fn temp_path(path: &Path) -> Result<PathBuf, StorageError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidData(format!("Not a file path: {:?}", path)))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

/// Save a chain document to a file path
pub fn save_to_file(document: &ChainDocument, path: &Path) -> Result<(), StorageError> {
    // Write to temporary file first
    let temp_path = temp_path(path)?;
    let file = fs::File::create(&temp_path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    // Atomic rename
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Load a chain document from a file path
pub fn load_from_file(path: &Path) -> Result<ChainDocument, StorageError> {
    if !path.exists() {
        return Err(StorageError::InvalidData(format!(
            "Chain document not found: {:?}",
            path
        )));
    }

    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::matching::SkillMatchMode;
use crate::pipeline::InvalidFilePolicy;
use crate::ranking::FusionWeights;

/// Which embedding backend `create_embedder` builds at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackendKind {
    Http,
    Onnx,
}

impl FromStr for EmbeddingBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "onnx" => Ok(Self::Onnx),
            other => Err(format!("unknown embedding backend '{other}' (expected 'http' or 'onnx')")),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_backend: EmbeddingBackendKind,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_model_dir: Option<PathBuf>,
    /// 0 disables the embedding cache.
    pub embedding_cache_size: usize,
    pub fusion_weights: FusionWeights,
    pub invalid_file_policy: InvalidFilePolicy,
    pub skill_match: SkillMatchMode,
    pub max_concurrent_documents: usize,
    pub max_upload_bytes: usize,
    /// When set, PDFs are spooled here for extraction; otherwise parsed in memory.
    pub scratch_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let embedding_backend: EmbeddingBackendKind =
            parse_or(&lookup, "EMBEDDING_BACKEND", EmbeddingBackendKind::Http)?;

        let embedding_model_dir = lookup("EMBEDDING_MODEL_DIR").map(PathBuf::from);
        if embedding_backend == EmbeddingBackendKind::Onnx && embedding_model_dir.is_none() {
            anyhow::bail!("Required environment variable 'EMBEDDING_MODEL_DIR' is not set");
        }

        let preset = match lookup("FUSION_PRESET").filter(|p| !p.trim().is_empty()) {
            Some(name) => FusionWeights::preset(&name).ok_or_else(|| {
                anyhow::anyhow!(
                    "FUSION_PRESET has an invalid value '{name}' (expected 'blended' or 'semantic_only')"
                )
            })?,
            None => FusionWeights::BLENDED,
        };
        let fusion_weights = FusionWeights::new(
            parse_or(&lookup, "SEMANTIC_WEIGHT", preset.semantic())?,
            parse_or(&lookup, "LEXICAL_WEIGHT", preset.lexical())?,
        )?;

        let max_concurrent_documents: usize = parse_or(&lookup, "MAX_CONCURRENT_DOCUMENTS", 4)?;
        if max_concurrent_documents == 0 {
            anyhow::bail!("MAX_CONCURRENT_DOCUMENTS must be at least 1");
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            embedding_backend,
            embedding_api_url: lookup("EMBEDDING_API_URL")
                .unwrap_or_else(|| "http://localhost:11434/v1/embeddings".to_string()),
            embedding_api_key: lookup("EMBEDDING_API_KEY").filter(|k| !k.is_empty()),
            embedding_model: lookup("EMBEDDING_MODEL").unwrap_or_else(|| "all-minilm".to_string()),
            embedding_model_dir,
            embedding_cache_size: parse_or(&lookup, "EMBEDDING_CACHE_SIZE", 256)?,
            fusion_weights,
            invalid_file_policy: parse_or(&lookup, "INVALID_FILE_POLICY", InvalidFilePolicy::Lenient)?,
            skill_match: parse_or(&lookup, "SKILL_MATCH", SkillMatchMode::Substring)?,
            max_concurrent_documents,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
            scratch_dir: lookup("SCRATCH_DIR")
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index file describing how an input was partitioned into chunk files.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub source: String,
    pub chunk_count: usize,
    pub max_chunk_size: usize,
    pub created_at: DateTime<Utc>,
    pub chunks: Vec<ChunkFileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFileEntry {
    /// 1-based ordinal matching the file name.
    pub index: usize,
    pub file: String,
    pub bytes: usize,
}

#[derive(Serialize)]
pub struct SplitPlan<'a> {
    pub source: &'a str,
    pub chunks: usize,
    pub chunk_size: usize,
    pub out_dir: &'a str,
    pub manifest: bool,
    pub sample: Vec<ChunkFileEntry>,
}

#[derive(Serialize)]
pub struct SplitResult {
    pub source: String,
    pub out_dir: String,
    pub chunk_size: usize,
    pub written: usize,
    pub manifest: Option<String>,
    pub chunks: Vec<ChunkFileEntry>,
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::types::{ChunkFileEntry, Manifest};

pub const MANIFEST_FILE: &str = "manifest.json";

pub fn chunk_file_name(index: usize) -> String {
    format!("chunk_{index}.txt")
}

pub fn write_chunk_files(out_dir: &Path, chunks: &[String]) -> Result<Vec<ChunkFileEntry>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;

    let mut entries = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let index = i + 1;
        let file = chunk_file_name(index);
        let path = out_dir.join(&file);
        fs::write(&path, chunk).with_context(|| format!("write {}", path.display()))?;
        entries.push(ChunkFileEntry {
            index,
            file,
            bytes: chunk.len(),
        });
    }
    Ok(entries)
}

pub fn write_manifest(out_dir: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let path = out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

mod types;
mod write;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use crate::chunker;
use crate::telemetry::{self};
use crate::telemetry::ops::split::Phase as SplitPhase;
use crate::util;

use self::types::{Manifest, SplitPlan, SplitResult};

/// docsplit split — write paragraph-bounded chunk files plus a manifest
#[derive(Args)]
pub struct SplitCmd {
    /// Input text file to split
    file: PathBuf,
    /// Maximum chunk size in bytes (soft limit; a single oversized paragraph
    /// is kept whole)
    #[arg(long, default_value_t = 8000)] chunk_size: usize,
    /// Directory for chunk files and the manifest
    #[arg(long, default_value = "chunks")] out_dir: PathBuf,
    #[arg(long, default_value_t = false)] no_manifest: bool,
    #[arg(long, default_value_t = false)] apply: bool, // default is plan-only
    #[arg(long, default_value_t = 10)] plan_limit: usize, // how many chunk files to list in plan
}

pub async fn run(args: SplitCmd) -> Result<()> {
    let log = telemetry::split();
    let _g = log.root_span_kv([
        ("file", args.file.display().to_string()),
        ("chunk_size", args.chunk_size.to_string()),
        ("out_dir", args.out_dir.display().to_string()),
        ("no_manifest", args.no_manifest.to_string()),
        ("apply", args.apply.to_string()),
    ]).entered();

    let _r = log.span(&SplitPhase::ReadInput).entered();
    let text = util::fs::read_input_text(&args.file)?;
    drop(_r);

    let _c = log.span(&SplitPhase::Chunk).entered();
    let chunks = chunker::split_text(&text, args.chunk_size)
        .context("split input into chunks")?;
    drop(_c);

    if chunks.is_empty() {
        log.info(format!("ℹ️  No content to split in {}", args.file.display()));
        return Ok(());
    }
    log.info(format!(
        "✂️  Split {} into {} chunk(s) (chunk_size={})",
        args.file.display(),
        chunks.len(),
        args.chunk_size
    ));

    if !args.apply {
        let _sp = log.span(&SplitPhase::Plan).entered();
        let sample: Vec<types::ChunkFileEntry> = chunks
            .iter()
            .enumerate()
            .take(args.plan_limit)
            .map(|(i, chunk)| types::ChunkFileEntry {
                index: i + 1,
                file: write::chunk_file_name(i + 1),
                bytes: chunk.len(),
            })
            .collect();
        log.info(format!(
            "📝 Split plan — chunks={} chunk_size={} out_dir={}",
            chunks.len(),
            args.chunk_size,
            args.out_dir.display()
        ));
        for entry in &sample {
            log.info(format!("  {} ({} bytes)", entry.file, entry.bytes));
        }
        if chunks.len() > args.plan_limit {
            log.info(format!("  ... ({} more)", chunks.len() - args.plan_limit));
        }
        log.info("   Use --apply to write the files.");
        if telemetry::config::json_mode() {
            let source = args.file.display().to_string();
            let out_dir = args.out_dir.display().to_string();
            let plan = SplitPlan {
                source: &source,
                chunks: chunks.len(),
                chunk_size: args.chunk_size,
                out_dir: &out_dir,
                manifest: !args.no_manifest,
                sample,
            };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let _w = log.span(&SplitPhase::WriteChunk).entered();
    let entries = write::write_chunk_files(&args.out_dir, &chunks)?;
    drop(_w);
    for entry in &entries {
        log.info(format!("✅ Saved chunk {}/{} to {}", entry.index, entries.len(), entry.file));
    }

    let manifest_path = if args.no_manifest {
        None
    } else {
        let _m = log.span(&SplitPhase::WriteManifest).entered();
        let manifest = Manifest {
            source: args.file.display().to_string(),
            chunk_count: entries.len(),
            max_chunk_size: args.chunk_size,
            created_at: Utc::now(),
            chunks: entries.clone(),
        };
        let path = write::write_manifest(&args.out_dir, &manifest)?;
        log.info(format!("🗂️  Manifest written to {}", path.display()));
        Some(path)
    };

    log.info(format!(
        "✅ Wrote {} chunk(s) to {}",
        entries.len(),
        args.out_dir.display()
    ));

    if telemetry::config::json_mode() {
        let result = SplitResult {
            source: args.file.display().to_string(),
            out_dir: args.out_dir.display().to_string(),
            chunk_size: args.chunk_size,
            written: entries.len(),
            manifest: manifest_path.map(|p| p.display().to_string()),
            chunks: entries,
        };
        log.result(&result)?;
    }
    Ok(())
}

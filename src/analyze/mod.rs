use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use tokio::time::sleep;

use crate::chunker;
use crate::llm::anthropic::{
    AnthropicClient, AnthropicClientConfig, AnthropicError, LlmClient, Message, MessageRequest,
    Role,
};
use crate::telemetry::{self};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::analyze::{Analyze as AnalyzeOp, Phase as AnalyzePhase};
use crate::util;

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant analyzing a portion of code or text.";

/// docsplit analyze — run each chunk of a file through the Messages API
#[derive(Args, Debug)]
pub struct AnalyzeCmd {
    /// Input text file to analyze
    file: PathBuf,
    /// Maximum chunk size in bytes (soft limit; a single oversized paragraph
    /// is kept whole)
    #[arg(long, default_value_t = 8000)]
    chunk_size: usize,
    /// Directory for per-chunk analysis files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    max_tokens: Option<u32>,
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,
    /// Pause between successive API requests
    #[arg(long, default_value_t = 3)]
    delay_secs: u64,
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Serialize)]
struct AnalyzePlan<'a> {
    source: &'a str,
    model: &'a str,
    system: &'a str,
    chunk_count: usize,
    chunk_size: usize,
    delay_secs: u64,
    outputs: Vec<String>,
}

#[derive(Serialize)]
struct AnalyzeResult<'a> {
    source: &'a str,
    model: &'a str,
    chunk_count: usize,
    ok: usize,
    failed: usize,
    outcomes: Vec<ChunkOutcome>,
}

#[derive(Serialize, Clone)]
struct ChunkOutcome {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

struct ProcessOpts {
    out_dir: PathBuf,
    model: String,
    system: String,
    max_tokens: Option<u32>,
    temperature: f32,
    delay: Duration,
}

pub async fn run(args: AnalyzeCmd) -> Result<()> {
    let log = telemetry::analyze();
    let _g = log
        .root_span_kv([
            ("file", args.file.display().to_string()),
            ("chunk_size", args.chunk_size.to_string()),
            ("out_dir", args.out_dir.display().to_string()),
            ("model", format!("{:?}", args.model)),
            ("max_tokens", format!("{:?}", args.max_tokens)),
            ("temperature", args.temperature.to_string()),
            ("delay_secs", args.delay_secs.to_string()),
            ("dry_run", args.dry_run.to_string()),
        ])
        .entered();

    let _r = log.span(&AnalyzePhase::ReadInput).entered();
    let text = util::fs::read_input_text(&args.file)?;
    drop(_r);

    let _c = log.span(&AnalyzePhase::Chunk).entered();
    let chunks = chunker::split_text(&text, args.chunk_size)
        .context("split input into chunks")?;
    drop(_c);

    if chunks.is_empty() {
        log.info(format!("ℹ️  No content to analyze in {}", args.file.display()));
        return Ok(());
    }
    log.info(format!(
        "✂️  Split {} into {} chunk(s) (chunk_size={})",
        args.file.display(),
        chunks.len(),
        args.chunk_size
    ));

    let client_cfg = AnthropicClientConfig::from_env();
    let model_name = args
        .model
        .clone()
        .unwrap_or_else(|| client_cfg.default_model.clone());
    let system_message = args
        .system
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    if args.dry_run {
        let _sp = log.span(&AnalyzePhase::Plan).entered();
        let source = args.file.display().to_string();
        let plan = AnalyzePlan {
            source: &source,
            model: &model_name,
            system: &system_message,
            chunk_count: chunks.len(),
            chunk_size: args.chunk_size,
            delay_secs: args.delay_secs,
            outputs: (1..=chunks.len()).map(analysis_file_name).collect(),
        };
        log.info("📝 Dry run — skipping API calls");
        log.plan(&plan)?;
        return Ok(());
    }

    if client_cfg.api_key.is_none() {
        log.warn("⚠️  Missing ANTHROPIC_API_KEY — set it or use --dry-run to preview the request plan.");
        bail!("ANTHROPIC_API_KEY is not set");
    }

    let client = AnthropicClient::new(client_cfg).context("init Anthropic client")?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output directory {}", args.out_dir.display()))?;

    let opts = ProcessOpts {
        out_dir: args.out_dir.clone(),
        model: model_name.clone(),
        system: system_message,
        max_tokens: args.max_tokens,
        temperature: args.temperature,
        delay: Duration::from_secs(args.delay_secs),
    };
    let outcomes = process_chunks(&client, &log, &chunks, &opts).await?;

    let ok = outcomes.iter().filter(|o| o.error.is_none()).count();
    let failed = outcomes.len() - ok;
    log.totals(ok, failed);

    if telemetry::config::json_mode() {
        let source = args.file.display().to_string();
        let result = AnalyzeResult {
            source: &source,
            model: &model_name,
            chunk_count: outcomes.len(),
            ok,
            failed,
            outcomes,
        };
        log.result(&result)?;
    }
    Ok(())
}

// A failure on one chunk must not prevent the remaining chunks from being
// attempted; every outcome is recorded either way.
async fn process_chunks(
    client: &dyn LlmClient,
    log: &LogCtx<AnalyzeOp>,
    chunks: &[String],
    opts: &ProcessOpts,
) -> Result<Vec<ChunkOutcome>> {
    let total = chunks.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, chunk) in chunks.iter().enumerate() {
        let index = i + 1;
        log.info(format!("🔎 Processing chunk {index}/{total}..."));

        let request = MessageRequest {
            model: Some(opts.model.clone()),
            system: Some(opts.system.clone()),
            messages: vec![Message::new(Role::User, build_prompt(chunk))],
            max_tokens: opts.max_tokens,
            temperature: Some(opts.temperature),
        };

        let _call = log
            .span_kv(&AnalyzePhase::CallLlm, [("chunk", index.to_string())])
            .entered();
        let outcome = match client.create_message(request).await {
            Ok(response) => {
                drop(_call);
                let _w = log.span(&AnalyzePhase::WriteOutput).entered();
                let file = analysis_file_name(index);
                let path = opts.out_dir.join(&file);
                fs::write(
                    &path,
                    format!("CHUNK {index} ANALYSIS:\n\n{}", response.content),
                )
                .with_context(|| format!("write {}", path.display()))?;
                log.info(format!("✅ Saved analysis to {}", path.display()));
                ChunkOutcome { index, file: Some(file), error: None }
            }
            Err(err) => {
                drop(_call);
                match &err {
                    AnthropicError::Api { status, error } => {
                        log.warn(format!(
                            "⚠️  API error on chunk {index} ({status}) — {}",
                            error.message
                        ));
                    }
                    AnthropicError::Timeout => {
                        log.warn(format!(
                            "⚠️  Chunk {index} timed out — consider increasing ANTHROPIC_TIMEOUT_SECS."
                        ));
                    }
                    _ => {
                        log.warn(format!("⚠️  Error processing chunk {index}: {err}"));
                    }
                }
                ChunkOutcome { index, file: None, error: Some(err.to_string()) }
            }
        };
        outcomes.push(outcome);

        if index < total && !opts.delay.is_zero() {
            log.info(format!(
                "⏳ Waiting {}s before next request...",
                opts.delay.as_secs()
            ));
            sleep(opts.delay).await;
        }
    }

    Ok(outcomes)
}

fn analysis_file_name(index: usize) -> String {
    format!("chunk_analysis_{index}.txt")
}

fn build_prompt(chunk: &str) -> String {
    format!(
        "Please analyze this text content and provide insights:\n\n{chunk}\n\nWhat are the key points or issues in this section?"
    )
}

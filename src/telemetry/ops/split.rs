use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Split;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, ReadInput, Chunk, WriteChunk, WriteManifest }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::ReadInput => "read_input",
        Phase::Chunk => "chunk",
        Phase::WriteChunk => "write_chunk",
        Phase::WriteManifest => "write_manifest",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::ReadInput => info_span!("read_input"),
        Phase::Chunk => info_span!("chunk"),
        Phase::WriteChunk => info_span!("write_chunk"),
        Phase::WriteManifest => info_span!("write_manifest"),
    }}
}

impl OpMarker for Split {
    const NAME: &'static str = "split";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("split") }
}

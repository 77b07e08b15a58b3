use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Analyze;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, ReadInput, Chunk, CallLlm, WriteOutput }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::ReadInput => "read_input",
        Phase::Chunk => "chunk",
        Phase::CallLlm => "call_llm",
        Phase::WriteOutput => "write_output",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::ReadInput => info_span!("read_input"),
        Phase::Chunk => info_span!("chunk"),
        Phase::CallLlm => info_span!("call_llm"),
        Phase::WriteOutput => info_span!("write_output"),
    }}
}

impl OpMarker for Analyze {
    const NAME: &'static str = "analyze";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("analyze") }
}

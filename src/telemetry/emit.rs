use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};
use std::io::{self, Write};

#[derive(Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

// Write to stdout as a single line
fn print_envelope(op: &str, apply: bool, key: &str, payload: Value, meta: Option<Meta>) -> Result<()> {
    let mut env = json!({ "op": op, "apply": apply, "meta": meta });
    env[key] = payload;
    let mut out = io::stdout();
    serde_json::to_writer(&mut out, &env)?;
    writeln!(&mut out)?;
    Ok(())
}

pub fn print_plan<T: Serialize>(op: &str, plan: &T, meta: Option<Meta>) -> Result<()> {
    print_envelope(op, false, "plan", serde_json::to_value(plan)?, meta)
}

pub fn print_result<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<()> {
    print_envelope(op, true, "result", serde_json::to_value(result)?, meta)
}

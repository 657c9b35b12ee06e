//! Demo/debugging CLI (SPEC_FULL.md §10.6): loads a JSON-encoded record
//! plus an operation name and argument list, runs it through
//! `apply_record` against the in-memory mock host, and prints the
//! resulting response map as JSON.
//!
//! Not part of the engine's contract; the real host is external.

use clap::Parser;
use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use utxo_engine::testutil::MockHost;
use utxo_engine::value::{MapKey, Value};
use utxo_engine::{apply_record, Record};

#[derive(Parser, Debug)]
#[command(name = "utxo-engine-cli", about = "Run a single engine operation against a JSON-encoded record")]
struct Args {
    /// Path to a JSON file with `record`, `function`, and `args` fields.
    input: PathBuf,

    /// Default delete-at-height retention spliced into `args` when the
    /// operation takes a `block_height_retention` parameter and the input
    /// file's `args` array stops short of it. Falls back to config.toml /
    /// built-in default.
    #[arg(long)]
    default_retention: Option<i64>,
}

/// Position of `block_height_retention` in each operation's positional
/// argument list, for operations that take one (§4.4-§4.11). `None` for
/// operations with no such parameter.
fn retention_arg_index(function: Option<&str>) -> Option<usize> {
    match function {
        Some("spend") => Some(6),
        Some("spendMulti") => Some(4),
        Some("unspend") => Some(3),
        Some("setMined") => Some(4),
        Some("setConflicting") => Some(2),
        Some("incrementSpentExtraRecs") => Some(2),
        Some("setDeleteAtHeight") => Some(1),
        _ => None,
    }
}

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Int(n.as_i64().unwrap_or_default()),
        Json::String(s) => match s.strip_prefix("0x") {
            Some(hex_str) => Value::Bytes(hex::decode(hex_str).unwrap_or_default()),
            None => Value::Str(s.clone()),
        },
        Json::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        Json::Object(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                let key = k.parse::<i64>().map(MapKey::Int).unwrap_or_else(|_| MapKey::Str(k.clone()));
                out.insert(key, json_to_value(v));
            }
            Value::Map(out)
        }
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Nil => Json::Null,
        Value::Int(i) => Json::Number(Number::from(*i)),
        Value::Bool(b) => Json::Bool(*b),
        Value::Str(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(format!("0x{}", hex::encode(b))),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                let key = match k {
                    MapKey::Int(i) => i.to_string(),
                    MapKey::Str(s) => s.clone(),
                };
                out.insert(key, value_to_json(v));
            }
            Json::Object(out)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = utxo_engine::config::load_config().unwrap_or_default();
    let retention = args.default_retention.unwrap_or(config.default_block_height_retention);

    let raw = std::fs::read_to_string(&args.input)?;
    let input: Json = serde_json::from_str(&raw)?;

    let record_json = input.get("record").and_then(Json::as_object).ok_or("missing \"record\" object")?;
    let mut record = utxo_engine::testutil::MockRecord::new();
    for (bin, value) in record_json {
        record.set(bin, json_to_value(value));
    }

    let function = input.get("function").and_then(Json::as_str);
    let mut call_args: Vec<Value> = input
        .get("args")
        .and_then(Json::as_array)
        .map(|a| a.iter().map(json_to_value).collect())
        .unwrap_or_default();

    if let Some(idx) = retention_arg_index(function) {
        if call_args.len() == idx {
            call_args.push(Value::Int(retention));
            eprintln!("spliced default block_height_retention={retention} into args[{idx}]");
        }
    }

    let mut host = MockHost::new();
    let response = apply_record(&mut record, function, &call_args, Some(&mut host))
        .map_err(|e| format!("dispatch error: {}", e))?;

    println!("{}", serde_json::to_string_pretty(&value_to_json(&response))?);
    Ok(())
}

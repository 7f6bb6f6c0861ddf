use serde_json::Value;
use std::io;
use tabled::{builder::Builder, Table};

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => print_table(value),
        OutputFormat::Csv => print_csv(value),
        OutputFormat::Minimal => print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Scalar fields as a Field/Value table. Series fields are summarised by
/// length; `--output csv` dumps them in full.
fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in map {
                builder.push_record([key.as_str(), &format_table_value(val)]);
            }
            println!("{}", Table::from(builder));
        }
        Value::Array(arr) => {
            for item in arr {
                println!("{}", format_scalar(item));
            }
        }
        _ => println!("{}", value),
    }
}

fn format_table_value(value: &Value) -> String {
    match value {
        Value::Array(arr) => format!("[{} values]", arr.len()),
        other => format_scalar(other),
    }
}

/// Aligned series columns when the output carries a date index, otherwise
/// field,value rows.
fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(dates)) = map.get("dates") {
                write_series_csv(&mut wtr, map, dates.len());
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr {
                let _ = wtr.write_record([&format_scalar(item)]);
            }
        }
        _ => {
            let _ = wtr.write_record([&format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

/// The time-indexed columns an analysis output carries.
const SERIES_COLUMNS: [&str; 4] = ["dates", "spread", "zscore", "positions"];

fn write_series_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &serde_json::Map<String, Value>, rows: usize) {
    let columns: Vec<&str> = SERIES_COLUMNS
        .iter()
        .copied()
        .filter(|c| matches!(map.get(*c), Some(Value::Array(_))))
        .collect();

    let _ = wtr.write_record(&columns);
    for i in 0..rows {
        let row: Vec<String> = columns
            .iter()
            .map(|c| {
                map.get(*c)
                    .and_then(|v| v.as_array())
                    .and_then(|a| a.get(i))
                    .map(format_scalar)
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&row);
    }
}

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the object.
fn print_minimal(value: &Value) {
    let priority_keys = ["p_value", "hedge_ratio", "current_state", "positions"];

    if let Value::Object(map) = value {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(value));
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

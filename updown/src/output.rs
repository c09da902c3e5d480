//! Output formatting: plain text for terminals and pretty JSON for scripts.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt::Write;
use updown_lib::format_timestamp_display;

/// Widest a table cell may get before it is truncated.
const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Tables for lists, key-value pairs for single records
    #[default]
    Plain,
    /// JSON (pretty-printed)
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" | "p" => Ok(OutputFormat::Plain),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

/// Render `value` as plain text. Timestamps are shown in UTC when `use_utc`
/// is set and in the local timezone otherwise.
pub fn format_plain(value: &Value, use_utc: bool) -> String {
    let mut out = String::new();
    Plain { use_utc }.write(value, &mut out, 0);
    out
}

/// Render `value` as pretty JSON. Timestamps stay in RFC 3339 UTC.
pub fn format_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

struct Plain {
    use_utc: bool,
}

impl Plain {
    fn write(&self, v: &Value, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match v {
            Value::Array(arr) if arr.is_empty() => {
                let _ = writeln!(out, "{}<empty>", pad);
            }
            Value::Array(arr) => {
                if arr.iter().all(Value::is_object) && self.write_table(arr, out, &pad) {
                    return;
                }
                for (i, item) in arr.iter().enumerate() {
                    if item.is_object() || item.is_array() {
                        let _ = writeln!(out, "{}[{}]", pad, i + 1);
                        self.write(item, out, indent + 1);
                    } else {
                        let _ = writeln!(out, "{}{}", pad, self.scalar(item));
                    }
                }
            }
            Value::Object(map) if map.is_empty() => {
                let _ = writeln!(out, "{}<none>", pad);
            }
            Value::Object(map) => {
                for (k, val) in map {
                    if val.is_object() || val.is_array() {
                        let _ = writeln!(out, "{}{}:", pad, k);
                        self.write(val, out, indent + 1);
                    } else {
                        let _ = writeln!(out, "{}{}: {}", pad, k, self.scalar(val));
                    }
                }
            }
            scalar => {
                let _ = writeln!(out, "{}{}", pad, self.scalar(scalar));
            }
        }
    }

    /// Table of the scalar columns shared by the first row. Returns false when
    /// there is nothing tabular to show.
    fn write_table(&self, rows: &[Value], out: &mut String, pad: &str) -> bool {
        let columns: Vec<&String> = match rows.first().and_then(Value::as_object) {
            Some(first) => first
                .iter()
                .filter(|(_, v)| !v.is_object() && !v.is_array())
                .map(|(k, _)| k)
                .collect(),
            None => return false,
        };
        if columns.is_empty() {
            return false;
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|k| {
                        let cell = row
                            .get(k.as_str())
                            .map(|v| self.scalar(v))
                            .unwrap_or_else(|| "-".to_string());
                        truncate(&cell, MAX_CELL_WIDTH)
                    })
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, k)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(k.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header = join_row(columns.iter().map(|k| k.as_str()), &widths);
        let _ = writeln!(out, "{}{}", pad, header);
        let _ = writeln!(out, "{}{}", pad, "-".repeat(header.chars().count()));
        for row in &cells {
            let _ = writeln!(out, "{}{}", pad, join_row(row.iter().map(String::as_str), &widths));
        }
        true
    }

    fn scalar(&self, v: &Value) -> String {
        match v {
            Value::Null => "-".to_string(),
            Value::String(s) => match parse_timestamp(s) {
                Some(dt) => format_timestamp_display(&dt, self.use_utc),
                None => s.clone(),
            },
            Value::Bool(true) => "yes".to_string(),
            Value::Bool(false) => "no".to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

/// Full RFC 3339 timestamps only, so plain words and dates stay untouched.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.len() < 20 || !s.contains('T') {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn join_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max {
        s
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

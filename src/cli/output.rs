//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde_json::Value;

use crate::api::records;
use crate::cli::OutputFormat;
use crate::session::SessionState;

const MAX_TABLE_COLUMNS: usize = 6;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Format a session state as a colored string
pub fn format_state(state: &SessionState) -> String {
    match state {
        SessionState::Authenticated { .. } => state.name().green().to_string(),
        SessionState::Unauthenticated => state.name().red().to_string(),
        SessionState::AccessOnly { .. } | SessionState::RefreshOnly { .. } => {
            state.name().yellow().to_string()
        }
    }
}

/// Render a scalar JSON value for a table cell
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(_) => "{…}".to_string(),
    }
}

/// Column headers for a set of rows: `id` first, then the first row's keys
pub fn table_columns(rows: &[&Value]) -> Vec<String> {
    let mut columns = Vec::new();
    let Some(first) = rows.first().and_then(|r| r.as_object()) else {
        return columns;
    };

    if first.contains_key("id") {
        columns.push("id".to_string());
    }
    for key in first.keys() {
        if columns.len() >= MAX_TABLE_COLUMNS {
            break;
        }
        if key != "id" {
            columns.push(key.clone());
        }
    }
    columns
}

/// Print the rows of a list response as a table
pub fn print_records_table(value: &Value) {
    let rows = records(value);
    if rows.is_empty() {
        info("No records found");
        return;
    }

    let columns = table_columns(&rows);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );

    for row in &rows {
        table.add_row(
            columns
                .iter()
                .map(|c| Cell::new(cell_text(row.get(c).unwrap_or(&Value::Null))))
                .collect::<Vec<_>>(),
        );
    }

    println!("{table}");
}

/// Print a JSON value in the requested format
pub fn print_value(value: &Value, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if value.is_array() || !records(value).is_empty() {
                print_records_table(value);
            } else {
                print_record_detail(value);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value)?);
        }
    }
    Ok(())
}

/// Print one record as aligned key/value lines
pub fn print_record_detail(value: &Value) {
    match value.as_object() {
        Some(fields) => {
            for (key, field) in fields {
                println!("  {} {}", format!("{}:", key).bold(), cell_text(field));
            }
        }
        None => println!("{}", cell_text(value)),
    }
}

/// Print the stored session
pub fn print_session(state: &SessionState, role: Option<&str>, updated: Option<String>) {
    println!("{}", "Session".bold().underline());
    println!();
    println!("  {} {}", "State:".bold(), format_state(state));
    println!("  {} {}", "Role:".bold(), role.unwrap_or("-"));
    if let Some(updated) = updated {
        println!("  {} {}", "Updated:".bold(), updated);
    }
}

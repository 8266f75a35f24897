//! Output formatting: JSON or table.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use openmotics_api::Payload;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a list in the chosen format. Tables go through `to_row`; JSON
/// serializes the records themselves.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
    })
}

/// Render the reply of an action. Text replies are printed as they came.
pub fn render_payload(format: &OutputFormat, payload: &Payload) -> Result<String, CliError> {
    Ok(match (payload, format) {
        (Payload::Json(value), OutputFormat::JsonCompact) => serde_json::to_string(value)?,
        (Payload::Json(value), _) => serde_json::to_string_pretty(value)?,
        (Payload::Text(text), _) => text.clone(),
    })
}

pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

//! Rendering of API responses for the terminal

use crate::cli::OutputMode;
use pingen_core::Envelope;
use serde_json::Value;

/// Which plain-text layout a response uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Organisations,
    Letters,
    Letter,
    /// Result of `letters create` / `letters send`
    LetterSummary,
}

pub fn json(value: &Value) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render(mode: OutputMode, view: View, body: &Value) -> anyhow::Result<String> {
    match mode {
        OutputMode::Json => json(body),
        OutputMode::Plain => plain(view, body),
    }
}

const ID: &[&str] = &["id"];
const NAME: &[&str] = &["attributes", "name"];
const STATUS: &[&str] = &["attributes", "status"];
const FILE_NAME: &[&str] = &["attributes", "file_original_name"];

fn row(item: &Value, columns: &[&[&str]]) -> String {
    columns
        .iter()
        .map(|path| item.at(path).text())
        .collect::<Vec<_>>()
        .join("\t")
}

fn plain(view: View, body: &Value) -> anyhow::Result<String> {
    let rows = match view {
        View::Organisations => body
            .data_items()
            .iter()
            .map(|item| row(item, &[ID, NAME, STATUS]))
            .collect::<Vec<_>>(),
        View::Letters => body
            .data_items()
            .iter()
            .map(|item| row(item, &[ID, STATUS, FILE_NAME]))
            .collect(),
        View::Letter => {
            let data = body.data();
            vec![
                data.at(ID).text(),
                format!("status: {}", data.at(STATUS).text()),
                format!("file: {}", data.at(FILE_NAME).text()),
            ]
        }
        View::LetterSummary => {
            let data = body.data();
            if !data.is_object() {
                return json(body);
            }
            vec![row(data, &[ID, STATUS, FILE_NAME])]
        }
    };
    Ok(rows.join("\n"))
}

/// Print to stdout, skipping empty output
pub fn emit(text: &str) {
    if !text.is_empty() {
        println!("{}", text);
    }
}

use std::path::{Path, PathBuf};

use csv::QuoteStyle;

use crate::{error::Result, types::VideoRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Txt,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
            OutputFormat::Csv => "csv",
        }
    }
}

pub const CSV_HEADER: [&str; 3] = ["Filename", "Description", "Tags"];

/// Append the format's extension when `path` has none.
pub fn output_path_for(path: &Path, format: OutputFormat) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(format.extension())
    }
}

pub fn render(records: &[VideoRecord], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => format_json(records)?,
        OutputFormat::Txt => format_text(records),
        OutputFormat::Csv => format_csv(records)?,
    })
}

pub fn format_json(records: &[VideoRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Render tags as `[a, b, c]`.
pub fn format_tag_list(tags: &[String]) -> String {
    format!("[{}]", tags.join(", "))
}

fn error_description(error: &str) -> String {
    format!("ERROR: {error}")
}

pub fn format_text(records: &[VideoRecord]) -> String {
    let mut output = String::new();
    for record in records {
        output.push_str(&format!("File: {}\n", record.filename));
        match &record.error {
            Some(error) => {
                output.push_str(&format!("Description: {}\n", error_description(error)));
            }
            None => output.push_str(&format!("Description: {}\n", record.description)),
        }
        output.push_str(&format!("Tags: {}\n", format_tag_list(&record.tags)));
        output.push_str(&"-".repeat(80));
        output.push('\n');
    }
    output
}

/// Every field is quoted, so the tag list always reads as one bracketed value.
pub fn format_csv(records: &[VideoRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        match &record.error {
            Some(error) => writer.write_record([
                record.filename.as_str(),
                error_description(error).as_str(),
                "",
            ])?,
            None => writer.write_record([
                record.filename.as_str(),
                record.description.as_str(),
                format_tag_list(&record.tags).as_str(),
            ])?,
        }
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

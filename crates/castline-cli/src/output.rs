//! Output formatting for CLI

use castline_core::{Severity, StatusRecord};
use chrono::Local;
use console::Style;
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Serialize `data` as one line of JSON
pub fn json_line<T: Serialize>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string())
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Error => Style::new().red(),
        Severity::Success => Style::new().green(),
        Severity::Info => Style::new().dim(),
    }
}

/// Render a status record for the terminal
pub fn format_record(record: &StatusRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json_line(record),
        OutputFormat::Text => {
            let style = severity_style(record.report.severity);
            format!(
                "{} {} {}",
                Style::new().dim().apply_to(record.timestamp.with_timezone(&Local).format("%H:%M:%S%.3f")),
                style.clone().bold().apply_to(format!("{:>7}", record.report.severity)),
                style.apply_to(&record.report.message),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Text);
    }

    #[test]
    fn test_json_line_is_single_line() {
        let line = json_line(&serde_json::json!({"a": [1, 2], "b": "c"}));
        assert!(!line.contains('\n'));
    }
}

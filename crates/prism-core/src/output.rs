//! Report output as JSON or JSON Lines.
//!
//! A single response is written as one JSON document. Several responses are
//! written as a JSON array, or one document per line in JSONL mode.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::Response;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document (array for several responses)
    Json,
    /// One JSON document per line
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Serializes [`Response`]s and keeps count of failures.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    written: usize,
    failures: usize,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects JSON; JSONL is always one line per response.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            written: 0,
            failures: 0,
        }
    }

    pub fn write<T: Serialize>(&mut self, response: &Response<T>) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, response).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, response).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.count(response);
        Ok(())
    }

    /// Write several responses: a JSON array, or one line each.
    pub fn write_all<T: Serialize>(&mut self, responses: &[Response<T>]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, responses)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, responses).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                responses.iter().for_each(|r| self.count(r));
            }
            OutputFormat::JsonLines => {
                for response in responses {
                    self.write(response)?;
                }
            }
        }
        Ok(())
    }

    fn count<T>(&mut self, response: &Response<T>) {
        self.written += 1;
        if !response.is_success() {
            self.failures += 1;
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Number of written responses that were errors.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn responses() -> Vec<Response<Value>> {
        vec![
            Response::Success(json!({"success": "ok", "output_key": "batch_a.png"})),
            Response::Failure {
                error: "Missing request parameters: operations".into(),
            },
        ]
    }

    #[test]
    fn test_write_single_json() {
        let mut buffer = Vec::new();
        let mut writer = ReportWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write(&responses()[0]).unwrap();
        assert_eq!(writer.failures(), 0);

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "{\"output_key\":\"batch_a.png\",\"success\":\"ok\"}\n");
    }

    #[test]
    fn test_write_all_jsonl() {
        let mut buffer = Vec::new();
        let mut writer = ReportWriter::new(&mut buffer, OutputFormat::JsonLines, true);
        writer.write_all(&responses()).unwrap();
        assert_eq!((writer.written(), writer.failures()), (2, 1));

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"error\""));
    }

    #[test]
    fn test_write_all_json_array() {
        let mut buffer = Vec::new();
        let mut writer = ReportWriter::new(&mut buffer, OutputFormat::Json, true);
        writer.write_all(&responses()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("ndjson"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }
}

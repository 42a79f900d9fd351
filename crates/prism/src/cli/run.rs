//! The `prism run` command: execute pipeline requests from JSON files.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, ValueEnum};
use prism_core::{Config, OutputFormat as CoreOutputFormat, PipelineResponse, Prism, ReportWriter, Response};
use serde_json::Value;
use tokio::sync::Semaphore;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Request files, each holding one request object or an array of them
    #[arg(required = true)]
    pub requests: Vec<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to the `[output]` config section)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of pipeline runs executed concurrently
    #[arg(short, long, default_value = "4")]
    pub parallel: usize,

    /// Root directory of the object store (overrides `[store] root`)
    #[arg(long)]
    pub store_root: Option<PathBuf>,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document, an array when there are several reports
    #[default]
    Json,
    /// One report per line
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Execute the run command.
pub async fn execute(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    if let Some(root) = &args.store_root {
        config.store.root = root.clone();
    }
    let format = args
        .format
        .map(CoreOutputFormat::from)
        .or_else(|| CoreOutputFormat::parse(&config.output.format))
        .unwrap_or(CoreOutputFormat::Json);
    let pretty = config.output.pretty;

    let requests = load_requests(&args.requests);
    tracing::info!(
        "Running {} request(s) against store {}",
        requests.len(),
        config.store_root().display()
    );

    let prism = Prism::with_local_store(config);
    let responses = run_all(&prism, requests, args.parallel.max(1)).await;

    let failures = match &args.output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            let failures = write_reports(file, format, pretty, &responses)?;
            tracing::info!("Wrote {} report(s) to {}", responses.len(), path.display());
            failures
        }
        None => write_reports(io::stdout().lock(), format, pretty, &responses)?,
    };

    if failures > 0 {
        anyhow::bail!("{} of {} request(s) failed", failures, responses.len());
    }
    Ok(())
}

/// A request as read from disk, or the reason it could not be read.
type LoadedRequest = Result<Value, String>;

/// Read every request file. Unreadable files become error responses later so
/// the remaining requests still run.
fn load_requests(paths: &[PathBuf]) -> Vec<LoadedRequest> {
    let mut requests = Vec::new();
    for path in paths {
        match read_request_file(path) {
            Ok(Value::Array(items)) => requests.extend(items.into_iter().map(Ok)),
            Ok(value) => requests.push(Ok(value)),
            Err(e) => {
                tracing::error!("Failed: {:?} - {}", path, e);
                requests.push(Err(e));
            }
        }
    }
    requests
}

fn read_request_file(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read request file {}: {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Invalid JSON in request file {}: {}", path.display(), e))
}

/// Run requests on the blocking pool, at most `parallel` at a time.
///
/// Responses come back in request order.
async fn run_all(prism: &Prism, requests: Vec<LoadedRequest>, parallel: usize) -> Vec<PipelineResponse> {
    let semaphore = Arc::new(Semaphore::new(parallel));
    let mut handles = Vec::with_capacity(requests.len());

    for request in requests {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!("Run semaphore closed: {e}");
                break;
            }
        };
        let prism = prism.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let response = match request {
                Ok(value) => prism.handle(&value),
                Err(error) => Response::Failure { error },
            };
            drop(permit);
            response
        }));
    }

    let mut responses = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(response) => responses.push(response),
            Err(e) => {
                tracing::error!("Pipeline task panicked: {e}");
                responses.push(Response::Failure {
                    error: format!("Pipeline task failed: {e}"),
                });
            }
        }
    }
    responses
}

/// Write the reports and return how many were errors.
fn write_reports<W: Write>(
    writer: W,
    format: CoreOutputFormat,
    pretty: bool,
    responses: &[PipelineResponse],
) -> io::Result<usize> {
    let mut writer = ReportWriter::new(writer, format, pretty);
    match responses {
        [single] => writer.write(single)?,
        many => writer.write_all(many)?,
    }
    writer.flush()?;
    Ok(writer.failures())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{codec, EncodingFormat, MemoryObjectStore};
    use serde_json::json;

    fn prism_with_source() -> (Arc<MemoryObjectStore>, Prism) {
        let store = Arc::new(MemoryObjectStore::new());
        let bytes = codec::encode(&image::DynamicImage::new_rgb8(8, 4), EncodingFormat::Png, None)
            .unwrap();
        store.insert("photos", "cat.png", bytes);
        let prism = Prism::new(Config::default(), store.clone());
        (store, prism)
    }

    #[test]
    fn test_load_requests_expands_arrays_and_keeps_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let single = dir.path().join("single.json");
        let many = dir.path().join("many.json");
        let broken = dir.path().join("broken.json");
        std::fs::write(&single, r#"{"bucket_id": "a"}"#).unwrap();
        std::fs::write(&many, r#"[{"bucket_id": "b"}, {"bucket_id": "c"}]"#).unwrap();
        std::fs::write(&broken, "{not json").unwrap();

        let requests = load_requests(&[single, many, broken, dir.path().join("missing.json")]);
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[2].as_ref().unwrap()["bucket_id"], "c");
        assert!(requests[3].as_ref().unwrap_err().contains("Invalid JSON"));
        assert!(requests[4].as_ref().unwrap_err().contains("Could not read"));
    }

    #[tokio::test]
    async fn test_run_all_keeps_request_order() {
        let (store, prism) = prism_with_source();
        let requests = vec![
            Ok(json!({"bucket_id": "photos", "object_id": "cat.png", "operations": [["details", {}]]})),
            Err("Could not read request file x.json".to_string()),
            Ok(json!({"bucket_id": "photos"})),
            Ok(json!({"bucket_id": "photos", "object_id": "cat.png", "operations": []})),
        ];

        let responses = run_all(&prism, requests, 2).await;
        let ok: Vec<bool> = responses.iter().map(|r| r.is_success()).collect();
        assert_eq!(ok, vec![true, false, false, true]);
        assert_eq!(store.put_count(), 2);
    }

    #[test]
    fn test_write_reports_counts_failures() {
        let responses = vec![
            Response::Failure {
                error: "Missing request parameters: operations".to_string(),
            },
            Response::Failure {
                error: "Missing request parameters: object_id".to_string(),
            },
        ];
        let mut buffer = Vec::new();
        let failures =
            write_reports(&mut buffer, CoreOutputFormat::JsonLines, false, &responses).unwrap();
        assert_eq!(failures, 2);
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 2);
    }
}

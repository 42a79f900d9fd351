//! The `prism op` command: invoke one operation directly.

use std::path::PathBuf;

use clap::Args;
use prism_core::{ArgMap, ArgValue, Config, Prism, Response, StandaloneReport, StandaloneRequest};

/// Arguments for the `op` command.
#[derive(Args, Debug)]
pub struct OpArgs {
    /// Operation name (see `prism operations`)
    pub operation: String,

    /// Bucket holding the source image
    #[arg(short, long)]
    pub bucket: String,

    /// Key of the source image
    #[arg(short, long)]
    pub key: String,

    /// Operation argument as name=value (repeatable)
    #[arg(short, long = "arg", value_name = "NAME=VALUE", value_parser = parse_arg)]
    pub args: Vec<(String, ArgValue)>,

    /// Include a retrieval reference for the written image
    #[arg(long)]
    pub download: bool,

    /// Root directory of the object store (overrides `[store] root`)
    #[arg(long)]
    pub store_root: Option<PathBuf>,
}

impl OpArgs {
    fn to_request(&self) -> StandaloneRequest {
        let mut args = ArgMap::new();
        for (name, value) in &self.args {
            args.insert(name.clone(), value.clone());
        }
        StandaloneRequest::new(&self.operation, &self.bucket, &self.key)
            .with_args(args)
            .with_download(self.download)
    }
}

/// Parse `name=value`; the value is typed the way a JSON request would be.
fn parse_arg(raw: &str) -> Result<(String, ArgValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing argument name in '{raw}'"));
    }
    Ok((name.to_string(), ArgValue::parse_cli(value)))
}

/// Execute the op command.
pub async fn execute(mut config: Config, args: OpArgs) -> anyhow::Result<()> {
    if let Some(root) = &args.store_root {
        config.store.root = root.clone();
    }
    let pretty = config.output.pretty;
    let prism = Prism::with_local_store(config);
    let request = args.to_request();

    let response: Response<StandaloneReport> =
        tokio::task::spawn_blocking(move || prism.run_operation(&request).into()).await?;

    let output = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");

    if let Response::Failure { error } = &response {
        anyhow::bail!("{} failed: {}", args.operation, error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg() {
        let (name, value) = parse_arg("rotation_angle=90").unwrap();
        assert_eq!(name, "rotation_angle");
        assert_eq!(value.as_int(), Some(90));

        let (_, value) = parse_arg("target_format=png").unwrap();
        assert_eq!(value.as_text(), Some("png"));

        assert!(parse_arg("rotation_angle").is_err());
        assert!(parse_arg("=90").is_err());
    }

    #[test]
    fn test_to_request() {
        let args = OpArgs {
            operation: "resize".to_string(),
            bucket: "photos".to_string(),
            key: "cat.png".to_string(),
            args: vec![
                parse_arg("target_width=10").unwrap(),
                parse_arg("target_height=20").unwrap(),
            ],
            download: true,
            store_root: None,
        };
        let request = args.to_request();
        assert_eq!(request.operation, "resize");
        assert!(request.get_download);
        assert_eq!(
            request.args,
            ArgMap::new().with("target_width", 10).with("target_height", 20)
        );
    }
}

use std::path::PathBuf;

use anyhow::Context;
use linkward::{CheckConfig, LinkStream};
use linkward_fetch::ReqwestClient;
use tracing::info;

use crate::links::read_links;

#[derive(Clone, Debug, clap::Args)]
pub struct CheckArg {
    /// Link list: one URI per line, followed by the files it occurs in
    pub links: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides `retry_attempts` of the configuration
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Overrides `overall_timeout_ms` of the configuration
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Overrides `concurrency` of the configuration
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl CheckArg {
    /// The configuration file with command line overrides applied.
    pub fn config(&self) -> anyhow::Result<CheckConfig> {
        let mut config = match &self.config {
            Some(path) => CheckConfig::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => CheckConfig::default(),
        };
        if let Some(retry_attempts) = self.retry_attempts {
            config.retry_attempts = retry_attempts;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.overall_timeout_ms = timeout_ms;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        Ok(config)
    }

    /// Validates the links and prints what is broken. Returns whether every
    /// link is valid.
    pub async fn run(self) -> anyhow::Result<bool> {
        let config = self.config()?;
        let links = read_links(&self.links)?;
        info!("Checking {} links from {}", links.len(), self.links.display());

        let stream = config
            .apply(LinkStream::new(links))
            .context("Invalid configuration")?;
        let client = ReqwestClient::new().context("Failed to create HTTP client")?;
        let errors = stream.validate(client).await?;

        if errors.is_empty() {
            info!("All links are valid");
            return Ok(true);
        }
        println!("{} broken links:{}", errors.len(), errors.report());
        Ok(false)
    }
}

// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use human_repr::HumanCount as _;
use tokio::task::JoinSet;
use tracing::error;

use crate::cli_shared::cli::Config;
use crate::packer::PackerRegistry;
use crate::request::{PackedResponse, RequestProcessor};
use crate::storage::Loader;
use crate::utils::io::write_file;

#[derive(Debug, clap::Args)]
pub struct RequestCommand {
    /// JSON request payload files
    #[arg(required = true)]
    payloads: Vec<PathBuf>,
    /// Directory receiving one packed container per payload
    #[arg(short, long)]
    output_dir: PathBuf,
}

impl RequestCommand {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        let Config {
            storage,
            packer,
            requests,
        } = config;
        let processor = Arc::new(RequestProcessor::new(
            Loader::from_config(&storage),
            PackerRegistry::new(packer),
            &requests,
        ));

        let mut tasks = JoinSet::new();
        for payload_path in self.payloads {
            let processor = processor.clone();
            let output_dir = self.output_dir.clone();
            tasks.spawn(async move {
                let result = process_file(processor, &payload_path, &output_dir).await;
                (payload_path, result)
            });
        }

        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            let (payload_path, result) = joined?;
            match result {
                Ok((output, response)) => println!(
                    "{} -> {} ({} files, {})",
                    payload_path.display(),
                    output.display(),
                    response.file_count,
                    response.body.len().human_count_bytes()
                ),
                Err(e) => {
                    error!("{}: {e:#}", payload_path.display());
                    failed += 1;
                }
            }
        }
        anyhow::ensure!(failed == 0, "{failed} request(s) failed");
        Ok(())
    }
}

/// Output file of a payload: the payload's file stem with the extension of
/// the packed method.
fn output_path(output_dir: &Path, payload_path: &Path, response: &PackedResponse) -> PathBuf {
    let stem = payload_path
        .file_stem()
        .map(|it| it.to_string_lossy().into_owned())
        .unwrap_or_else(|| "request".into());
    output_dir.join(format!("{stem}.{}", response.method.file_extension()))
}

async fn process_file(
    processor: Arc<RequestProcessor>,
    payload_path: &Path,
    output_dir: &Path,
) -> anyhow::Result<(PathBuf, PackedResponse)> {
    let payload = tokio::fs::read(payload_path)
        .await
        .with_context(|| format!("failed to read {}", payload_path.display()))?;
    let response = processor.handle(payload).await?;

    let output = output_path(output_dir, payload_path, &response);
    let (output, response) = tokio::task::spawn_blocking(move || {
        write_file(&output, &response.body)
            .with_context(|| format!("failed to write {}", output.display()))?;
        anyhow::Ok((output, response))
    })
    .await??;
    Ok((output, response))
}

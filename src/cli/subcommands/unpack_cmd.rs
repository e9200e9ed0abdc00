// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::info;

use crate::packer::{
    METADATA_FILE_NAME, PackerMethod,
    index::{METADATA_CONTENT_TYPE, METADATA_FORMAT_VERSION, PackedFileMetadata, PackedMetadata},
    unpack,
};
use crate::utils::io::write_file;

#[derive(Debug, clap::Args)]
pub struct UnpackCommand {
    /// Packed method of the container, as reported in the `packerMethod`
    /// response header
    method: String,
    /// Packed container
    container: PathBuf,
    /// Directory receiving the content files and `meta.json`
    #[arg(short, long)]
    output_dir: PathBuf,
}

impl UnpackCommand {
    pub fn run(self) -> anyhow::Result<()> {
        let method = PackerMethod::by_packed_short_code(&self.method)
            .with_context(|| format!("unknown packed method {:?}", self.method))?;
        let bytes = std::fs::read(&self.container)
            .with_context(|| format!("failed to read {}", self.container.display()))?;
        let count = extract(method, &bytes, &self.output_dir)
            .with_context(|| format!("failed to unpack {}", self.container.display()))?;
        info!(
            "extracted {count} files to {}",
            self.output_dir.display()
        );
        Ok(())
    }
}

fn extract(method: PackerMethod, bytes: &[u8], output_dir: &Path) -> anyhow::Result<usize> {
    let files = unpack(method, bytes)?;
    let metadata = PackedMetadata {
        format_version: METADATA_FORMAT_VERSION,
        content: METADATA_CONTENT_TYPE.into(),
        files: files
            .iter()
            .map(|file| (file.name.clone(), PackedFileMetadata::from(&file.origin)))
            .collect(),
    };
    for file in &files {
        write_file(&output_dir.join(&file.name), &file.content)?;
    }
    write_file(
        &output_dir.join(METADATA_FILE_NAME),
        &serde_json::to_vec_pretty(&metadata)?,
    )?;
    Ok(files.len())
}

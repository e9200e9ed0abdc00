// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Entry point for requests of packed snapshot ranges.
//!
//! A request is a JSON document naming a packer method and a fetch time
//! range. It is validated completely before any storage access, then loaded
//! and packed on the calling thread.

use std::{collections::BTreeMap, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use human_repr::HumanCount as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::packer::{PackError, PackerMethod, PackerRegistry, method::UnknownPackerMethod};
use crate::storage::{LoadError, Loader, validation::is_valid_format_name};

pub const REPLY_TO_HEADER: &str = "rabbitmq.REPLY_TO";
pub const EXPIRATION_HEADER: &str = "rabbitmq.EXPIRATION";
pub const ROUTING_KEY_HEADER: &str = "rabbitmq.ROUTING_KEY";
pub const DIRECT_REPLY_TO_QUEUE: &str = "amq.rabbitmq.reply-to";
/// Response header naming the packed short code of the container.
pub const PACKER_METHOD_HEADER: &str = "packerMethod";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFileRequest {
    pub packer_method: String,
    pub earliest_fetch_time: DateTime<Utc>,
    pub latest_fetch_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_file_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestsConfig {
    /// Number of files requested when a request omits `fileLimit`.
    pub default_file_limit: i64,
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            default_file_limit: 1000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    UnknownPackerMethod(#[from] UnknownPackerMethod),
    #[error("earliest fetch time {earliest} is after latest fetch time {latest}")]
    InvalidRange {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    #[error("invalid data file format name {0:?}")]
    InvalidFormatName(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Pack(#[from] PackError),
}

impl RequestError {
    /// Text safe to hand to the requester. Storage and packing failures do
    /// not reveal any detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::Malformed(_)
            | Self::UnknownPackerMethod(_)
            | Self::InvalidRange { .. }
            | Self::InvalidFormatName(_) => format!("invalid request: {self}"),
            Self::Load(LoadError::TransitionInProgress { .. }) => {
                "requested data is currently being archived, retry later".into()
            }
            Self::Load(_) | Self::Pack(_) => "request failed".into(),
        }
    }
}

/// Packed container ready to be sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedResponse {
    pub method: PackerMethod,
    pub file_count: usize,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RequestProcessor {
    loader: Loader,
    registry: PackerRegistry,
    default_file_limit: i64,
}

impl RequestProcessor {
    pub fn new(loader: Loader, registry: PackerRegistry, config: &RequestsConfig) -> Self {
        Self {
            loader,
            registry,
            default_file_limit: config.default_file_limit,
        }
    }

    pub fn parse(payload: &[u8]) -> Result<DataFileRequest, RequestError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Parses, loads and packs one request.
    pub fn process(&self, payload: &[u8]) -> Result<PackedResponse, RequestError> {
        self.process_request(Self::parse(payload)?)
    }

    pub fn process_request(
        &self,
        request: DataFileRequest,
    ) -> Result<PackedResponse, RequestError> {
        let requested_method = request.packer_method.parse::<PackerMethod>()?;
        let (earliest, latest) = (request.earliest_fetch_time, request.latest_fetch_time);
        if earliest > latest {
            return Err(RequestError::InvalidRange { earliest, latest });
        }
        if let Some(invalid) = request
            .data_file_formats
            .iter()
            .find(|it| !is_valid_format_name(it))
        {
            return Err(RequestError::InvalidFormatName(invalid.clone()));
        }
        let packer = self.registry.create_packer(requested_method)?;
        let limit = self.file_limit(request.file_limit);
        info!(
            method = %request.packer_method,
            %earliest,
            %latest,
            limit,
            formats = ?request.data_file_formats,
            "processing request"
        );

        let started = Instant::now();
        let records = self
            .loader
            .load(earliest, latest, limit, &request.data_file_formats)?;
        let loaded = started.elapsed();
        let file_count = records.len();

        let method = packer.method();
        let body = packer.pack(records)?;
        let packed = started.elapsed().saturating_sub(loaded);
        info!(
            files = file_count,
            method = method.packed_short_code(),
            size = %body.len().human_count_bytes(),
            loaded = %humantime::format_duration(loaded),
            packed = %humantime::format_duration(packed),
            "request completed"
        );

        Ok(PackedResponse {
            method,
            file_count,
            headers: BTreeMap::from([(
                PACKER_METHOD_HEADER.to_owned(),
                method.packed_short_code().to_owned(),
            )]),
            body,
        })
    }

    /// Processes the request on the blocking thread pool.
    pub async fn handle(self: Arc<Self>, payload: Vec<u8>) -> Result<PackedResponse, RequestError> {
        tokio::task::spawn_blocking(move || self.process(&payload))
            .await
            .map_err(|e| RequestError::Pack(PackError::Worker(e.to_string())))?
    }

    fn file_limit(&self, requested: Option<i64>) -> usize {
        let requested = requested.unwrap_or(self.default_file_limit);
        if requested < 0 {
            debug!(requested, "negative file limit, nothing will be loaded");
        }
        usize::try_from(requested.max(0)).unwrap_or(usize::MAX)
    }
}

/// Headers of the reply to a message carrying `inbound` headers.
///
/// The reply goes to the queue named by the inbound reply-to header, or to
/// the direct reply-to pseudo queue if none was given.
pub fn reply_headers(inbound: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut headers = inbound.clone();
    headers.remove(EXPIRATION_HEADER);
    let routing_key = headers.remove(REPLY_TO_HEADER).unwrap_or_else(|| {
        warn!("request without reply-to header, using direct reply-to");
        DIRECT_REPLY_TO_QUEUE.to_owned()
    });
    headers.insert(ROUTING_KEY_HEADER.to_owned(), routing_key);
    headers
}

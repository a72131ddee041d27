use crate::constants::upload as defaults;
use crate::errors::UploadError;
use crate::services::file_reader::{read_range, ByteRange};
use crate::services::logger::Logger;
use crate::services::platform::{DataSourceRecord, DataSourceStatus, PartEtag, PartItem, PlatformClient};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub dataset_id: String,
    pub file_path: PathBuf,
    pub file_name: Option<String>,
    pub chunk_size: Option<u64>,
    /// Parts in flight at once. `1` uploads strictly in part order.
    pub concurrency: usize,
}

impl UploadRequest {
    pub fn new(dataset_id: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            file_path: file_path.into(),
            file_name: None,
            chunk_size: None,
            concurrency: defaults::DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            max_poll_attempts: defaults::MAX_POLL_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedDataSource {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub size: Option<u64>,
}

impl From<DataSourceRecord> for UploadedDataSource {
    fn from(record: DataSourceRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            kind: record.kind,
            status: record.status,
            size: record.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub object_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub dataset_id: String,
    pub data_source: UploadedDataSource,
    pub file: UploadedFile,
}

/// One part of the upload with its local byte range resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartPlan {
    pub number: u32,
    pub range: ByteRange,
    pub upload_url: String,
}

/// Resolves server-issued parts into local byte ranges.
///
/// Part `n` starts at `(n - 1) * chunk_size` and spans its declared size,
/// clipped to the end of the file. The resulting ranges must tile
/// `[0, file_size)` exactly; a server whose part sizes disagree with
/// `chunk_size` is rejected here instead of corrupting the upload.
pub fn plan_parts(
    mut parts: Vec<PartItem>,
    chunk_size: u64,
    file_size: u64,
) -> Result<Vec<PartPlan>, String> {
    if parts.is_empty() {
        return Err("part_items is empty".to_string());
    }
    if chunk_size == 0 || file_size == 0 {
        return Err("chunk_size and file_size must be positive".to_string());
    }
    parts.sort_by_key(|part| part.number);

    let mut plans = Vec::with_capacity(parts.len());
    let mut next_start = 0u64;
    for (idx, part) in parts.into_iter().enumerate() {
        let expected = idx as u64 + 1;
        if u64::from(part.number) != expected {
            return Err(format!(
                "part numbers must be contiguous from 1; expected {}, got {}",
                expected, part.number
            ));
        }
        if part.size == 0 {
            return Err(format!("part {} has size 0", part.number));
        }
        let start = (expected - 1)
            .checked_mul(chunk_size)
            .ok_or_else(|| format!("part {} offset overflows", part.number))?;
        if start != next_start || start >= file_size {
            return Err(format!(
                "part {} starts at byte {} but the previous part ended at {}; \
                 server part sizes do not match chunk_size {}",
                part.number, start, next_start, chunk_size
            ));
        }
        let end = start.saturating_add(part.size - 1).min(file_size - 1);
        next_start = end + 1;
        plans.push(PartPlan {
            number: part.number,
            range: ByteRange { start, end },
            upload_url: part.upload_url,
        });
    }
    if next_start != file_size {
        return Err(format!(
            "parts cover {} of {} bytes",
            next_start, file_size
        ));
    }
    Ok(plans)
}

/// Strips surrounding quote characters the storage endpoint puts on ETags.
pub fn normalize_etag(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

/// Drives one local file through initiate → parts → complete → register →
/// poll. Each call is independent; nothing is kept between uploads.
#[derive(Clone)]
pub struct UploadCoordinator {
    logger: Logger,
    platform: PlatformClient,
    options: UploadOptions,
}

impl UploadCoordinator {
    pub fn new(logger: Logger, platform: PlatformClient, options: UploadOptions) -> Self {
        Self {
            logger: logger.child("upload"),
            platform,
            options,
        }
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        let dataset_id = request.dataset_id.trim().to_string();
        if dataset_id.is_empty() {
            return Err(UploadError::InvalidRequest {
                reason: "dataset_id must be a non-empty string".to_string(),
            });
        }
        let chunk_size = request.chunk_size.unwrap_or(defaults::DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(UploadError::InvalidRequest {
                reason: "chunk_size must be a positive integer".to_string(),
            });
        }

        let file_size = file_size(&request.file_path).await?;
        if file_size == 0 {
            return Err(UploadError::InvalidRequest {
                reason: format!("{} is empty", request.file_path.display()),
            });
        }
        let file_name = resolve_file_name(&request.file_path, request.file_name.as_deref());

        self.logger.info(
            "initiating upload",
            Some(&serde_json::json!({
                "dataset_id": dataset_id,
                "file_name": file_name,
                "file_size": file_size,
            })),
        );
        let session = self
            .platform
            .init_multipart_upload(&file_name, file_size)
            .await
            .map_err(UploadError::initiation)?;
        let plans = plan_parts(session.part_items, chunk_size, file_size)
            .map_err(|reason| UploadError::InitiationFailed { reason })?;

        let part_etags = self
            .upload_parts(&request.file_path, plans, request.concurrency)
            .await?;

        let completed = self
            .platform
            .complete_multipart_upload(&session.file_object_key, &session.upload_id, &part_etags)
            .await
            .map_err(UploadError::completion)?;
        self.logger.info(
            "multipart upload completed",
            Some(&serde_json::json!({
                "file_object_key": completed.file_object_key,
                "parts": part_etags.len(),
            })),
        );

        let created = self
            .platform
            .create_data_source(&dataset_id, &file_name, &completed.file_object_key)
            .await
            .map_err(UploadError::creation)?;
        let record = self.wait_until_synced(&dataset_id, &created.id).await?;

        Ok(UploadOutcome {
            dataset_id,
            data_source: record.into(),
            file: UploadedFile {
                name: file_name,
                size: file_size,
                object_key: completed.file_object_key,
            },
        })
    }

    /// Uploads every part and returns the ETags sorted by part number.
    async fn upload_parts(
        &self,
        path: &Path,
        plans: Vec<PartPlan>,
        concurrency: usize,
    ) -> Result<Vec<PartEtag>, UploadError> {
        let concurrency = concurrency.clamp(1, defaults::MAX_CONCURRENCY);
        let mut etags: Vec<PartEtag> = futures::stream::iter(plans)
            .map(|plan| self.upload_part(path, plan))
            .buffer_unordered(concurrency)
            .try_collect::<Vec<_>>()
            .await?;
        etags.sort_by_key(|part| part.number);
        Ok(etags)
    }

    async fn upload_part(&self, path: &Path, plan: PartPlan) -> Result<PartEtag, UploadError> {
        let number = plan.number;
        let body = read_range(path, plan.range)
            .await
            .map_err(|err| UploadError::part(number, format!("read failed: {}", err)))?;
        let etag = self
            .platform
            .upload_part(&plan.upload_url, body)
            .await
            .map_err(|err| UploadError::part(number, err))?
            .map(|raw| normalize_etag(&raw))
            .filter(|etag| !etag.is_empty())
            .ok_or_else(|| UploadError::part(number, "storage endpoint returned no ETag"))?;
        self.logger.debug(
            "part uploaded",
            Some(&serde_json::json!({
                "part": number,
                "start": plan.range.start,
                "end": plan.range.end,
            })),
        );
        Ok(PartEtag { number, etag })
    }

    async fn wait_until_synced(
        &self,
        dataset_id: &str,
        data_source_id: &str,
    ) -> Result<DataSourceRecord, UploadError> {
        let max_attempts = self.options.max_poll_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.platform.get_data_source(dataset_id, data_source_id).await {
                Ok(record) => match record.status() {
                    DataSourceStatus::Synched => {
                        self.logger.info(
                            "data source synched",
                            Some(&serde_json::json!({
                                "data_source_id": data_source_id,
                                "attempt": attempt,
                            })),
                        );
                        return Ok(record);
                    }
                    DataSourceStatus::Invalid => {
                        return Err(UploadError::DataSourceProcessingFailed {
                            data_source_id: data_source_id.to_string(),
                        });
                    }
                    status => {
                        self.logger.debug(
                            "data source not ready",
                            Some(&serde_json::json!({
                                "attempt": attempt,
                                "status": status.to_string(),
                            })),
                        );
                    }
                },
                // Only transient failures use up an attempt; anything else ends the upload.
                Err(err) if err.is_retryable() => {
                    self.logger.warn(
                        "status check failed, will retry",
                        Some(&serde_json::json!({
                            "attempt": attempt,
                            "error": err.to_string(),
                        })),
                    );
                }
                Err(err) => {
                    return Err(UploadError::DataSourceStatusCheckFailed {
                        data_source_id: data_source_id.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.options.poll_interval).await;
            }
        }
        Err(UploadError::DataSourceSyncTimeout {
            data_source_id: data_source_id.to_string(),
            attempts: max_attempts,
        })
    }
}

async fn file_size(path: &Path) -> Result<u64, UploadError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        _ => Err(UploadError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

fn resolve_file_name(path: &Path, explicit: Option<&str>) -> String {
    if let Some(name) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return name.to_string();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn part(number: u32, size: u64) -> PartItem {
        PartItem {
            number,
            size,
            upload_url: format!("https://storage.test/part/{}", number),
        }
    }

    #[test]
    fn twelve_mib_file_tiles_into_three_ranges() {
        let file_size = 2 * 5 * MIB + 1_572_864;
        let plans = plan_parts(
            vec![part(1, 5_242_880), part(2, 5_242_880), part(3, 1_572_864)],
            5 * MIB,
            file_size,
        )
        .expect("plan");
        let ranges: Vec<(u64, u64)> = plans.iter().map(|p| (p.range.start, p.range.end)).collect();
        assert_eq!(
            ranges,
            vec![(0, 5_242_879), (5_242_880, 10_485_759), (10_485_760, 12_058_623)]
        );
    }

    #[test]
    fn ranges_tile_the_file_for_any_part_count() {
        for file_size in [1u64, 7, 100, 4096, 4097, 10_000] {
            let chunk = 1000u64;
            let count = file_size.div_ceil(chunk);
            let parts: Vec<PartItem> = (1..=count)
                .map(|n| {
                    let size = if n == count { file_size - (n - 1) * chunk } else { chunk };
                    part(n as u32, size)
                })
                .collect();
            assert_eq!(parts.iter().map(|p| p.size).sum::<u64>(), file_size);
            let plans = plan_parts(parts, chunk, file_size).expect("plan");
            let mut cursor = 0;
            for plan in &plans {
                assert_eq!(plan.range.start, cursor);
                cursor = plan.range.end + 1;
            }
            assert_eq!(cursor, file_size);
        }
    }

    #[test]
    fn shuffled_parts_are_planned_in_number_order() {
        let plans = plan_parts(vec![part(3, 2), part(1, 4), part(2, 4)], 4, 10).expect("plan");
        let numbers: Vec<u32> = plans.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_gaps_and_mismatched_sizes() {
        assert!(plan_parts(vec![part(1, 4), part(3, 2)], 4, 10).is_err());
        assert!(plan_parts(vec![part(1, 3), part(2, 4)], 4, 7).is_err());
        assert!(plan_parts(vec![part(1, 4)], 4, 10).is_err());
        assert!(plan_parts(Vec::new(), 4, 10).is_err());
    }

    #[test]
    fn final_part_is_clipped_to_file_end() {
        let plans = plan_parts(vec![part(1, 4), part(2, 4)], 4, 6).expect("plan");
        assert_eq!(plans[1].range, ByteRange { start: 4, end: 5 });
    }

    #[test]
    fn etags_lose_surrounding_quotes() {
        assert_eq!(normalize_etag("\"abc123\""), "abc123");
        assert_eq!(normalize_etag("abc123"), "abc123");
        assert_eq!(normalize_etag(" \"\"abc\"\" "), "abc");
    }

    #[test]
    fn file_name_defaults_to_base_name() {
        let path = PathBuf::from("/tmp/data/sales.csv");
        assert_eq!(resolve_file_name(&path, None), "sales.csv");
        assert_eq!(resolve_file_name(&path, Some("  ")), "sales.csv");
        assert_eq!(resolve_file_name(&path, Some("q3.csv")), "q3.csv");
    }
}

//! # Snapshot I/O
//!
//! Atomic persistence for ranking snapshots.
//!
//! ## Files Written
//! - `<period>_<version>_<kind>.json`: pretty JSON snapshot
//! - `<period>_<version>_<kind>.sha256`: SHA-256 of the JSON bytes in
//!   sha256sum format
//!
//! Both go through a temp file and a rename, so a reader never sees a
//! partial snapshot.

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use toolrank_models::RankingSnapshot;

/// Result of persisting one snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotWriteResult {
    pub snapshot_path: PathBuf,
    pub sha_path: PathBuf,
    /// SHA-256 of the written bytes (lowercase hex).
    pub file_sha256: String,
    pub bytes_len: usize,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// File stem for a snapshot, e.g. `2025-06_v7.1_live`.
pub fn snapshot_stem(snapshot: &RankingSnapshot) -> String {
    format!(
        "{}_{}_{}",
        snapshot.period, snapshot.algorithm_version, snapshot.kind
    )
}

/// Write bytes to a file atomically via a sibling temp file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("Failed to create directory: {:?}", parent))?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    {
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("Failed to write to temp file: {:?}", temp_path))?;
        file.sync_all()
            .await
            .with_context(|| format!("Failed to sync temp file: {:?}", temp_path))?;
    }

    tokio::fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;
    Ok(())
}

/// Persist a snapshot and its checksum file under `out_dir`.
pub async fn write_snapshot(out_dir: &Path, snapshot: &RankingSnapshot) -> Result<SnapshotWriteResult> {
    let bytes = serde_json::to_vec_pretty(snapshot).context("Failed to serialize snapshot")?;
    let file_sha256 = sha256_hex(&bytes);

    let stem = snapshot_stem(snapshot);
    let snapshot_name = format!("{}.json", stem);
    let snapshot_path = out_dir.join(&snapshot_name);
    let sha_path = out_dir.join(format!("{}.sha256", stem));

    write_atomic(&snapshot_path, &bytes)
        .await
        .with_context(|| format!("Failed to write snapshot: {:?}", snapshot_path))?;
    let hash_content = format!("{}  {}\n", file_sha256, snapshot_name);
    write_atomic(&sha_path, hash_content.as_bytes())
        .await
        .with_context(|| format!("Failed to write hash file: {:?}", sha_path))?;

    tracing::info!(
        path = %snapshot_path.display(),
        snapshot_id = %snapshot.snapshot_id,
        bytes = bytes.len(),
        "snapshot written"
    );

    Ok(SnapshotWriteResult {
        snapshot_path,
        sha_path,
        file_sha256,
        bytes_len: bytes.len(),
    })
}

/// Load a snapshot and check its content digest.
pub async fn load_snapshot(path: &Path) -> Result<RankingSnapshot> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read snapshot: {:?}", path))?;
    let snapshot: RankingSnapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse snapshot: {:?}", path))?;
    if !snapshot.verify_digest() {
        bail!(
            "Snapshot digest mismatch in {:?}: recorded {}, computed {}",
            path,
            snapshot.digest,
            snapshot.compute_digest()
        );
    }
    Ok(snapshot)
}

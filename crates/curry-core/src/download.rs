//! Seam for fetching a tracker's existing torrent file.

use async_trait::async_trait;

use crate::error::MigrationResult;

/// Downloads the `.torrent` a tracker already serves for a release.
#[async_trait]
pub trait TorrentDownloader: Send + Sync {
    /// Fetch the raw torrent bytes for `torrent_id` using the user's keys.
    async fn download_torrent(
        &self,
        torrent_id: u64,
        authkey: &str,
        passkey: &str,
    ) -> MigrationResult<Vec<u8>>;
}

use super::client::{BackendClient, BackendError};
use crate::models::CommunityStats;

impl BackendClient {
    /// Headline numbers for the landing page.
    pub async fn community_stats(&self) -> Result<CommunityStats, BackendError> {
        let (total_artworks, total_artists, options) = tokio::try_join!(
            self.count("artworks", &[]),
            self.count("profiles", &[]),
            self.filter_options(),
        )?;

        Ok(CommunityStats {
            total_artworks,
            total_artists,
            total_regions: options.regions.len() as u64,
        })
    }
}

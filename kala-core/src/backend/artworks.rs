use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::{BackendClient, BackendError};
use super::query::{artwork_select, eq, order_clause};
use crate::content_type::{file_extension, ContentType};
use crate::models::{Artwork, FilterOptions, NewArtwork};
use kala_common::SortOrder;

/// Row written when an upload completes.
#[derive(Serialize)]
struct ArtworkRow<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    image_url: String,
    user_id: &'a str,
}

#[derive(Deserialize)]
struct StyleRow {
    style: Option<String>,
}

#[derive(Deserialize)]
struct RegionRow {
    region: Option<String>,
}

impl BackendClient {
    /// Fetch a single artwork. None if it does not exist.
    pub async fn get_artwork(&self, id: &str) -> Result<Option<Artwork>, BackendError> {
        self.select_one(
            "artworks",
            &[("select", artwork_select()), ("id", eq(id))],
        )
        .await
    }

    /// All artworks by one artist, newest first.
    pub async fn list_artworks_by_artist(
        &self,
        user_id: &str,
    ) -> Result<Vec<Artwork>, BackendError> {
        self.select(
            "artworks",
            &[
                ("select", artwork_select()),
                ("user_id", eq(user_id)),
                ("order", order_clause(SortOrder::CreatedAtDesc).to_string()),
            ],
        )
        .await
    }

    /// Distinct non-blank styles and regions, in first-seen order.
    pub async fn filter_options(&self) -> Result<FilterOptions, BackendError> {
        let style_query = [
            ("select", "style".to_string()),
            ("style", "not.is.null".to_string()),
        ];
        let region_query = [
            ("select", "region".to_string()),
            ("region", "not.is.null".to_string()),
        ];
        let (styles, regions) = tokio::try_join!(
            self.select::<StyleRow>("artworks", &style_query),
            self.select::<RegionRow>("artworks", &region_query),
        )?;

        Ok(FilterOptions {
            styles: distinct(styles.into_iter().filter_map(|r| r.style)),
            regions: distinct(regions.into_iter().filter_map(|r| r.region)),
        })
    }

    /// Store an image and create its artwork row for the signed-in user.
    ///
    /// The object lands at `{user_id}/{unix_millis}.{ext}` and the row records
    /// its public URL.
    pub async fn upload_artwork(
        &self,
        file_name: &str,
        data: Vec<u8>,
        artwork: &NewArtwork,
    ) -> Result<Artwork, BackendError> {
        let session = self.require_session()?;

        let title = artwork.title.trim();
        if title.is_empty() {
            return Err(BackendError::InvalidInput("title is required".into()));
        }
        if data.is_empty() {
            return Err(BackendError::InvalidInput("image file is empty".into()));
        }
        let content_type = file_extension(file_name)
            .map(ContentType::from_extension)
            .filter(ContentType::is_image)
            .ok_or_else(|| {
                BackendError::InvalidInput(format!("{file_name} is not an image file"))
            })?;

        let path = format!(
            "{}/{}.{}",
            session.user_id,
            chrono::Utc::now().timestamp_millis(),
            content_type.extension()
        );
        self.upload_object(&path, content_type.as_str(), data).await?;

        let row = ArtworkRow {
            title,
            description: non_blank(&artwork.description),
            style: non_blank(&artwork.style),
            region: non_blank(&artwork.region),
            tags: &artwork.tags,
            image_url: self.public_image_url(&path),
            user_id: &session.user_id,
        };
        let created: Artwork = self
            .insert_returning("artworks", &[("select", artwork_select())], &row)
            .await?;

        info!("Uploaded artwork {} ({})", created.id, path);
        Ok(created)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

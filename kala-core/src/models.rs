//! Records exchanged with the backend.

use chrono::{DateTime, Utc};
use kala_common::FeedItem;
use serde::{Deserialize, Deserializer, Serialize};

/// Denormalized artist summary embedded in artworks and comments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl ArtistSummary {
    /// Full name, else username, else a placeholder.
    pub fn display_name(&self) -> &str {
        [&self.full_name, &self.username]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown Artist")
    }
}

/// Read-only artwork projection shown in the gallery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Storage path or absolute URL of the image
    #[serde(rename = "image_url")]
    pub image_ref: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub artist: Option<ArtistSummary>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Advisory only; read from an embedded aggregate
    #[serde(default, deserialize_with = "deserialize_embedded_count")]
    pub like_count: u64,
}

impl Artwork {
    pub fn artist_name(&self) -> &str {
        self.artist
            .as_ref()
            .map(|a| a.display_name())
            .unwrap_or("Unknown Artist")
    }
}

impl FeedItem for Artwork {
    fn feed_id(&self) -> &str {
        &self.id
    }
}

/// Metadata submitted with an upload.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NewArtwork {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub is_artist: bool,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub art_styles: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// A profile without a username or full name has not finished onboarding.
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.username) && filled(&self.full_name)
    }
}

/// Partial profile update; unset fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_artist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Everything collected by the onboarding wizard.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OnboardingProfile {
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub is_artist: bool,
    pub art_styles: Vec<String>,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<ArtistSummary>,
}

/// An entry in the signed-in user's liked collection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LikedArtwork {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub artwork: Option<Artwork>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    NotLiked,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommunityStats {
    pub total_artworks: u64,
    pub total_artists: u64,
    pub total_regions: u64,
}

/// Distinct values offered by the style and region pickers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub styles: Vec<String>,
    pub regions: Vec<String>,
}

/// A requirement an artwork must meet before it can be exported.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ExportStandard {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub category: Option<String>,
    pub requirement: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Review outcome of one standard for one artwork.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Approved,
    Rejected,
    #[serde(other)]
    Pending,
}

/// One line of an artwork's export checklist. `status` is None until the
/// standard has been reviewed.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportCheck {
    pub standard: ExportStandard,
    pub status: Option<ExportStatus>,
}

/// Ids come back as JSON numbers for serial keys and strings for uuids.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Embedded aggregates arrive as `[{"count": n}]`; a bare number is accepted too.
fn deserialize_embedded_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    struct CountRow {
        count: u64,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Plain(u64),
        Rows(Vec<CountRow>),
        Null(Option<()>),
    }

    Ok(match RawCount::deserialize(deserializer)? {
        RawCount::Plain(n) => n,
        RawCount::Rows(rows) => rows.iter().map(|r| r.count).sum(),
        RawCount::Null(_) => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_artwork_with_embedded_artist_and_count() {
        let json = serde_json::json!({
            "id": 42,
            "title": "Harvest Dance",
            "description": "Warli figures around a tarpa player",
            "image_url": "u1/1700000000000.jpg",
            "user_id": "u1",
            "style": "Warli",
            "region": "Maharashtra",
            "created_at": "2024-03-01T10:00:00+00:00",
            "artist": {"id": "u1", "username": "jivya", "full_name": "Jivya Mashe", "avatar_url": null},
            "like_count": [{"count": 7}]
        });

        let artwork: Artwork = serde_json::from_value(json).unwrap();
        assert_eq!(artwork.id, "42");
        assert_eq!(artwork.image_ref, "u1/1700000000000.jpg");
        assert_eq!(artwork.artist_name(), "Jivya Mashe");
        assert_eq!(artwork.like_count, 7);
        assert_eq!(artwork.feed_id(), "42");
    }

    #[test]
    fn parse_artwork_minimal() {
        let json = serde_json::json!({
            "id": "b3f1",
            "title": "Untitled",
            "image_url": "https://cdn.example.com/a.png",
            "created_at": "2024-03-01T10:00:00Z"
        });

        let artwork: Artwork = serde_json::from_value(json).unwrap();
        assert_eq!(artwork.id, "b3f1");
        assert_eq!(artwork.like_count, 0);
        assert!(artwork.style.is_none());
        assert_eq!(artwork.artist_name(), "Unknown Artist");
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let artist = ArtistSummary {
            id: "u2".into(),
            username: Some("gond_artist".into()),
            full_name: Some("  ".into()),
            avatar_url: None,
        };
        assert_eq!(artist.display_name(), "gond_artist");
    }

    #[test]
    fn profile_completeness() {
        let mut profile: Profile =
            serde_json::from_value(serde_json::json!({"id": "u1", "is_artist": null})).unwrap();
        assert!(!profile.is_artist);
        assert!(!profile.is_complete());

        profile.username = Some("asha".into());
        assert!(!profile.is_complete());

        profile.full_name = Some("Asha Devi".into());
        assert!(profile.is_complete());
    }

    #[test]
    fn profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            bio: Some("Madhubani painter".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({"bio": "Madhubani painter"}));
    }

    #[test]
    fn parse_export_status() {
        let parse =
            |v: &str| serde_json::from_value::<ExportStatus>(serde_json::json!(v)).unwrap();
        assert_eq!(parse("approved"), ExportStatus::Approved);
        assert_eq!(parse("rejected"), ExportStatus::Rejected);
        assert_eq!(parse("in_review"), ExportStatus::Pending);
    }

    #[test]
    fn parse_liked_artwork_with_missing_artwork() {
        let json = serde_json::json!({
            "id": 9,
            "created_at": "2024-05-01T00:00:00Z",
            "artwork": null
        });
        let liked: LikedArtwork = serde_json::from_value(json).unwrap();
        assert_eq!(liked.id, "9");
        assert!(liked.artwork.is_none());
    }
}

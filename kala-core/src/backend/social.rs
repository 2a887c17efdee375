//! Likes, comments and follows for the signed-in user.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::{BackendClient, BackendError};
use super::query::{eq, PROFILE_SUMMARY};
use crate::models::{Comment, FollowCounts, LikeState, LikedArtwork};

const LIKES: &str = "artwork_likes";
const COMMENTS: &str = "artwork_comments";
const FOLLOWS: &str = "follows";

#[derive(Serialize)]
struct LikeRow<'a> {
    artwork_id: &'a str,
    user_id: &'a str,
}

#[derive(Serialize)]
struct CommentRow<'a> {
    artwork_id: &'a str,
    user_id: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct FollowRow<'a> {
    follower_id: &'a str,
    following_id: &'a str,
}

#[derive(Deserialize)]
struct IdRow {}

impl BackendClient {
    pub async fn is_liked(&self, artwork_id: &str) -> Result<bool, BackendError> {
        let session = self.require_session()?;
        let rows: Vec<IdRow> = self
            .select(
                LIKES,
                &[
                    ("select", "id".to_string()),
                    ("artwork_id", eq(artwork_id)),
                    ("user_id", eq(&session.user_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Flip the like on an artwork. Returns the state after the flip.
    pub async fn toggle_like(&self, artwork_id: &str) -> Result<LikeState, BackendError> {
        if self.is_liked(artwork_id).await? {
            self.unlike(artwork_id).await?;
            Ok(LikeState::NotLiked)
        } else {
            let session = self.require_session()?;
            self.insert(
                LIKES,
                &LikeRow {
                    artwork_id,
                    user_id: &session.user_id,
                },
            )
            .await?;
            info!("Liked artwork {}", artwork_id);
            Ok(LikeState::Liked)
        }
    }

    pub async fn unlike(&self, artwork_id: &str) -> Result<(), BackendError> {
        let session = self.require_session()?;
        self.delete(
            LIKES,
            &[
                ("artwork_id", eq(artwork_id)),
                ("user_id", eq(&session.user_id)),
            ],
        )
        .await?;
        info!("Unliked artwork {}", artwork_id);
        Ok(())
    }

    /// The signed-in user's liked artworks, most recently liked first.
    pub async fn liked_artworks(&self) -> Result<Vec<LikedArtwork>, BackendError> {
        let session = self.require_session()?;
        self.select(
            LIKES,
            &[
                (
                    "select",
                    format!("id,created_at,artwork:artworks(*,artist:profiles({PROFILE_SUMMARY}))"),
                ),
                ("user_id", eq(&session.user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Comments on an artwork, newest first. Readable while signed out.
    pub async fn list_comments(&self, artwork_id: &str) -> Result<Vec<Comment>, BackendError> {
        self.select(
            COMMENTS,
            &[
                ("select", format!("*,user:profiles({PROFILE_SUMMARY})")),
                ("artwork_id", eq(artwork_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    pub async fn post_comment(
        &self,
        artwork_id: &str,
        content: &str,
    ) -> Result<Comment, BackendError> {
        let session = self.require_session()?;
        let content = content.trim();
        if content.is_empty() {
            return Err(BackendError::InvalidInput("comment is empty".into()));
        }

        let comment: Comment = self
            .insert_returning(
                COMMENTS,
                &[("select", format!("*,user:profiles({PROFILE_SUMMARY})"))],
                &CommentRow {
                    artwork_id,
                    user_id: &session.user_id,
                    content,
                },
            )
            .await?;
        info!("Posted comment {} on artwork {}", comment.id, artwork_id);
        Ok(comment)
    }

    /// Follow another user. Following someone already followed is a no-op.
    pub async fn follow(&self, user_id: &str) -> Result<(), BackendError> {
        let session = self.require_session()?;
        if session.user_id == user_id {
            return Err(BackendError::InvalidInput("cannot follow yourself".into()));
        }
        if self.is_following(user_id).await? {
            return Ok(());
        }

        self.insert(
            FOLLOWS,
            &FollowRow {
                follower_id: &session.user_id,
                following_id: user_id,
            },
        )
        .await?;
        info!("Now following {}", user_id);
        Ok(())
    }

    pub async fn unfollow(&self, user_id: &str) -> Result<(), BackendError> {
        let session = self.require_session()?;
        self.delete(
            FOLLOWS,
            &[
                ("follower_id", eq(&session.user_id)),
                ("following_id", eq(user_id)),
            ],
        )
        .await?;
        info!("Unfollowed {}", user_id);
        Ok(())
    }

    pub async fn is_following(&self, user_id: &str) -> Result<bool, BackendError> {
        let session = self.require_session()?;
        let rows: Vec<IdRow> = self
            .select(
                FOLLOWS,
                &[
                    ("select", "id".to_string()),
                    ("follower_id", eq(&session.user_id)),
                    ("following_id", eq(user_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Follower and following totals for any user.
    pub async fn follow_counts(&self, user_id: &str) -> Result<FollowCounts, BackendError> {
        let followers_query = [("following_id", eq(user_id))];
        let following_query = [("follower_id", eq(user_id))];
        let (followers, following) = tokio::try_join!(
            self.count(FOLLOWS, &followers_query),
            self.count(FOLLOWS, &following_query),
        )?;
        Ok(FollowCounts {
            followers,
            following,
        })
    }
}

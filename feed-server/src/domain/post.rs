use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: Option<i64>,
}

/// A post row joined with its author's display name, as the feed and
/// post-detail reads return it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FeedPost {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: Option<i64>,
}

use crate::application::feed_service::FeedPage;
use crate::domain::error::DomainError;
use crate::domain::feed::PageNumber;
use crate::domain::post::FeedPost;
use serde::Serialize;

/// Page parameter policy: absent means page 1; a repeated key, a
/// non-integer, or a value below 1 is rejected rather than coerced.
pub fn parse_page_param(query: &str) -> Result<PageNumber, DomainError> {
    let values: Vec<&str> = query
        .split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (key == "page").then_some(value)
        })
        .collect();

    match values.as_slice() {
        [] => Ok(PageNumber::FIRST),
        [raw] => raw
            .parse::<u32>()
            .map_err(|_| DomainError::InvalidPage((*raw).to_string()))
            .and_then(PageNumber::new),
        _ => Err(DomainError::InvalidPage("repeated page parameter".into())),
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorDto {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: Option<i64>,
    pub author: Option<AuthorDto>,
}

impl From<FeedPost> for FeedItem {
    fn from(post: FeedPost) -> Self {
        let author = post
            .author_id
            .is_some()
            .then(|| AuthorDto {
                name: post.author_name.clone(),
            });
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            author_id: post.author_id,
            author,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub feed: Vec<FeedItem>,
    pub page: u32,
    pub total_pages: u32,
}

impl From<FeedPage> for FeedResponse {
    fn from(page: FeedPage) -> Self {
        Self {
            feed: page.posts.into_iter().map(FeedItem::from).collect(),
            page: page.page.get(),
            total_pages: page.total_pages,
        }
    }
}

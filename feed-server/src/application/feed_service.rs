use std::sync::Arc;

use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::feed::{FeedWindow, PageNumber, Requester, total_pages};
use crate::domain::post::FeedPost;
use tracing::{instrument, warn};

/// One assembled feed page, ready for presentation.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<FeedPost>,
    pub page: PageNumber,
    pub total_pages: u32,
}

#[derive(Clone)]
pub struct FeedService<P: PostRepository + 'static, U: UserRepository + 'static> {
    posts: Arc<P>,
    users: Arc<U>,
    page_size: u32,
}

impl<P, U> FeedService<P, U>
where
    P: PostRepository + 'static,
    U: UserRepository + 'static,
{
    pub fn new(posts: Arc<P>, users: Arc<U>, page_size: u32) -> Self {
        Self {
            posts,
            users,
            page_size,
        }
    }

    /// Maps the externally verified session email to a requester identity.
    /// A missing or unknown email is anonymous; a failed lookup degrades to
    /// anonymous rather than failing the read.
    async fn resolve_requester(&self, session_email: Option<&str>) -> Requester {
        let Some(email) = session_email else {
            return Requester::Anonymous;
        };
        match self.users.find_by_email(email).await {
            Ok(Some(user)) => Requester::User(user.id),
            Ok(None) => Requester::Anonymous,
            Err(e) => {
                warn!("identity lookup failed, treating request as anonymous: {}", e);
                Requester::Anonymous
            }
        }
    }

    #[instrument(skip(self, session_email))]
    pub async fn feed(
        &self,
        session_email: Option<&str>,
        page: PageNumber,
    ) -> Result<FeedPage, DomainError> {
        let viewer = self.resolve_requester(session_email).await;
        let window = FeedWindow::new(page, self.page_size);

        let ids = self.posts.visible_ids_for_page(viewer, window).await?;
        let count = self.posts.count_visible(viewer).await?;
        let posts = if ids.is_empty() {
            Vec::new()
        } else {
            self.posts.feed_posts_by_ids(&ids).await?
        };

        Ok(FeedPage {
            posts,
            page,
            total_pages: total_pages(count, self.page_size),
        })
    }

    #[instrument(skip(self, session_email))]
    pub async fn post_detail(
        &self,
        session_email: Option<&str>,
        id: i64,
    ) -> Result<FeedPost, DomainError> {
        let viewer = self.resolve_requester(session_email).await;
        self.posts
            .find_visible_by_id(id, viewer)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feed::POSTS_PER_PAGE;
    use crate::domain::post::NewPost;
    use crate::domain::post::Post;
    use crate::domain::user::{NewUser, User};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn visible(post: &FeedPost, viewer: Requester) -> bool {
        post.published || post.author_id == Some(viewer.author_id())
    }

    /// Honest in-memory stand-in for the Postgres repository: materializes
    /// the ordered visible id sequence and slices it, exactly the semantics
    /// the fused SQL window implements.
    struct InMemoryPosts {
        rows: Mutex<Vec<FeedPost>>,
    }

    impl InMemoryPosts {
        fn new(rows: Vec<FeedPost>) -> Self {
            Self {
                rows: Mutex::new(rows),
            }
        }

        fn visible_ids(&self, viewer: Requester) -> Vec<i64> {
            let mut ids: Vec<i64> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|p| visible(p, viewer))
                .map(|p| p.id)
                .collect();
            ids.sort_unstable();
            ids
        }
    }

    #[async_trait]
    impl PostRepository for InMemoryPosts {
        async fn visible_ids_for_page(
            &self,
            viewer: Requester,
            window: FeedWindow,
        ) -> Result<Vec<i64>, DomainError> {
            Ok(self
                .visible_ids(viewer)
                .into_iter()
                .skip(window.prior_rows() as usize)
                .take(window.limit() as usize)
                .collect())
        }

        async fn count_visible(&self, viewer: Requester) -> Result<i64, DomainError> {
            Ok(self.visible_ids(viewer).len() as i64)
        }

        async fn feed_posts_by_ids(&self, ids: &[i64]) -> Result<Vec<FeedPost>, DomainError> {
            let mut rows: Vec<FeedPost> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect();
            rows.sort_unstable_by_key(|p| p.id);
            Ok(rows)
        }

        async fn find_visible_by_id(
            &self,
            id: i64,
            viewer: Requester,
        ) -> Result<Option<FeedPost>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id && visible(p, viewer))
                .cloned())
        }

        async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.iter().map(|p| p.id).max().unwrap_or(0) + 1;
            rows.push(FeedPost {
                id,
                title: post.title.clone(),
                content: post.content.clone(),
                published: post.published,
                author_id: post.author_id,
                author_name: None,
            });
            Ok(Post {
                id,
                title: post.title,
                content: post.content,
                published: post.published,
                author_id: post.author_id,
            })
        }
    }

    struct InMemoryUsers {
        users: Vec<User>,
    }

    #[async_trait]
    impl UserRepository for InMemoryUsers {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
            Ok(self.users.iter().find(|u| u.email == email).cloned())
        }

        async fn create(&self, user: NewUser) -> Result<User, DomainError> {
            Err(DomainError::Store(format!(
                "read-only test repository: {}",
                user.email
            )))
        }
    }

    struct FailingUsers;

    #[async_trait]
    impl UserRepository for FailingUsers {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, DomainError> {
            Err(DomainError::Store("connection refused".into()))
        }

        async fn create(&self, _user: NewUser) -> Result<User, DomainError> {
            Err(DomainError::Store("connection refused".into()))
        }
    }

    const AUTHOR_EMAIL: &str = "nahab@example.com";

    /// Posts 1-20 published with no owner, 21-25 drafts owned by user 7.
    fn scenario_posts() -> Vec<FeedPost> {
        (1..=25)
            .map(|id| FeedPost {
                id,
                title: format!("post {id}"),
                content: Some(format!("content {id}")),
                published: id <= 20,
                author_id: (id > 20).then_some(7),
                author_name: (id > 20).then(|| "Nahab".to_string()),
            })
            .collect()
    }

    fn scenario_service() -> FeedService<InMemoryPosts, InMemoryUsers> {
        let posts = Arc::new(InMemoryPosts::new(scenario_posts()));
        let users = Arc::new(InMemoryUsers {
            users: vec![User {
                id: 7,
                name: Some("Nahab".into()),
                email: AUTHOR_EMAIL.into(),
            }],
        });
        FeedService::new(posts, users, POSTS_PER_PAGE)
    }

    fn page(n: u32) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    fn ids(feed: &FeedPage) -> Vec<i64> {
        feed.posts.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn owner_pages_partition_the_feed() {
        let service = scenario_service();

        let p1 = service.feed(Some(AUTHOR_EMAIL), page(1)).await.unwrap();
        let p2 = service.feed(Some(AUTHOR_EMAIL), page(2)).await.unwrap();
        let p3 = service.feed(Some(AUTHOR_EMAIL), page(3)).await.unwrap();

        assert_eq!(ids(&p1), (1..=10).collect::<Vec<_>>());
        assert_eq!(ids(&p2), (11..=20).collect::<Vec<_>>());
        assert_eq!(ids(&p3), (21..=25).collect::<Vec<_>>());
        assert_eq!(p1.total_pages, 3);

        // adjacent windows are disjoint and ordered
        assert!(ids(&p1).last().unwrap() < ids(&p2).first().unwrap());
        assert!(ids(&p2).last().unwrap() < ids(&p3).first().unwrap());
    }

    #[tokio::test]
    async fn anonymous_never_sees_drafts() {
        let service = scenario_service();

        let p3 = service.feed(None, page(3)).await.unwrap();
        assert!(p3.posts.is_empty());
        assert_eq!(p3.total_pages, 2);

        for n in 1..=3 {
            let feed = service.feed(None, page(n)).await.unwrap();
            assert!(ids(&feed).iter().all(|id| *id <= 20));
        }
    }

    #[tokio::test]
    async fn unknown_email_behaves_as_anonymous() {
        let service = scenario_service();
        let feed = service
            .feed(Some("stranger@example.com"), page(1))
            .await
            .unwrap();
        assert_eq!(feed.total_pages, 2);
    }

    #[tokio::test]
    async fn failed_identity_lookup_degrades_to_anonymous() {
        let posts = Arc::new(InMemoryPosts::new(scenario_posts()));
        let service = FeedService::new(posts, Arc::new(FailingUsers), POSTS_PER_PAGE);

        let feed = service.feed(Some(AUTHOR_EMAIL), page(1)).await.unwrap();
        assert_eq!(feed.total_pages, 2);
        assert_eq!(ids(&feed), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn out_of_range_page_is_empty_not_an_error() {
        let service = scenario_service();
        let feed = service.feed(None, page(99)).await.unwrap();
        assert!(feed.posts.is_empty());
        assert_eq!(feed.total_pages, 2);
    }

    #[tokio::test]
    async fn feed_is_idempotent_against_an_unchanged_store() {
        let service = scenario_service();
        let a = service.feed(Some(AUTHOR_EMAIL), page(2)).await.unwrap();
        let b = service.feed(Some(AUTHOR_EMAIL), page(2)).await.unwrap();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.total_pages, b.total_pages);
    }

    #[tokio::test]
    async fn rows_come_back_in_window_order() {
        let service = scenario_service();
        let feed = service.feed(Some(AUTHOR_EMAIL), page(3)).await.unwrap();
        let returned = ids(&feed);
        let mut sorted = returned.clone();
        sorted.sort_unstable();
        assert_eq!(returned, sorted);
    }

    #[tokio::test]
    async fn post_detail_follows_the_visibility_rule() {
        let service = scenario_service();

        let draft = service.post_detail(Some(AUTHOR_EMAIL), 21).await.unwrap();
        assert_eq!(draft.id, 21);
        assert_eq!(draft.author_name.as_deref(), Some("Nahab"));

        let denied = service.post_detail(None, 21).await;
        assert!(matches!(denied, Err(DomainError::PostNotFound(21))));

        let missing = service.post_detail(None, 999).await;
        assert!(matches!(missing, Err(DomainError::PostNotFound(999))));
    }
}

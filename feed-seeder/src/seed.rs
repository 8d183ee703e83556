use std::sync::Arc;

use feed_server::data::post_repository::PostRepository;
use feed_server::data::user_repository::UserRepository;
use feed_server::domain::post::NewPost;
use feed_server::domain::user::NewUser;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::corpus;
use crate::retry::{RetryPolicy, with_retry};

pub struct StarterPost {
    pub title: &'static str,
    pub content: &'static str,
    pub published: bool,
}

pub struct StarterUser {
    pub name: &'static str,
    pub email: &'static str,
    pub posts: &'static [StarterPost],
}

/// Fixed demo accounts inserted before the synthesized bulk. Mahmoud keeps
/// an unpublished draft so the visibility rule has something to hide.
pub const STARTER_USERS: &[StarterUser] = &[
    StarterUser {
        name: "Alice",
        email: "alice@example.com",
        posts: &[StarterPost {
            title: "Hello from the new feed",
            content: "First post on the rebuilt blog. Everything older is lost to history.",
            published: true,
        }],
    },
    StarterUser {
        name: "Nilu",
        email: "nilu@example.com",
        posts: &[StarterPost {
            title: "Weekend reading",
            content: "Three long reads on storage engines, and one on why clocks are hard.",
            published: true,
        }],
    },
    StarterUser {
        name: "Mahmoud",
        email: "mahmoud@example.com",
        posts: &[
            StarterPost {
                title: "Office espresso, a field report",
                content: "The machine on the third floor is the good one. Tell no one.",
                published: true,
            },
            StarterPost {
                title: "Draft: notes on indexing",
                content: "Unfinished. Do not publish until the benchmarks are in.",
                published: false,
            },
        ],
    },
];

pub async fn seed_starter_users<U, P>(users: &U, posts: &P) -> anyhow::Result<()>
where
    U: UserRepository,
    P: PostRepository,
{
    for starter in STARTER_USERS {
        let user = users
            .create(NewUser {
                name: Some(starter.name.to_string()),
                email: starter.email.to_string(),
            })
            .await?;

        for post in starter.posts {
            posts
                .create(NewPost {
                    title: post.title.to_string(),
                    content: Some(post.content.to_string()),
                    published: post.published,
                    author_id: Some(user.id),
                })
                .await?;
        }

        info!(user_id = user.id, email = starter.email, "starter user seeded");
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub inserted: u64,
    pub failed: u64,
}

/// Inserts `total` synthesized posts for one author with at most
/// `concurrency` inserts in flight. Each insert retries under the policy;
/// a post that exhausts its attempts is counted and skipped, and a fresh
/// retry attempt synthesizes a fresh post rather than replaying the failed
/// row.
pub async fn synthesize_posts<P>(
    posts: Arc<P>,
    author_id: i64,
    total: u64,
    concurrency: usize,
    policy: RetryPolicy,
) -> anyhow::Result<SeedReport>
where
    P: PostRepository + 'static,
{
    const BULK: u64 = 1_000;

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut report = SeedReport::default();
    let mut sequence = 0u64;

    while sequence < total {
        let bulk = BULK.min(total - sequence);
        let mut handles = Vec::with_capacity(bulk as usize);

        for _ in 0..bulk {
            sequence += 1;
            let permit = Arc::clone(&semaphore).acquire_owned().await?;
            let posts = Arc::clone(&posts);
            let policy = policy.clone();
            let seq = sequence;

            handles.push(tokio::spawn(async move {
                let result = with_retry(&policy, || {
                    let posts = Arc::clone(&posts);
                    let post = corpus::synthesized_post(author_id, seq);
                    async move { posts.create(post).await }
                })
                .await;
                drop(permit);
                result
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => report.inserted += 1,
                Ok(Err(e)) => {
                    warn!("post insert abandoned: {}", e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("insert task panicked: {}", e);
                    report.failed += 1;
                }
            }
        }

        info!(
            inserted = report.inserted,
            failed = report.failed,
            total,
            "seeding progress"
        );
    }

    Ok(report)
}

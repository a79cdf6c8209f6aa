//! Ordered, paginated post feeds.
use std::sync::Arc;

use crate::{Error, Group, Page, Paginator, Post, PostFilter, Result, Store, User};

/// What a feed is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Every post.
    Global,
    /// Posts of the group with this slug.
    Group(&'a str),
    /// Posts of the user with this username.
    Author(&'a str),
    /// Posts of every author the viewer follows.
    Following,
}

/// One page of a feed.
#[derive(Clone, Debug)]
pub struct FeedPage {
    /// Posts on this page, newest first.
    pub posts: Vec<Post>,
    /// Window and navigation metadata.
    pub page: Page,
    /// The resolved group for [`Scope::Group`].
    pub group: Option<Group>,
    /// The resolved author for [`Scope::Author`].
    pub author: Option<User>,
}

/// Builds feed pages on top of a [`Store`].
#[derive(Clone)]
pub struct FeedBuilder {
    store: Arc<dyn Store>,
    paginator: Paginator,
}
impl std::fmt::Debug for FeedBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedBuilder")
            .field("paginator", &self.paginator)
            .finish()
    }
}

impl FeedBuilder {
    /// Create a new `FeedBuilder`.
    pub fn new(store: Arc<dyn Store>, paginator: Paginator) -> Self {
        Self { store, paginator }
    }

    /// Builds the page `page` of the feed `scope` as seen by `viewer`.
    ///
    /// Group and author scopes fail with `NotFound` when the slug or username
    /// does not resolve. The following scope needs a viewer; it is empty when
    /// the viewer follows nobody.
    pub async fn build(
        &self,
        viewer: Option<&User>,
        scope: Scope<'_>,
        page: Option<&str>,
    ) -> Result<FeedPage> {
        let mut group = None;
        let mut author = None;
        let filter = match scope {
            Scope::Global => PostFilter::All,
            Scope::Group(slug) => {
                let found = self.store.group_by_slug(slug).await?;
                let filter = PostFilter::Group(found.id);
                group = Some(found);
                filter
            }
            Scope::Author(username) => {
                let found = self.store.user_by_username(username).await?;
                let filter = PostFilter::Author(found.id);
                author = Some(found);
                filter
            }
            Scope::Following => {
                let Some(viewer) = viewer else {
                    return Err(Error::invalid(
                        "viewer",
                        "the following feed needs an authenticated viewer",
                    ));
                };
                PostFilter::Authors(self.store.followed_authors(viewer.id).await?)
            }
        };
        let count = self.store.count_posts(&filter).await?;
        let page = self.paginator.page(count, page);
        let posts = if page.limit == 0 {
            Vec::new()
        } else {
            self.store.posts(&filter, page.offset, page.limit).await?
        };
        tracing::debug!(?scope, count, page = page.number, "feed built");
        Ok(FeedPage {
            posts,
            page,
            group,
            author,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Follow, MemoryStore, NewGroup, NewPost, NewUser, PostChanges, PostId};

    struct Fixture {
        store: Arc<MemoryStore>,
        feeds: FeedBuilder,
    }

    fn fixture(per_page: usize) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let feeds = FeedBuilder::new(store.clone(), Paginator::new(per_page));
        Fixture { store, feeds }
    }

    impl Fixture {
        async fn user(&self, name: &str) -> User {
            self.store
                .create_user(NewUser {
                    username: name.to_owned(),
                    ..Default::default()
                })
                .await
                .unwrap()
        }
        async fn group(&self, slug: &str) -> Group {
            self.store
                .create_group(NewGroup {
                    title: slug.to_owned(),
                    slug: slug.to_owned(),
                    description: String::new(),
                })
                .await
                .unwrap()
        }
        async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
            self.store
                .create_post(NewPost {
                    author: author.id,
                    text: text.to_owned(),
                    group: group.map(|g| g.id),
                    image: None,
                })
                .await
                .unwrap()
        }
        async fn follow(&self, user: &User, author: &User) {
            self.store
                .insert_follow(Follow {
                    user: user.id,
                    author: author.id,
                })
                .await
                .unwrap();
        }
    }

    fn ids(page: &FeedPage) -> Vec<PostId> {
        page.posts.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_global_feed_contains_every_post() {
        let fx = fixture(10);
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let a = fx.post(&alice, "a", None).await;
        let b = fx.post(&bob, "b", None).await;

        let feed = fx.feeds.build(None, Scope::Global, None).await.unwrap();
        assert_eq!(ids(&feed), vec![b.id, a.id]);
        assert_eq!(feed.page.count, 2);
        assert!(feed.group.is_none());
        assert!(feed.author.is_none());
    }

    #[tokio::test]
    async fn test_group_scope() {
        let fx = fixture(10);
        let alice = fx.user("alice").await;
        let tech = fx.group("tech").await;
        let music = fx.group("music").await;
        let hello = fx.post(&alice, "hello", Some(&tech)).await;
        fx.post(&alice, "loose", None).await;

        let feed = fx
            .feeds
            .build(None, Scope::Group("tech"), None)
            .await
            .unwrap();
        assert_eq!(ids(&feed), vec![hello.id]);
        assert_eq!(feed.group.as_ref().map(|g| g.id), Some(tech.id));

        let empty = fx
            .feeds
            .build(None, Scope::Group("music"), None)
            .await
            .unwrap();
        assert!(empty.posts.is_empty());

        let missing = fx.feeds.build(None, Scope::Group("art"), None).await;
        assert!(missing.unwrap_err().is_not_found());

        fx.store
            .update_post(
                hello.id,
                PostChanges {
                    text: hello.text.clone(),
                    group: Some(music.id),
                    image: None,
                },
            )
            .await
            .unwrap();
        let moved = fx
            .feeds
            .build(None, Scope::Group("music"), None)
            .await
            .unwrap();
        assert_eq!(ids(&moved), vec![hello.id]);
        let left = fx
            .feeds
            .build(None, Scope::Group("tech"), None)
            .await
            .unwrap();
        assert!(left.posts.is_empty());
    }

    #[tokio::test]
    async fn test_author_scope() {
        let fx = fixture(10);
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let mine = fx.post(&alice, "mine", None).await;
        fx.post(&bob, "theirs", None).await;

        let feed = fx
            .feeds
            .build(None, Scope::Author("alice"), None)
            .await
            .unwrap();
        assert_eq!(ids(&feed), vec![mine.id]);
        assert_eq!(feed.author.map(|u| u.id), Some(alice.id));

        let missing = fx.feeds.build(None, Scope::Author("nobody"), None).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_following_is_union_of_followed_authors() {
        let fx = fixture(10);
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let carol = fx.user("carol").await;
        let dave = fx.user("dave").await;
        let a1 = fx.post(&alice, "a1", None).await;
        let b1 = fx.post(&bob, "b1", None).await;
        fx.post(&dave, "d1", None).await;
        let a2 = fx.post(&alice, "a2", None).await;
        fx.follow(&carol, &alice).await;
        fx.follow(&carol, &bob).await;

        let feed = fx
            .feeds
            .build(Some(&carol), Scope::Following, None)
            .await
            .unwrap();
        assert_eq!(ids(&feed), vec![a2.id, b1.id, a1.id]);

        let lonely = fx
            .feeds
            .build(Some(&dave), Scope::Following, None)
            .await
            .unwrap();
        assert!(lonely.posts.is_empty());
        assert_eq!(lonely.page.num_pages, 1);

        assert!(fx.feeds.build(None, Scope::Following, None).await.is_err());
    }

    #[tokio::test]
    async fn test_pages() {
        let fx = fixture(10);
        let alice = fx.user("alice").await;
        let mut created = Vec::new();
        for i in 0..13 {
            created.push(fx.post(&alice, &format!("post {i}"), None).await.id);
        }
        created.reverse();

        let first = fx.feeds.build(None, Scope::Global, None).await.unwrap();
        assert_eq!(ids(&first), created[..10].to_vec());
        let second = fx
            .feeds
            .build(None, Scope::Global, Some("2"))
            .await
            .unwrap();
        assert_eq!(ids(&second), created[10..].to_vec());
        let beyond = fx
            .feeds
            .build(None, Scope::Global, Some("7"))
            .await
            .unwrap();
        assert_eq!(ids(&beyond), ids(&second));
        assert_eq!(beyond.page.number, 2);
    }
}

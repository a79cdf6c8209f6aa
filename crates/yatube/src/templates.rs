//! Typed page templates.
//!
//! Every page gets a [`Layout`] with the current year and the viewer's login
//! state. Feed pages embed a pre-rendered [`PostListTemplate`] so the index
//! can cache it without caching the per-viewer chrome around it.
use askama::Template;
use chrono::{Datelike, Utc};
use yatube_core::{Comment, Group, Page, Post, User};

use crate::forms::FieldErrors;

/// Chrome shared by every page.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    /// Current year for the footer.
    pub year: i32,
    /// Whether somebody is logged in.
    pub is_authenticated: bool,
    /// Username of the viewer, empty for guests.
    pub username: String,
}
impl Layout {
    /// Chrome for `viewer`.
    #[must_use]
    pub fn new(viewer: Option<&User>) -> Self {
        Self {
            year: Utc::now().year(),
            is_authenticated: viewer.is_some(),
            username: viewer.map(|u| u.username.clone()).unwrap_or_default(),
        }
    }
}

/// A post as feeds and the post page show it.
#[derive(Clone, Debug)]
pub struct PostCard {
    /// Post id.
    pub id: u64,
    /// Body text.
    pub text: String,
    /// Author username.
    pub author: String,
    /// Author full name or username.
    pub author_name: String,
    /// Group title, empty without a group.
    pub group_title: String,
    /// Group slug, empty without a group.
    pub group_slug: String,
    /// Formatted creation date.
    pub pub_date: String,
    /// Image url, empty without an image.
    pub image_url: String,
}
impl From<&Post> for PostCard {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.0,
            text: post.text.clone(),
            author: post.author.username.clone(),
            author_name: post.author.display_name(),
            group_title: post.group.as_ref().map(|g| g.title.clone()).unwrap_or_default(),
            group_slug: post.group.as_ref().map(|g| g.slug.clone()).unwrap_or_default(),
            pub_date: post.pub_date.format("%d.%m.%Y %H:%M").to_string(),
            image_url: post
                .image
                .as_ref()
                .map(|image| format!("/media/{image}"))
                .unwrap_or_default(),
        }
    }
}

/// A comment under a post.
#[derive(Clone, Debug)]
pub struct CommentCard {
    /// Author username.
    pub author: String,
    /// Body text.
    pub text: String,
    /// Formatted creation date.
    pub created: String,
}
impl From<&Comment> for CommentCard {
    fn from(comment: &Comment) -> Self {
        Self {
            author: comment.author.username.clone(),
            text: comment.text.clone(),
            created: comment.created.format("%d.%m.%Y %H:%M").to_string(),
        }
    }
}

/// Paginator links.
#[derive(Clone, Copy, Debug)]
pub struct PageNav {
    /// Current page.
    pub number: usize,
    /// Total pages.
    pub num_pages: usize,
    /// Whether to show the links at all.
    pub has_other_pages: bool,
    /// Whether a previous page exists.
    pub has_previous: bool,
    /// Whether a next page exists.
    pub has_next: bool,
    /// Previous page number, zero when there is none.
    pub previous: usize,
    /// Next page number, zero when there is none.
    pub next: usize,
}
impl From<Page> for PageNav {
    fn from(page: Page) -> Self {
        Self {
            number: page.number,
            num_pages: page.num_pages,
            has_other_pages: page.has_other_pages(),
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            previous: page.previous_number().unwrap_or_default(),
            next: page.next_number().unwrap_or_default(),
        }
    }
}

/// One entry of the group select.
#[derive(Clone, Debug)]
pub struct GroupOption {
    /// Group id.
    pub id: u64,
    /// Group title.
    pub title: String,
    /// Whether the entry is preselected.
    pub selected: bool,
}
impl GroupOption {
    /// Options for `groups` with `selected` preselected.
    #[must_use]
    pub fn list(groups: &[Group], selected: Option<u64>) -> Vec<Self> {
        groups
            .iter()
            .map(|group| Self {
                id: group.id.0,
                title: group.title.clone(),
                selected: Some(group.id.0) == selected,
            })
            .collect()
    }
}

/// Author block of the profile and post pages.
#[derive(Clone, Debug)]
pub struct AuthorCard {
    /// Username.
    pub username: String,
    /// Full name or username.
    pub name: String,
    /// Number of posts the author wrote.
    pub posts_count: usize,
    /// Whether the viewer follows the author.
    pub following: bool,
    /// Whether the viewer may follow or unfollow the author.
    pub can_follow: bool,
}

/// The post list with its paginator.
#[derive(Template, Debug)]
#[template(path = "includes/post_list.html")]
pub struct PostListTemplate {
    /// Posts on the page.
    pub posts: Vec<PostCard>,
    /// Paginator links.
    pub page: PageNav,
}
impl PostListTemplate {
    /// A post list for the posts of one feed page.
    #[must_use]
    pub fn new(posts: &[Post], page: Page) -> Self {
        Self {
            posts: posts.iter().map(PostCard::from).collect(),
            page: page.into(),
        }
    }
}

/// `/`
#[derive(Template, Debug)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Chrome.
    pub layout: Layout,
    /// Rendered post list.
    pub post_list: String,
}

/// `/follow/`
#[derive(Template, Debug)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    /// Chrome.
    pub layout: Layout,
    /// Rendered post list.
    pub post_list: String,
}

/// `/group/<slug>/`
#[derive(Template, Debug)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    /// Chrome.
    pub layout: Layout,
    /// The group.
    pub group: Group,
    /// Rendered post list.
    pub post_list: String,
}

/// `/<username>/`
#[derive(Template, Debug)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    /// Chrome.
    pub layout: Layout,
    /// The author.
    pub author: AuthorCard,
    /// Rendered post list.
    pub post_list: String,
}

/// `/<username>/<post_id>/`
#[derive(Template, Debug)]
#[template(path = "post.html")]
pub struct PostTemplate {
    /// Chrome.
    pub layout: Layout,
    /// The author.
    pub author: AuthorCard,
    /// The post.
    pub post: PostCard,
    /// Comments, newest first.
    pub comments: Vec<CommentCard>,
}

/// `/new/` and `/<username>/<post_id>/edit/`
#[derive(Template, Debug)]
#[template(path = "post-form.html")]
pub struct PostFormTemplate {
    /// Chrome.
    pub layout: Layout,
    /// Whether an existing post is edited.
    pub is_edit: bool,
    /// Form action url.
    pub action: String,
    /// Current text.
    pub text: String,
    /// Groups to choose from.
    pub groups: Vec<GroupOption>,
    /// Validation messages.
    pub errors: FieldErrors,
}

/// `/auth/signup/`
#[derive(Template, Debug)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    /// Chrome.
    pub layout: Layout,
    /// Submitted first name.
    pub first_name: String,
    /// Submitted last name.
    pub last_name: String,
    /// Submitted username.
    pub username: String,
    /// Validation messages.
    pub errors: FieldErrors,
}

/// `/auth/login/`
#[derive(Template, Debug)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    /// Chrome.
    pub layout: Layout,
    /// Submitted username.
    pub username: String,
    /// Where to go after logging in.
    pub next: String,
    /// Validation messages.
    pub errors: FieldErrors,
}

/// `/about/author/`
#[derive(Template, Debug)]
#[template(path = "about/author.html")]
pub struct AboutAuthorTemplate {
    /// Chrome.
    pub layout: Layout,
}

/// `/about/tech/`
#[derive(Template, Debug)]
#[template(path = "about/tech.html")]
pub struct AboutTechTemplate {
    /// Chrome.
    pub layout: Layout,
}

/// The 404 page.
#[derive(Template, Debug)]
#[template(path = "misc/404.html")]
pub struct NotFoundTemplate {
    /// Chrome.
    pub layout: Layout,
    /// Path that did not resolve.
    pub path: String,
}

/// The 500 page.
#[derive(Template, Debug)]
#[template(path = "misc/500.html")]
pub struct ServerErrorTemplate {
    /// Chrome.
    pub layout: Layout,
}

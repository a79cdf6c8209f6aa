//! Feeds, the post page and post editing.
use std::path::PathBuf;

use askama::Template;
use salvo::prelude::*;
use yatube_core::{
    NewComment, NewPost, Post, PostChanges, PostFilter, PostId, Scope, User,
};

use super::{found, param, render};
use crate::auth::DepotViewerExt;
use crate::forms::{CommentForm, FieldErrors, PostForm, ValidPost, validate_image};
use crate::media;
use crate::state::AppState;
use crate::templates::{
    AuthorCard, CommentCard, FollowTemplate, GroupOption, GroupTemplate, IndexTemplate, Layout,
    PostCard, PostFormTemplate, PostListTemplate, PostTemplate, ProfileTemplate,
};
use crate::{AppError, AppResult};

fn page_query(req: &Request) -> Option<String> {
    req.query::<String>("page")
}

/// Url of a post page.
pub(crate) fn post_url(username: &str, id: PostId) -> String {
    format!("/{username}/{id}/")
}

/// The author block for `author` as seen by `viewer`.
pub(crate) async fn author_card(
    state: &AppState,
    viewer: Option<&User>,
    author: &User,
    posts_count: usize,
) -> AppResult<AuthorCard> {
    Ok(AuthorCard {
        username: author.username.clone(),
        name: author.display_name(),
        posts_count,
        following: state.follows.is_following(viewer, author).await?,
        can_follow: viewer.is_some_and(|v| v.id != author.id),
    })
}

/// `GET /`: the global feed. The post list is cached per `page` value.
#[handler]
pub async fn index(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let page = page_query(req);
    let post_list = state
        .index_cache
        .get_or_render(page.clone().unwrap_or_default(), async {
            let feed = state.feeds.build(None, Scope::Global, page.as_deref()).await?;
            Ok::<_, AppError>(PostListTemplate::new(&feed.posts, feed.page).render()?)
        })
        .await?;
    render(
        res,
        &IndexTemplate {
            layout: Layout::new(depot.viewer()),
            post_list: post_list.to_string(),
        },
    )
}

/// `GET /group/<slug>/`
#[handler]
pub async fn group_posts(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let viewer = depot.viewer();
    let page = page_query(req);
    let feed = state
        .feeds
        .build(viewer, Scope::Group(param(req, "slug")?), page.as_deref())
        .await?;
    let group = feed
        .group
        .clone()
        .ok_or_else(|| yatube_core::Error::not_found("group"))?;
    render(
        res,
        &GroupTemplate {
            layout: Layout::new(viewer),
            group,
            post_list: PostListTemplate::new(&feed.posts, feed.page).render()?,
        },
    )
}

/// `GET /<username>/`
#[handler]
pub async fn profile(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let viewer = depot.viewer();
    let page = page_query(req);
    let feed = state
        .feeds
        .build(viewer, Scope::Author(param(req, "username")?), page.as_deref())
        .await?;
    let author = feed
        .author
        .as_ref()
        .ok_or_else(|| yatube_core::Error::not_found("author"))?;
    render(
        res,
        &ProfileTemplate {
            layout: Layout::new(viewer),
            author: author_card(&state, viewer, author, feed.page.count).await?,
            post_list: PostListTemplate::new(&feed.posts, feed.page).render()?,
        },
    )
}

/// `GET /follow/`: posts of every author the viewer follows.
#[handler]
pub async fn follow_index(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let viewer = depot.viewer();
    let page = page_query(req);
    let feed = state
        .feeds
        .build(viewer, Scope::Following, page.as_deref())
        .await?;
    render(
        res,
        &FollowTemplate {
            layout: Layout::new(viewer),
            post_list: PostListTemplate::new(&feed.posts, feed.page).render()?,
        },
    )
}

/// Loads the post `post_id` written by `username`, `NotFound` otherwise.
async fn load_post(state: &AppState, req: &Request) -> AppResult<Post> {
    let username = param(req, "username")?;
    let id = param(req, "post_id")?
        .parse::<u64>()
        .map_err(|_| yatube_core::Error::not_found("post"))?;
    let post = state.store.post(PostId(id)).await?;
    if post.author.username != username {
        return Err(yatube_core::Error::not_found(format!("post {id} of {username}")).into());
    }
    Ok(post)
}

/// `GET /<username>/<post_id>/`
#[handler]
pub async fn post_view(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let viewer = depot.viewer();
    let post = load_post(&state, req).await?;
    let posts_count = state
        .store
        .count_posts(&PostFilter::Author(post.author.id))
        .await?;
    let comments = state.store.comments(post.id).await?;
    render(
        res,
        &PostTemplate {
            layout: Layout::new(viewer),
            author: author_card(&state, viewer, &post.author, posts_count).await?,
            post: PostCard::from(&post),
            comments: comments.iter().map(CommentCard::from).collect(),
        },
    )
}

struct PostSubmission {
    form: PostForm,
    image: Option<Upload>,
}

struct Upload {
    name: String,
    content_type: Option<String>,
    path: PathBuf,
}

/// Reads the post form fields and the optional image from a multipart or
/// urlencoded body.
async fn read_post_form(req: &mut Request) -> PostSubmission {
    let form = req.parse_form::<PostForm>().await.unwrap_or_default();
    let image = match req.file("image").await {
        Some(file) if file.size() > 0 => Some(Upload {
            name: file.name().unwrap_or("image").to_owned(),
            content_type: file.content_type().map(|m| m.essence_str().to_owned()),
            path: file.path().clone(),
        }),
        _ => None,
    };
    PostSubmission { form, image }
}

/// Validates a submission and stores its image.
async fn accept_post(
    state: &AppState,
    submission: &PostSubmission,
) -> AppResult<Result<(ValidPost, Option<String>), FieldErrors>> {
    let groups = state.store.groups().await?;
    let mut errors = FieldErrors::default();
    let valid = match submission.form.validate(&groups) {
        Ok(valid) => Some(valid),
        Err(e) => {
            errors = e;
            None
        }
    };
    if let Some(upload) = &submission.image
        && let Err(e) = validate_image(upload.content_type.as_deref())
    {
        errors.add("image", e.get("image"));
    }
    let Some(valid) = valid.filter(|_| errors.is_empty()) else {
        return Ok(Err(errors));
    };
    let image = match &submission.image {
        Some(upload) => {
            Some(media::store_image(&state.config.media.root, &upload.name, &upload.path).await?)
        }
        None => None,
    };
    Ok(Ok((valid, image)))
}

async fn post_form_page(
    state: &AppState,
    viewer: Option<&User>,
    action: String,
    is_edit: bool,
    form: &PostForm,
    errors: FieldErrors,
) -> AppResult<PostFormTemplate> {
    let groups = state.store.groups().await?;
    Ok(PostFormTemplate {
        layout: Layout::new(viewer),
        is_edit,
        action,
        text: form.text.clone(),
        groups: GroupOption::list(&groups, form.group.parse().ok()),
        errors,
    })
}

/// `GET /new/`
#[handler]
pub async fn new_post_form(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let page = post_form_page(
        &state,
        depot.viewer(),
        "/new/".to_owned(),
        false,
        &PostForm::default(),
        FieldErrors::default(),
    )
    .await?;
    render(res, &page)
}

/// `POST /new/`: creates a post and redirects to the index.
#[handler]
pub async fn new_post(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let Some(viewer) = depot.viewer() else {
        return Err(yatube_core::Error::not_found("viewer").into());
    };
    let submission = read_post_form(req).await;
    match accept_post(&state, &submission).await? {
        Ok((valid, image)) => {
            let post = state
                .store
                .create_post(NewPost {
                    author: viewer.id,
                    text: valid.text,
                    group: valid.group,
                    image,
                })
                .await?;
            tracing::info!(id = %post.id, author = %viewer.username, "post created");
            res.render(found("/")?);
            Ok(())
        }
        Err(errors) => {
            let page = post_form_page(
                &state,
                Some(viewer),
                "/new/".to_owned(),
                false,
                &submission.form,
                errors,
            )
            .await?;
            render(res, &page)
        }
    }
}

/// Loads the post for editing. Returns `None` after redirecting viewers
/// who are not the author to the post page.
async fn editable_post(
    state: &AppState,
    req: &Request,
    viewer: &User,
    res: &mut Response,
) -> AppResult<Option<Post>> {
    let username = param(req, "username")?;
    if viewer.username != username {
        let id = param(req, "post_id")?;
        res.render(found(format!("/{username}/{id}/"))?);
        return Ok(None);
    }
    load_post(state, req).await.map(Some)
}

/// `GET /<username>/<post_id>/edit/`
#[handler]
pub async fn edit_post_form(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let Some(viewer) = depot.viewer() else {
        return Err(yatube_core::Error::not_found("viewer").into());
    };
    let Some(post) = editable_post(&state, req, viewer, res).await? else {
        return Ok(());
    };
    let form = PostForm {
        text: post.text.clone(),
        group: post.group.as_ref().map(|g| g.id.to_string()).unwrap_or_default(),
    };
    let page = post_form_page(
        &state,
        Some(viewer),
        format!("{}edit/", post_url(&post.author.username, post.id)),
        true,
        &form,
        FieldErrors::default(),
    )
    .await?;
    render(res, &page)
}

/// `POST /<username>/<post_id>/edit/`: saves the post and redirects to it.
#[handler]
pub async fn edit_post(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let Some(viewer) = depot.viewer() else {
        return Err(yatube_core::Error::not_found("viewer").into());
    };
    let Some(post) = editable_post(&state, req, viewer, res).await? else {
        return Ok(());
    };
    let submission = read_post_form(req).await;
    match accept_post(&state, &submission).await? {
        Ok((valid, image)) => {
            state
                .store
                .update_post(
                    post.id,
                    PostChanges {
                        text: valid.text,
                        group: valid.group,
                        image,
                    },
                )
                .await?;
            tracing::info!(id = %post.id, "post edited");
            res.render(found(post_url(&post.author.username, post.id))?);
            Ok(())
        }
        Err(errors) => {
            let page = post_form_page(
                &state,
                Some(viewer),
                format!("{}edit/", post_url(&post.author.username, post.id)),
                true,
                &submission.form,
                errors,
            )
            .await?;
            render(res, &page)
        }
    }
}

/// `POST /<username>/<post_id>/comment/`: adds a comment when the text is
/// not blank, then redirects to the post either way.
#[handler]
pub async fn add_comment(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let Some(viewer) = depot.viewer() else {
        return Err(yatube_core::Error::not_found("viewer").into());
    };
    let post = load_post(&state, req).await?;
    let form = req.parse_form::<CommentForm>().await.unwrap_or_default();
    if let Some(text) = form.valid_text() {
        state
            .store
            .create_comment(NewComment {
                post: post.id,
                author: viewer.id,
                text: text.to_owned(),
            })
            .await?;
        tracing::debug!(post = %post.id, author = %viewer.username, "comment added");
    }
    res.render(found(post_url(&post.author.username, post.id))?);
    Ok(())
}

/// `GET /<username>/<post_id>/comment/`: comments are only posted, so this
/// sends the viewer to the post.
#[handler]
pub async fn comment_redirect(req: &mut Request, res: &mut Response) -> AppResult<()> {
    let username = param(req, "username")?;
    let id = param(req, "post_id")?;
    res.render(found(format!("/{username}/{id}/"))?);
    Ok(())
}

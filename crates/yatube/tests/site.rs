use salvo::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use salvo::prelude::*;
use salvo::test::{ResponseExt, TestClient};
use tempfile::TempDir;
use yatube::{AppState, Config, router};
use yatube_core::{NewGroup, NewPost, Post, PostFilter, User};

const PASSWORD: &str = "secret-pass";

struct Site {
    state: AppState,
    service: Service,
    media: TempDir,
}

fn site() -> Site {
    let media = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.auth.session_secret = "s".repeat(64);
    config.auth.hash_memory_kib = 64;
    config.auth.hash_iterations = 1;
    config.feed.index_cache_ttl_secs = 600;
    config.media.root = media.path().to_owned();
    let state = AppState::new(config).unwrap();
    let service = router::service(state.clone()).unwrap();
    Site {
        state,
        service,
        media,
    }
}

fn url(path: &str) -> String {
    format!("http://127.0.0.1:5800{path}")
}

fn location(res: &Response) -> &str {
    res.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

impl Site {
    async fn user(&self, username: &str) -> User {
        self.state
            .store
            .create_user(yatube_core::NewUser {
                username: username.to_owned(),
                password_hash: self.state.passwords.hash(PASSWORD).unwrap(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    async fn group(&self, slug: &str) -> yatube_core::Group {
        self.state
            .store
            .create_group(NewGroup {
                title: slug.to_uppercase(),
                slug: slug.to_owned(),
                description: format!("All about {slug}"),
            })
            .await
            .unwrap()
    }

    async fn post(&self, author: &User, text: &str) -> Post {
        self.state
            .store
            .create_post(NewPost {
                author: author.id,
                text: text.to_owned(),
                group: None,
                image: None,
            })
            .await
            .unwrap()
    }

    async fn latest_post(&self) -> Post {
        self.state
            .store
            .posts(&PostFilter::All, 0, 1)
            .await
            .unwrap()
            .remove(0)
    }

    async fn post_count(&self) -> usize {
        self.state.store.count_posts(&PostFilter::All).await.unwrap()
    }

    /// Logs in through the form and returns the session cookie to replay.
    async fn login(&self, username: &str) -> String {
        let res = TestClient::post(url("/auth/login/"))
            .raw_form(format!("username={username}&password={PASSWORD}"))
            .send(&self.service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::FOUND));
        session_cookie(&res)
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut req = TestClient::get(url(path));
        if let Some(cookie) = cookie {
            req = req.add_header(COOKIE, cookie, true);
        }
        req.send(&self.service).await
    }

    async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> Response {
        let mut req = TestClient::post(url(path)).raw_form(form.to_owned());
        if let Some(cookie) = cookie {
            req = req.add_header(COOKIE, cookie, true);
        }
        req.send(&self.service).await
    }

    async fn page(&self, path: &str, cookie: Option<&str>) -> String {
        let mut res = self.get(path, cookie).await;
        assert_eq!(res.status_code, Some(StatusCode::OK), "GET {path}");
        res.take_string().await.unwrap()
    }
}

fn session_cookie(res: &Response) -> String {
    let header = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    header.split(';').next().unwrap().to_owned()
}

fn articles(body: &str) -> usize {
    body.matches("<article").count()
}

#[tokio::test]
async fn test_guest_redirects_to_login() {
    let site = site();
    let alice = site.user("alice").await;
    let post = site.post(&alice, "hello").await;

    for path in [
        "/new/".to_owned(),
        "/follow/".to_owned(),
        format!("/alice/{}/edit/", post.id),
        format!("/alice/{}/comment/", post.id),
        "/alice/follow/".to_owned(),
        "/alice/unfollow/".to_owned(),
    ] {
        let res = site.get(&path, None).await;
        assert_eq!(res.status_code, Some(StatusCode::FOUND), "GET {path}");
        let expected: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
        assert_eq!(location(&res), format!("/auth/login/?next={expected}"));
    }
    let res = site.post_form("/new/", "text=sneaky", None).await;
    assert_eq!(location(&res), "/auth/login/?next=%2Fnew%2F");
    assert_eq!(site.post_count().await, 1);
}

#[tokio::test]
async fn test_public_pages() {
    let site = site();
    let alice = site.user("alice").await;
    site.group("tech").await;
    let post = site.post(&alice, "hello").await;

    for path in [
        "/".to_owned(),
        "/group/tech/".to_owned(),
        "/alice/".to_owned(),
        format!("/alice/{}/", post.id),
        "/auth/signup/".to_owned(),
        "/auth/login/".to_owned(),
        "/about/author/".to_owned(),
        "/about/tech/".to_owned(),
    ] {
        let body = site.page(&path, None).await;
        assert!(body.contains("Log in"), "GET {path}");
    }
}

#[tokio::test]
async fn test_not_found_pages() {
    let site = site();
    let alice = site.user("alice").await;
    let post = site.post(&alice, "hello").await;
    site.user("bob").await;

    for path in [
        "/no/such/page/here/".to_owned(),
        "/nobody/".to_owned(),
        "/group/missing/".to_owned(),
        "/alice/999999/".to_owned(),
        format!("/bob/{}/", post.id),
    ] {
        let mut res = site.get(&path, None).await;
        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND), "GET {path}");
        let body = res.take_string().await.unwrap();
        assert!(body.contains(&format!("<code>{path}</code>")), "GET {path}");
    }
}

#[tokio::test]
async fn test_group_feed_scenario() {
    let site = site();
    site.user("alice").await;
    let tech = site.group("tech").await;
    let cookie = site.login("alice").await;

    let res = site
        .post_form("/new/", &format!("text=hello&group={}", tech.id), Some(cookie.as_str()))
        .await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/");

    let body = site.page("/group/tech/", None).await;
    assert_eq!(articles(&body), 1);
    assert!(body.contains("hello"));
    assert!(body.contains("All about tech"));

    let res = site.get("/group/music/", None).await;
    assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    site.group("music").await;
    let body = site.page("/group/music/", None).await;
    assert_eq!(articles(&body), 0);
    assert!(body.contains("No posts yet."));
}

#[tokio::test]
async fn test_following_feed_scenario() {
    let site = site();
    let alice = site.user("alice").await;
    site.user("bob").await;
    site.user("carol").await;
    site.post(&alice, "alice writes").await;
    let bob = site.login("bob").await;
    let carol = site.login("carol").await;

    let res = site.get("/alice/follow/?next=/alice/", Some(bob.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/alice/");

    let body = site.page("/follow/", Some(bob.as_str())).await;
    assert_eq!(articles(&body), 1);
    assert!(body.contains("alice writes"));

    let body = site.page("/follow/", Some(carol.as_str())).await;
    assert_eq!(articles(&body), 0);
    assert!(body.contains("No posts yet."));
}

#[tokio::test]
async fn test_follow_and_unfollow() {
    let site = site();
    let alice = site.user("alice").await;
    let bob = site.user("bob").await;
    let cookie = site.login("bob").await;

    for _ in 0..2 {
        let res = site.get("/alice/follow/", Some(cookie.as_str())).await;
        assert_eq!(location(&res), "/alice/");
    }
    assert_eq!(site.state.store.followed_authors(bob.id).await.unwrap(), vec![alice.id]);

    let body = site.page("/alice/", Some(cookie.as_str())).await;
    assert!(body.contains(r#"class="unfollow""#));

    let res = site.get("/bob/follow/", Some(cookie.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(site.state.store.followed_authors(bob.id).await.unwrap(), vec![alice.id]);

    let res = site
        .get("/alice/unfollow/?next=https://example.com/", Some(cookie.as_str()))
        .await;
    assert_eq!(location(&res), "/alice/");
    assert!(site.state.store.followed_authors(bob.id).await.unwrap().is_empty());

    let res = site.get("/alice/unfollow/", Some(cookie.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

    let res = site.get("/nobody/follow/", Some(cookie.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_unusable_next_falls_back() {
    let site = site();
    let alice = site.user("alice").await;
    let bob = site.user("bob").await;

    let res = site
        .post_form(
            "/auth/login/",
            "username=bob&password=secret-pass&next=%2Fa%20b%2F",
            None,
        )
        .await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/");
    let cookie = session_cookie(&res);

    let res = site
        .get("/alice/follow/?next=%2Fa%20b%2F", Some(cookie.as_str()))
        .await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/alice/");
    assert_eq!(site.state.store.followed_authors(bob.id).await.unwrap(), vec![alice.id]);

    let res = site
        .get("/alice/unfollow/?next=%2Fa%20b%2F", Some(cookie.as_str()))
        .await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/alice/");
    assert!(site.state.store.followed_authors(bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_index_is_cached_until_cleared() {
    let site = site();
    let alice = site.user("alice").await;
    site.post(&alice, "first post").await;

    let before = site.page("/", None).await;
    site.post(&alice, "second post").await;
    let cached = site.page("/", None).await;
    assert_eq!(before, cached);
    assert!(!cached.contains("second post"));

    let paged = site.page("/?page=1", None).await;
    assert!(paged.contains("second post"));

    site.state.index_cache.clear();
    let fresh = site.page("/", None).await;
    assert!(fresh.contains("second post"));
    assert_eq!(articles(&fresh), 2);
}

#[tokio::test]
async fn test_pagination() {
    let site = site();
    let alice = site.user("alice").await;
    for i in 0..13 {
        site.post(&alice, &format!("post number {i}")).await;
    }

    let body = site.page("/alice/", None).await;
    assert_eq!(articles(&body), 10);
    assert!(body.contains("Page 1 of 2"));
    assert!(body.contains("post number 12"));

    let body = site.page("/alice/?page=2", None).await;
    assert_eq!(articles(&body), 3);
    assert!(body.contains("post number 0"));

    let body = site.page("/alice/?page=99", None).await;
    assert_eq!(articles(&body), 3);

    let body = site.page("/alice/?page=abc", None).await;
    assert_eq!(articles(&body), 10);
    assert!(body.contains(r#"<span class="posts-count">13</span>"#));
}

#[tokio::test]
async fn test_edit_post() {
    let site = site();
    let alice = site.user("alice").await;
    site.user("bob").await;
    let tech = site.group("tech").await;
    let post = site
        .state
        .store
        .create_post(NewPost {
            author: alice.id,
            text: "original".to_owned(),
            group: Some(tech.id),
            image: None,
        })
        .await
        .unwrap();
    let edit = format!("/alice/{}/edit/", post.id);
    let view = format!("/alice/{}/", post.id);

    let bob = site.login("bob").await;
    let res = site.get(&edit, Some(bob.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), view);
    let res = site.post_form(&edit, "text=hijacked", Some(bob.as_str())).await;
    assert_eq!(location(&res), view);

    let alice_cookie = site.login("alice").await;
    let body = site.page(&edit, Some(alice_cookie.as_str())).await;
    assert!(body.contains("original"));
    assert!(body.contains(" selected>TECH"));

    let res = site.post_form(&edit, "text=changed&group=", Some(alice_cookie.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), view);

    assert_eq!(site.post_count().await, 1);
    let edited = site.state.store.post(post.id).await.unwrap();
    assert_eq!(edited.text, "changed");
    assert_eq!(edited.group, None);
    assert_eq!(edited.author.id, alice.id);
    let body = site.page("/group/tech/", None).await;
    assert_eq!(articles(&body), 0);
}

#[tokio::test]
async fn test_new_post_validation() {
    let site = site();
    site.user("alice").await;
    let cookie = site.login("alice").await;

    let body = site.page("/new/", Some(cookie.as_str())).await;
    assert!(body.contains("New post"));

    let mut res = site.post_form("/new/", "text=+&group=42", Some(cookie.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let body = res.take_string().await.unwrap();
    assert!(body.contains("This field is required."));
    assert!(body.contains("Select a valid choice."));
    assert_eq!(site.post_count().await, 0);
}

#[tokio::test]
async fn test_new_post_with_image() {
    let site = site();
    let alice = site.user("alice").await;
    let tech = site.group("tech").await;
    let cookie = site.login("alice").await;

    let gif: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff!\xf9\x04\x00\x00\x00\x00\x00,\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0c\n\x00;";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nwith image\r\n\
             --XBOUNDARY\r\nContent-Disposition: form-data; name=\"group\"\r\n\r\n{}\r\n\
             --XBOUNDARY\r\nContent-Disposition: form-data; name=\"image\"; filename=\"small.gif\"\r\n\
             Content-Type: image/gif\r\n\r\n",
            tech.id
        )
        .as_bytes(),
    );
    body.extend_from_slice(gif);
    body.extend_from_slice(b"\r\n--XBOUNDARY--\r\n");

    let res = TestClient::post(url("/new/"))
        .add_header(CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY", true)
        .add_header(COOKIE, cookie.as_str(), true)
        .bytes(body)
        .send(&site.service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/");

    let post = site.latest_post().await;
    assert_eq!(post.text, "with image");
    assert_eq!(post.author.id, alice.id);
    assert_eq!(post.group.map(|g| g.id), Some(tech.id));
    assert_eq!(post.image.as_deref(), Some("posts/small.gif"));
    assert_eq!(
        std::fs::read(site.media.path().join("posts/small.gif")).unwrap(),
        gif
    );

    let page = site.page(&format!("/alice/{}/", post.id), None).await;
    assert!(page.contains(r#"src="/media/posts/small.gif""#));
    let mut res = site.get("/media/posts/small.gif", None).await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    assert_eq!(res.take_bytes(None).await.unwrap().as_ref(), gif);
}

#[tokio::test]
async fn test_comments() {
    let site = site();
    let alice = site.user("alice").await;
    site.user("bob").await;
    let post = site.post(&alice, "hello").await;
    let comment = format!("/alice/{}/comment/", post.id);
    let view = format!("/alice/{}/", post.id);
    let bob = site.login("bob").await;

    let res = site.post_form(&comment, "text=nice+post", Some(bob.as_str())).await;
    assert_eq!(location(&res), view);
    let res = site.post_form(&comment, "text=", Some(bob.as_str())).await;
    assert_eq!(location(&res), view);
    let res = site.get(&comment, Some(bob.as_str())).await;
    assert_eq!(location(&res), view);

    let comments = site.state.store.comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "nice post");

    let body = site.page(&view, None).await;
    assert!(body.contains("nice post"));
    assert!(!body.contains("<textarea"));
    let body = site.page(&view, Some(bob.as_str())).await;
    assert!(body.contains("<textarea"));
    assert!(!body.contains("post-edit"));
}

#[tokio::test]
async fn test_signup_login_logout() {
    let site = site();

    let res = site
        .post_form(
            "/auth/signup/",
            "first_name=Alice&username=alice&password1=secret-pass&password2=secret-pass",
            None,
        )
        .await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/");
    let alice = site.state.store.user_by_username("alice").await.unwrap();
    assert_eq!(alice.first_name, "Alice");
    assert_ne!(alice.password_hash, PASSWORD);

    let mut res = site
        .post_form(
            "/auth/signup/",
            "username=alice&password1=secret-pass&password2=secret-pass",
            None,
        )
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    assert!(
        res.take_string()
            .await
            .unwrap()
            .contains("A user with that username already exists.")
    );

    let mut res = site
        .post_form("/auth/login/", "username=alice&password=wrong-pass", None)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    assert!(res.take_string().await.unwrap().contains("Please enter a correct username"));

    let res = site
        .post_form(
            "/auth/login/",
            "username=alice&password=secret-pass&next=%2Ffollow%2F",
            None,
        )
        .await;
    assert_eq!(location(&res), "/follow/");
    let cookie = session_cookie(&res);
    let body = site.page("/follow/", Some(cookie.as_str())).await;
    assert!(body.contains("Log out"));

    let res = site
        .post_form(
            "/auth/login/",
            "username=alice&password=secret-pass&next=%2F%2Fexample.com%2F",
            None,
        )
        .await;
    assert_eq!(location(&res), "/");

    let res = site.get("/auth/logout/", Some(cookie.as_str())).await;
    assert_eq!(location(&res), "/");
    let cookie = session_cookie(&res);
    let res = site.get("/follow/", Some(cookie.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
}

#[tokio::test]
async fn test_stale_session_is_a_guest() {
    let site = site();
    let alice = site.user("alice").await;
    let cookie = site.login("alice").await;
    site.state.store.delete_user(alice.id).await.unwrap();

    let res = site.get("/new/", Some(cookie.as_str())).await;
    assert_eq!(res.status_code, Some(StatusCode::FOUND));
    assert_eq!(location(&res), "/auth/login/?next=%2Fnew%2F");
}

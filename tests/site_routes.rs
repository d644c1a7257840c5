//! End-to-end tests of the HTTP surface.
//!
//! Each test builds the real router over in-memory backends and drives it
//! with `tower::ServiceExt::oneshot`, one request at a time. Cookies are
//! carried by hand: log in, keep the session cookie, send it back.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use simple_bistro::{
    auth::hash_password,
    config::SiteConfig,
    media::MemoryMedia,
    store::{Collection, MemoryStore},
    web::{AppState, forms::format_edit_token, router},
};
use std::sync::Arc;
use tower::ServiceExt;

const EMAIL: &str = "chef@bistro.test";
const PASSWORD: &str = "jollof-rice";
const BOUNDARY: &str = "----bistro-test-boundary";

struct Site {
    app: Router,
    state: AppState,
    store: Arc<MemoryStore>,
    media: Arc<MemoryMedia>,
}

fn site() -> Site {
    let mut config = SiteConfig::default();
    config.admin.email = EMAIL.to_string();
    config.admin.password_sha256 = hash_password(PASSWORD);
    config.media.max_upload_bytes = 4096;

    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(MemoryMedia::new("restaurant"));
    let state = AppState::new(&config, store.clone(), media.clone());
    Site {
        app: router(state.clone()),
        state,
        store,
        media,
    }
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 13]);
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
    bytes
}

/// A multipart body with text fields and an optional `image` file part.
fn multipart(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    let (file_name, bytes): (&str, &[u8]) = image.unwrap_or(("", &[]));
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = session {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, session: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = session {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_multipart(uri: &str, session: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, session)
        .body(Body::from(body))
        .unwrap()
}

async fn send(site: &Site, request: Request<Body>) -> Response {
    site.app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Log in and return the `Cookie` header value carrying the session.
async fn login(site: &Site) -> String {
    let response = send(
        site,
        post_form(
            "/login",
            None,
            &format!("email={EMAIL}&password={PASSWORD}&next=%2Fadmin"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("bistro_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("login sets a session cookie")
}

fn dish_fields<'a>(name: &'a str, category: &'a str, price: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("name", name),
        ("category", category),
        ("price", price),
        ("description", "Spiced beef skewers"),
        ("order_link", ""),
        ("order", ""),
    ]
}

// =========================================================================
// Public pages
// =========================================================================

#[tokio::test]
async fn public_pages_render_on_empty_store() {
    let site = site();
    for uri in ["/", "/menu", "/blog"] {
        let response = send(&site, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn blog_search_without_matches() {
    let site = site();
    let response = send(&site, get("/blog?q=pizza", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No posts found."));
}

#[tokio::test]
async fn missing_post_is_a_not_found_page() {
    let site = site();
    let response = send(&site, get("/blog/does-not-exist", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Not found"));
    assert!(body.contains(r#"href="/blog""#));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let site = site();
    let response = send(&site, get("/wine-list", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_fall_back_to_empty_state_when_reads_fail() {
    let site = site();
    site.store.set_fail_reads(true);

    let menu = send(&site, get("/menu", None)).await;
    assert_eq!(menu.status(), StatusCode::OK);
    assert!(body_text(menu).await.contains("No dishes in this category."));

    let blog = send(&site, get("/blog", None)).await;
    assert_eq!(blog.status(), StatusCode::OK);
    assert!(body_text(blog).await.contains("No posts found."));

    let home = send(&site, get("/", None)).await;
    assert_eq!(home.status(), StatusCode::OK);

    let detail = send(&site, get("/blog/abc123", None)).await;
    assert_eq!(detail.status(), StatusCode::BAD_GATEWAY);
}

// =========================================================================
// Auth gate
// =========================================================================

#[tokio::test]
async fn admin_redirects_to_login_with_next() {
    let site = site();
    let response = send(&site, get("/admin/dishes/new", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadmin%2Fdishes%2Fnew");
}

#[tokio::test]
async fn gated_post_redirects_to_dashboard_login() {
    let site = site();
    let response = send(&site, post_form("/admin/categories", None, "name=Soups")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadmin");
    assert_eq!(site.store.len(Collection::Categories).await, 0);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let site = site();
    let response = send(
        &site,
        post_form("/login", None, &format!("email={EMAIL}&password=nope")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = body_text(response).await;
    assert!(body.contains("Email or password is incorrect."));
    assert!(body.contains(EMAIL));
}

#[tokio::test]
async fn login_follows_next() {
    let site = site();
    let response = send(
        &site,
        post_form(
            "/login",
            None,
            &format!("email={EMAIL}&password={PASSWORD}&next=%2Fadmin%2Fposts%2Fnew"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/posts/new");
}

#[tokio::test]
async fn logout_revokes_session() {
    let site = site();
    let session = login(&site).await;
    assert_eq!(
        send(&site, get("/admin", Some(&session))).await.status(),
        StatusCode::OK
    );

    let response = send(&site, post_form("/logout", Some(&session), "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = send(&site, get("/admin", Some(&session))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// =========================================================================
// Dish CRUD
// =========================================================================

#[tokio::test]
async fn create_dish_then_filter_menu() {
    let site = site();
    let session = login(&site).await;

    let body = multipart(
        &dish_fields("Suya Platter", "Grills", "12.50"),
        Some(("suya.png", &png_bytes())),
    );
    let response = send(&site, post_multipart("/admin/dishes", &session, body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin");

    let dishes = site.state.content.list_dishes().await.unwrap();
    assert_eq!(dishes.len(), 1);
    assert_eq!(dishes[0].image_url.as_deref(), Some("memory://restaurant/1-suya.png"));

    let menu = body_text(send(&site, get("/menu?category=Grills", None)).await).await;
    assert!(menu.contains("Suya Platter"));

    let soups = body_text(send(&site, get("/menu?category=Soups", None)).await).await;
    assert!(!soups.contains("Suya Platter"));
    assert!(soups.contains("No dishes in this category."));
}

#[tokio::test]
async fn invalid_price_keeps_the_form() {
    let site = site();
    let session = login(&site).await;

    let body = multipart(
        &dish_fields("Pepper Soup", "Soups", "twelve"),
        Some(("soup.png", &png_bytes())),
    );
    let response = send(&site, post_multipart("/admin/dishes", &session, body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let page = body_text(response).await;
    assert!(page.contains(r#"value="Pepper Soup""#));
    assert!(page.contains(r#"value="twelve""#));
    assert_eq!(site.store.len(Collection::Dishes).await, 0);
    assert!(site.media.uploaded().await.is_empty());
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let site = site();
    let session = login(&site).await;

    let body = multipart(
        &dish_fields("Chapman", "Drinks", "4"),
        Some(("menu.png", b"definitely not a png")),
    );
    let response = send(&site, post_multipart("/admin/dishes", &session, body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(site.media.uploaded().await.is_empty());
}

#[tokio::test]
async fn upload_failure_keeps_the_form() {
    let site = site();
    let session = login(&site).await;
    site.media.set_fail_uploads(true);

    let body = multipart(
        &dish_fields("Suya Platter", "Grills", "12.50"),
        Some(("suya.png", &png_bytes())),
    );
    let response = send(&site, post_multipart("/admin/dishes", &session, body)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains(r#"value="Suya Platter""#));
    assert_eq!(site.store.len(Collection::Dishes).await, 0);
}

#[tokio::test]
async fn failed_write_discards_the_upload() {
    let site = site();
    let session = login(&site).await;
    site.store.set_fail_writes(true);

    let body = multipart(
        &dish_fields("Suya Platter", "Grills", "12.50"),
        Some(("suya.png", &png_bytes())),
    );
    let response = send(&site, post_multipart("/admin/dishes", &session, body)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(site.media.uploaded().await.len(), 1);
    assert_eq!(site.media.discarded().await, site.media.uploaded().await);
}

#[tokio::test]
async fn edit_without_new_image_keeps_image_url() {
    let site = site();
    let session = login(&site).await;

    let body = multipart(
        &dish_fields("Suya Platter", "Grills", "12.50"),
        Some(("suya.png", &png_bytes())),
    );
    send(&site, post_multipart("/admin/dishes", &session, body)).await;
    let created = site.state.content.list_dishes().await.unwrap().remove(0);

    let edit = send(
        &site,
        get(&format!("/admin/dishes/{}/edit", created.id), Some(&session)),
    )
    .await;
    assert_eq!(edit.status(), StatusCode::OK);

    let token = format_edit_token(created.updated_at);
    let mut fields = dish_fields("Suya Platter", "Grills", "14");
    fields.push(("edit_token", &token));
    let response = send(
        &site,
        post_multipart(
            &format!("/admin/dishes/{}", created.id),
            &session,
            multipart(&fields, None),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let updated = site.state.content.get_dish(&created.id).await.unwrap().unwrap();
    assert_eq!(updated.price, "14");
    assert_eq!(updated.image_url, created.image_url);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn stale_edit_token_is_a_conflict() {
    let site = site();
    let session = login(&site).await;

    let body = multipart(&dish_fields("Suya Platter", "Grills", "12.50"), None);
    send(&site, post_multipart("/admin/dishes", &session, body)).await;
    let created = site.state.content.list_dishes().await.unwrap().remove(0);

    let stale = format_edit_token(created.updated_at - chrono::Duration::minutes(1));
    let mut fields = dish_fields("Suya Deluxe", "Grills", "20");
    fields.push(("edit_token", &stale));
    let response = send(
        &site,
        post_multipart(
            &format!("/admin/dishes/{}", created.id),
            &session,
            multipart(&fields, None),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_text(response).await.contains(r#"value="Suya Deluxe""#));

    let stored = site.state.content.get_dish(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Suya Platter");
}

#[tokio::test]
async fn editing_missing_dish_is_not_found() {
    let site = site();
    let session = login(&site).await;
    let response = send(&site, get("/admin/dishes/ghost/edit", Some(&session))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_dish_twice() {
    let site = site();
    let session = login(&site).await;

    let body = multipart(&dish_fields("Suya Platter", "Grills", "12.50"), None);
    send(&site, post_multipart("/admin/dishes", &session, body)).await;
    let id = site.state.content.list_dishes().await.unwrap().remove(0).id;
    let uri = format!("/admin/dishes/{id}/delete");

    let confirm = send(&site, get(&uri, Some(&session))).await;
    assert_eq!(confirm.status(), StatusCode::OK);
    assert!(body_text(confirm).await.contains("Suya Platter"));

    for _ in 0..2 {
        let response = send(&site, post_form(&uri, Some(&session), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
    }
    assert_eq!(site.store.len(Collection::Dishes).await, 0);

    let menu = body_text(send(&site, get("/menu", None)).await).await;
    assert!(!menu.contains("Suya Platter"));
}

// =========================================================================
// Posts and categories
// =========================================================================

#[tokio::test]
async fn create_post_and_read_it() {
    let site = site();
    let session = login(&site).await;

    let fields = [
        ("title", "Suya Night Special!!"),
        ("author", "Chef Ada"),
        ("content", "Fire up the **grill**."),
    ];
    let response = send(
        &site,
        post_multipart("/admin/posts", &session, multipart(&fields, None)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let post = site.state.content.list_posts().await.unwrap().remove(0);
    assert_eq!(post.slug, "suya-night-special");

    let page = body_text(send(&site, get(&format!("/blog/{}", post.id), None)).await).await;
    assert!(page.contains("<strong>grill</strong>"));

    let search = body_text(send(&site, get("/blog?q=night", None)).await).await;
    assert!(search.contains("Suya Night Special!!"));
}

#[tokio::test]
async fn blank_post_title_is_rejected() {
    let site = site();
    let session = login(&site).await;
    let fields = [("title", "  "), ("author", "Chef Ada"), ("content", "Body")];
    let response = send(
        &site,
        post_multipart("/admin/posts", &session, multipart(&fields, None)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(site.store.len(Collection::Posts).await, 0);
}

#[tokio::test]
async fn categories_show_up_as_menu_tabs() {
    let site = site();
    let session = login(&site).await;
    for _ in 0..2 {
        let response = send(
            &site,
            post_form("/admin/categories", Some(&session), "name=Soups"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    assert_eq!(site.store.len(Collection::Categories).await, 2);

    let menu = body_text(send(&site, get("/menu", None)).await).await;
    assert_eq!(menu.matches(r#"href="/menu?category=Soups""#).count(), 1);
}

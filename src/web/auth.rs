//! Login, logout, and the gate in front of `/admin`.

use super::AppState;
use super::flash::{Flash, set_flash, take_flash};
use super::views;
use axum::{
    Form,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use tracing::{info, warn};

pub const SESSION_COOKIE: &str = "bistro_session";
const DEFAULT_LANDING: &str = "/admin";

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn has_session(state: &AppState, cookies: &Cookies) -> bool {
    match cookies.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.is_valid(cookie.value()).await,
        None => false,
    }
}

/// Only same-site absolute paths are followed after login. Browsers drop
/// tabs and newlines from URLs, so control characters are refused too.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => DEFAULT_LANDING,
    }
}

fn login_redirect(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/login?next={encoded}")
}

/// Middleware: pass through with a live session, otherwise send the browser
/// to the login page. GET requests remember where they were headed.
pub async fn require_admin(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request,
    next: Next,
) -> Response {
    if has_session(&state, &cookies).await {
        return next.run(request).await;
    }
    let target = if request.method() == Method::GET {
        request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(DEFAULT_LANDING)
    } else {
        DEFAULT_LANDING
    };
    info!(path = %request.uri().path(), "unauthenticated admin request");
    Redirect::to(&login_redirect(target)).into_response()
}

#[derive(Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

pub async fn login_page(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if has_session(&state, &cookies).await {
        return Redirect::to(next).into_response();
    }
    let flash = take_flash(&cookies);
    let error = (!state.credentials.login_enabled())
        .then_some("Admin login is disabled until a password hash is configured.");
    Html(views::login_page(&state.site, flash.as_ref(), "", next, error).into_string())
        .into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    next: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref());
    if !state.credentials.verify(&form.email, &form.password) {
        warn!(email = %form.email, "failed admin login");
        let page = views::login_page(
            &state.site,
            None,
            &form.email,
            next,
            Some("Email or password is incorrect."),
        );
        return (StatusCode::UNAUTHORIZED, Html(page.into_string())).into_response();
    }

    let token = state.sessions.create().await;
    cookies.add(session_cookie(token));
    set_flash(&cookies, &Flash::success("Welcome back."));
    info!(email = %form.email, "admin logged in");
    Redirect::to(next).into_response()
}

pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value()).await;
    }
    cookies.remove(session_cookie(String::new()));
    set_flash(&cookies, &Flash::success("You have been logged out."));
    info!("admin logged out");
    Redirect::to("/")
}

//! Read-only pages for visitors.
//!
//! Listing pages never fail outright: if the store cannot be read, the
//! failure is logged and the page renders its empty state.

use super::AppState;
use super::flash::take_flash;
use super::views;
use crate::listing;
use crate::store::StoreError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::error;

/// Posts shown on the home page.
const LATEST_POSTS: usize = 3;
/// Popular dishes shown on the home page.
const POPULAR_DISHES: usize = 6;

fn or_empty<T>(result: Result<Vec<T>, StoreError>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|err| {
        error!(error = %err, "could not load {what}");
        Vec::new()
    })
}

pub async fn home(State(state): State<AppState>, cookies: Cookies) -> Html<String> {
    let flash = take_flash(&cookies);
    let dishes = or_empty(state.content.list_dishes().await, "dishes");
    let mut posts = or_empty(state.content.list_posts().await, "posts");
    posts.truncate(LATEST_POSTS);

    let popular: Vec<_> = listing::popular_dishes(&dishes)
        .into_iter()
        .take(POPULAR_DISHES)
        .collect();
    Html(views::home_page(&state.site, flash.as_ref(), &popular, &posts).into_string())
}

#[derive(Deserialize)]
pub struct MenuQuery {
    #[serde(default)]
    category: String,
}

pub async fn menu(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<MenuQuery>,
) -> Html<String> {
    let flash = take_flash(&cookies);
    let dishes = or_empty(state.content.list_dishes().await, "dishes");
    let categories = or_empty(state.content.list_categories().await, "categories");

    let choices = listing::category_choices(&categories, &dishes);
    let shown = listing::filter_dishes(&dishes, &query.category);
    Html(
        views::menu_page(&state.site, flash.as_ref(), &choices, &query.category, &shown)
            .into_string(),
    )
}

#[derive(Deserialize)]
pub struct BlogQuery {
    #[serde(default)]
    q: String,
}

pub async fn blog(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<BlogQuery>,
) -> Html<String> {
    let flash = take_flash(&cookies);
    let posts = or_empty(state.content.list_posts().await, "posts");
    let shown = listing::filter_posts(&posts, &query.q);
    Html(views::blog_page(&state.site, flash.as_ref(), &query.q, &shown).into_string())
}

pub async fn post_detail(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<String>,
) -> Response {
    match state.content.get_post(&id).await {
        Ok(Some(post)) => {
            let flash = take_flash(&cookies);
            Html(views::post_page(&state.site, flash.as_ref(), &post).into_string()).into_response()
        }
        Ok(None) => {
            let page = views::not_found_page(&state.site, "post", "/blog", "Back to the blog");
            (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
        }
        Err(err) => {
            error!(%id, error = %err, "could not load post");
            let page = views::error_page(
                &state.site,
                "Something went wrong",
                "This post could not be loaded right now. Please try again shortly.",
            );
            (StatusCode::BAD_GATEWAY, Html(page.into_string())).into_response()
        }
    }
}

pub async fn not_found(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    let page = views::not_found_page(&state.site, "page", "/", "Back to the home page");
    (StatusCode::NOT_FOUND, Html(page.into_string()))
}

//! Admin dashboard and the post, dish, and category forms.
//!
//! A successful save redirects to the dashboard with a flash message. A
//! failed save re-renders the form with everything the admin typed and a
//! banner explaining what went wrong:
//!
//! | Failure | Status |
//! |---------|--------|
//! | validation (fields or image) | 422 |
//! | stale edit token | 409 |
//! | media host or store rejected the request | 502 |
//! | record deleted meanwhile | 404 not-found page |

use super::AppState;
use super::error::AppError;
use super::flash::{Flash, set_flash, take_flash};
use super::forms::{FormFields, format_edit_token};
use super::views::{self, FormContext};
use crate::content::SaveError;
use crate::listing;
use crate::store::StoreError;
use crate::types::{DishDraft, PostDraft};
use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use maud::Markup;
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::{error, warn};

const DASHBOARD: &str = "/admin";

fn save_status(err: &SaveError) -> StatusCode {
    match err {
        SaveError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SaveError::Conflict(_) => StatusCode::CONFLICT,
        SaveError::NotFound { .. } => StatusCode::NOT_FOUND,
        SaveError::Upload(_) | SaveError::Write(_) => StatusCode::BAD_GATEWAY,
    }
}

fn page(status: StatusCode, markup: Markup) -> Response {
    (status, Html(markup.into_string())).into_response()
}

fn not_found(state: &AppState, what: &str) -> Response {
    page(
        StatusCode::NOT_FOUND,
        views::not_found_page(&state.site, what, DASHBOARD, "Back to the dashboard"),
    )
}

fn done(cookies: &Cookies, flash: Flash) -> Response {
    set_flash(cookies, &flash);
    Redirect::to(DASHBOARD).into_response()
}

/// Names for the category picker on dish forms.
async fn category_choices(state: &AppState) -> Vec<String> {
    let (categories, dishes) = tokio::join!(
        state.content.list_categories(),
        state.content.list_dishes()
    );
    let categories = categories.unwrap_or_else(|err| {
        warn!(error = %err, "could not load categories for dish form");
        Vec::new()
    });
    let dishes = dishes.unwrap_or_default();
    listing::category_choices(&categories, &dishes)
}

// ============================================================================
// Dashboard
// ============================================================================

fn loaded<T>(result: Result<Vec<T>, StoreError>, failed: &mut bool) -> Vec<T> {
    result.unwrap_or_else(|err| {
        error!(error = %err, "dashboard could not load content");
        *failed = true;
        Vec::new()
    })
}

pub async fn dashboard(State(state): State<AppState>, cookies: Cookies) -> Html<String> {
    let flash = take_flash(&cookies);
    let (posts, dishes, categories) = tokio::join!(
        state.content.list_posts(),
        state.content.list_dishes(),
        state.content.list_categories()
    );

    let mut failed = false;
    let posts = loaded(posts, &mut failed);
    let dishes = loaded(dishes, &mut failed);
    let categories = loaded(categories, &mut failed);

    let choices = listing::category_choices(&categories, &[]);
    let error = failed.then_some("Some content could not be loaded from the store.");
    Html(
        views::dashboard_page(
            &state.site,
            flash.as_ref(),
            error,
            &posts,
            &dishes,
            &choices,
        )
        .into_string(),
    )
}

// ============================================================================
// Posts
// ============================================================================

pub async fn new_post(State(state): State<AppState>) -> Html<String> {
    let form = FormContext {
        heading: "New post",
        action: "/admin/posts".to_string(),
        current_image: None,
        edit_token: None,
        error: None,
    };
    Html(views::post_form_page(&state.site, &form, &PostDraft::default()).into_string())
}

pub async fn create_post(
    State(state): State<AppState>,
    cookies: Cookies,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let fields = FormFields::read(multipart).await?;
    let draft = fields.post_draft();

    match state.content.create_post(&draft, fields.image.as_ref()).await {
        Ok(post) => Ok(done(
            &cookies,
            Flash::success(format!("Post “{}” published.", post.title)),
        )),
        Err(err) => {
            warn!(error = %err, "post not created");
            let form = FormContext {
                heading: "New post",
                action: "/admin/posts".to_string(),
                current_image: None,
                edit_token: None,
                error: Some(err.to_string()),
            };
            Ok(page(
                save_status(&err),
                views::post_form_page(&state.site, &form, &draft),
            ))
        }
    }
}

pub async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(post) = state.content.get_post(&id).await? else {
        return Ok(not_found(&state, "post"));
    };
    let form = FormContext {
        heading: "Edit post",
        action: format!("/admin/posts/{id}"),
        current_image: post.image.as_deref(),
        edit_token: Some(format_edit_token(post.updated_at)),
        error: None,
    };
    Ok(page(
        StatusCode::OK,
        views::post_form_page(&state.site, &form, &PostDraft::from(&post)),
    ))
}

pub async fn update_post(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let fields = FormFields::read(multipart).await?;
    let token = fields.edit_token()?;
    let draft = fields.post_draft();

    let err = match state
        .content
        .update_post(&id, &draft, fields.image.as_ref(), token)
        .await
    {
        Ok(post) => {
            return Ok(done(
                &cookies,
                Flash::success(format!("Post “{}” updated.", post.title)),
            ));
        }
        Err(SaveError::NotFound { .. }) => return Ok(not_found(&state, "post")),
        Err(err) => err,
    };

    warn!(%id, error = %err, "post not updated");
    let current = state.content.get_post(&id).await.ok().flatten();
    // After a conflict the form moves to the latest token so a deliberate
    // resubmit goes through.
    let edit_token = match (&err, &current) {
        (SaveError::Conflict(_), Some(post)) => Some(format_edit_token(post.updated_at)),
        _ => fields.raw_edit_token(),
    };
    let form = FormContext {
        heading: "Edit post",
        action: format!("/admin/posts/{id}"),
        current_image: current.as_ref().and_then(|p| p.image.as_deref()),
        edit_token,
        error: Some(err.to_string()),
    };
    Ok(page(
        save_status(&err),
        views::post_form_page(&state.site, &form, &draft),
    ))
}

pub async fn confirm_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(post) = state.content.get_post(&id).await? else {
        return Ok(not_found(&state, "post"));
    };
    let action = format!("/admin/posts/{id}/delete");
    Ok(page(
        StatusCode::OK,
        views::confirm_delete_page(&state.site, "post", &post.title, &action),
    ))
}

pub async fn delete_post(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<String>,
) -> Response {
    match state.content.delete_post(&id).await {
        Ok(()) => done(&cookies, Flash::success("Post deleted.")),
        Err(err) => {
            error!(%id, error = %err, "post not deleted");
            done(&cookies, Flash::error(format!("Could not delete post: {err}")))
        }
    }
}

// ============================================================================
// Dishes
// ============================================================================

pub async fn new_dish(State(state): State<AppState>) -> Html<String> {
    let choices = category_choices(&state).await;
    let form = FormContext {
        heading: "New dish",
        action: "/admin/dishes".to_string(),
        current_image: None,
        edit_token: None,
        error: None,
    };
    Html(views::dish_form_page(&state.site, &form, &DishDraft::default(), &choices).into_string())
}

pub async fn create_dish(
    State(state): State<AppState>,
    cookies: Cookies,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let fields = FormFields::read(multipart).await?;
    let draft = fields.dish_draft();

    match state.content.create_dish(&draft, fields.image.as_ref()).await {
        Ok(dish) => Ok(done(
            &cookies,
            Flash::success(format!("Dish “{}” added to the menu.", dish.name)),
        )),
        Err(err) => {
            warn!(error = %err, "dish not created");
            let choices = category_choices(&state).await;
            let form = FormContext {
                heading: "New dish",
                action: "/admin/dishes".to_string(),
                current_image: None,
                edit_token: None,
                error: Some(err.to_string()),
            };
            Ok(page(
                save_status(&err),
                views::dish_form_page(&state.site, &form, &draft, &choices),
            ))
        }
    }
}

pub async fn edit_dish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(dish) = state.content.get_dish(&id).await? else {
        return Ok(not_found(&state, "dish"));
    };
    let choices = category_choices(&state).await;
    let form = FormContext {
        heading: "Edit dish",
        action: format!("/admin/dishes/{id}"),
        current_image: dish.image_url.as_deref(),
        edit_token: Some(format_edit_token(dish.updated_at)),
        error: None,
    };
    Ok(page(
        StatusCode::OK,
        views::dish_form_page(&state.site, &form, &DishDraft::from(&dish), &choices),
    ))
}

pub async fn update_dish(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let fields = FormFields::read(multipart).await?;
    let token = fields.edit_token()?;
    let draft = fields.dish_draft();

    let err = match state
        .content
        .update_dish(&id, &draft, fields.image.as_ref(), token)
        .await
    {
        Ok(dish) => {
            return Ok(done(
                &cookies,
                Flash::success(format!("Dish “{}” updated.", dish.name)),
            ));
        }
        Err(SaveError::NotFound { .. }) => return Ok(not_found(&state, "dish")),
        Err(err) => err,
    };

    warn!(%id, error = %err, "dish not updated");
    let current = state.content.get_dish(&id).await.ok().flatten();
    let edit_token = match (&err, &current) {
        (SaveError::Conflict(_), Some(dish)) => Some(format_edit_token(dish.updated_at)),
        _ => fields.raw_edit_token(),
    };
    let choices = category_choices(&state).await;
    let form = FormContext {
        heading: "Edit dish",
        action: format!("/admin/dishes/{id}"),
        current_image: current.as_ref().and_then(|d| d.image_url.as_deref()),
        edit_token,
        error: Some(err.to_string()),
    };
    Ok(page(
        save_status(&err),
        views::dish_form_page(&state.site, &form, &draft, &choices),
    ))
}

pub async fn confirm_delete_dish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(dish) = state.content.get_dish(&id).await? else {
        return Ok(not_found(&state, "dish"));
    };
    let action = format!("/admin/dishes/{id}/delete");
    Ok(page(
        StatusCode::OK,
        views::confirm_delete_page(&state.site, "dish", &dish.name, &action),
    ))
}

pub async fn delete_dish(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<String>,
) -> Response {
    match state.content.delete_dish(&id).await {
        Ok(()) => done(&cookies, Flash::success("Dish deleted.")),
        Err(err) => {
            error!(%id, error = %err, "dish not deleted");
            done(&cookies, Flash::error(format!("Could not delete dish: {err}")))
        }
    }
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Deserialize)]
pub struct CategoryForm {
    name: String,
}

pub async fn add_category(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<CategoryForm>,
) -> Response {
    match state.content.add_category(&form.name).await {
        Ok(category) => done(
            &cookies,
            Flash::success(format!("Category “{}” added.", category.name)),
        ),
        Err(err) => {
            warn!(error = %err, "category not added");
            done(&cookies, Flash::error(format!("Could not add category: {err}")))
        }
    }
}

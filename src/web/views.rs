//! Server-rendered pages.
//!
//! Every page is a [maud](https://maud.lambda.xyz/) template: interpolated
//! values are escaped, and the only raw HTML that reaches the browser is
//! Markdown rendered from post bodies (with any embedded HTML escaped).
//!
//! ## Layout
//!
//! ```text
//! base_document
//! └── body
//!     ├── site_header      name, tagline, nav
//!     ├── flash_banner     one-shot notification, if any
//!     └── main             page content
//! ```
//!
//! The stylesheet is compiled into the binary and inlined into every page.

use crate::config::SiteInfo;
use crate::listing::ALL_CATEGORIES;
use crate::types::{Dish, DishDraft, Post, PostDraft};
use crate::web::flash::Flash;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Event, Parser, TagEnd, html as md_html};

const CSS: &str = include_str!("../../static/style.css");

/// Characters of post body shown on listing cards.
const EXCERPT_CHARS: usize = 180;

// ============================================================================
// HTML Components
// ============================================================================

/// Which top-level section a page belongs to, for nav highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Menu,
    Blog,
    Admin,
}

fn base_document(title: &str, site: &SiteInfo, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · " (site.name) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(site: &SiteInfo, current: Section) -> Markup {
    let links = [
        (Section::Home, "/", "Home"),
        (Section::Menu, "/menu", "Menu"),
        (Section::Blog, "/blog", "Blog"),
        (Section::Admin, "/admin", "Admin"),
    ];
    html! {
        header.site-header {
            div.brand {
                a href="/" { (site.name) }
                @if !site.tagline.is_empty() {
                    span.tagline { (site.tagline) }
                }
            }
            nav.site-nav {
                ul {
                    @for (section, href, label) in links {
                        li class=[(section == current).then_some("current")] {
                            a href=(href) { (label) }
                        }
                    }
                }
            }
        }
    }
}

fn flash_banner(flash: Option<&Flash>) -> Markup {
    html! {
        @if let Some(flash) = flash {
            div class=(flash.kind.css_class()) role="status" { (flash.message) }
        }
    }
}

fn error_banner(error: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = error {
            div.flash.flash-error role="alert" { (message) }
        }
    }
}

fn layout(
    site: &SiteInfo,
    title: &str,
    current: Section,
    flash: Option<&Flash>,
    content: Markup,
) -> Markup {
    let body = html! {
        (site_header(site, current))
        (flash_banner(flash))
        main { (content) }
        footer.site-footer { "© " (site.name) }
    };
    base_document(title, site, body)
}

/// Markdown to HTML. Raw HTML in the source is shown as text.
pub fn render_markdown(source: &str) -> Markup {
    let parser = Parser::new(source).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, parser);
    PreEscaped(body_html)
}

/// The readable text of a Markdown document, without markup. Block ends
/// and line breaks become spaces.
pub fn markdown_text(source: &str) -> String {
    let mut text = String::new();
    for event in Parser::new(source) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => text.push(' '),
            _ => {}
        }
    }
    text
}

/// First `max_chars` characters of `text`, cut on a word boundary when one
/// is near, with an ellipsis if anything was dropped.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(space) if space > max_chars / 2 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end())
}

pub fn format_price(currency: &str, price: &str) -> String {
    format!("{currency}{price}")
}

fn dish_card(site: &SiteInfo, dish: &Dish) -> Markup {
    html! {
        article.dish-card {
            @if let Some(url) = &dish.image_url {
                img src=(url) alt=(dish.name) loading="lazy";
            }
            div.dish-body {
                h3 {
                    (dish.name)
                    @if dish.popular { " " span.badge { "Popular" } }
                }
                p.price { (format_price(&site.currency, &dish.price)) }
                @if !dish.description.is_empty() {
                    p.description { (dish.description) }
                }
                @if let Some(link) = &dish.order_link {
                    a.order-link href=(link) target="_blank" rel="noopener" { "Order" }
                }
            }
        }
    }
}

fn post_card(post: &Post) -> Markup {
    html! {
        article.post-card {
            @if let Some(url) = &post.image {
                img src=(url) alt=(post.title) loading="lazy";
            }
            h3 { a href={ "/blog/" (post.id) } { (post.title) } }
            p.byline { (byline(post)) }
            p { (excerpt(&markdown_text(&post.content), EXCERPT_CHARS)) }
        }
    }
}

fn byline(post: &Post) -> String {
    let date = post.created_at.format("%B %-d, %Y");
    if post.author.is_empty() {
        date.to_string()
    } else {
        format!("{} · {date}", post.author)
    }
}

// ============================================================================
// Public pages
// ============================================================================

pub fn home_page(
    site: &SiteInfo,
    flash: Option<&Flash>,
    popular: &[&Dish],
    latest: &[Post],
) -> Markup {
    let content = html! {
        section.hero {
            h1 { (site.name) }
            p { (site.tagline) }
            a.button href="/menu" { "See the menu" }
        }
        @if !popular.is_empty() {
            section {
                h2 { "Popular dishes" }
                div.card-grid {
                    @for dish in popular { (dish_card(site, dish)) }
                }
            }
        }
        @if !latest.is_empty() {
            section {
                h2 { "From the blog" }
                div.card-grid {
                    @for post in latest { (post_card(post)) }
                }
            }
        }
    };
    layout(site, "Home", Section::Home, flash, content)
}

pub fn menu_page(
    site: &SiteInfo,
    flash: Option<&Flash>,
    choices: &[String],
    selected: &str,
    dishes: &[&Dish],
) -> Markup {
    let selected = if selected.trim().is_empty() {
        ALL_CATEGORIES
    } else {
        selected
    };
    let tabs = std::iter::once(ALL_CATEGORIES).chain(choices.iter().map(String::as_str));
    let content = html! {
        h1 { "Menu" }
        nav.category-tabs {
            @for tab in tabs {
                a class=[(tab == selected).then_some("current")]
                    href={ "/menu?category=" (url_component(tab)) } { (tab) }
            }
        }
        @if dishes.is_empty() {
            p.empty-state { "No dishes in this category." }
        } @else {
            div.card-grid {
                @for dish in dishes { (dish_card(site, dish)) }
            }
        }
    };
    layout(site, "Menu", Section::Menu, flash, content)
}

pub fn blog_page(site: &SiteInfo, flash: Option<&Flash>, query: &str, posts: &[&Post]) -> Markup {
    let content = html! {
        h1 { "Blog" }
        form.search method="get" action="/blog" {
            input type="search" name="q" value=(query) placeholder="Search posts";
            button type="submit" { "Search" }
        }
        @if posts.is_empty() {
            p.empty-state { "No posts found." }
        } @else {
            div.card-grid {
                @for post in posts { (post_card(post)) }
            }
        }
    };
    layout(site, "Blog", Section::Blog, flash, content)
}

pub fn post_page(site: &SiteInfo, flash: Option<&Flash>, post: &Post) -> Markup {
    let content = html! {
        article.post {
            p { a href="/blog" { "← All posts" } }
            h1 { (post.title) }
            p.byline { (byline(post)) }
            @if let Some(url) = &post.image {
                img.cover src=(url) alt=(post.title);
            }
            div.post-body { (render_markdown(&post.content)) }
        }
    };
    layout(site, &post.title, Section::Blog, flash, content)
}

pub fn not_found_page(site: &SiteInfo, what: &str, back_href: &str, back_label: &str) -> Markup {
    let content = html! {
        section.not-found {
            h1 { "Not found" }
            p { "We couldn't find that " (what) ". It may have been removed." }
            a.button href=(back_href) { (back_label) }
        }
    };
    let section = match back_href {
        "/menu" => Section::Menu,
        "/blog" => Section::Blog,
        href if href.starts_with("/admin") => Section::Admin,
        _ => Section::Home,
    };
    layout(site, "Not found", section, None, content)
}

/// Page shown when the store or media host fails outside a form.
pub fn error_page(site: &SiteInfo, heading: &str, detail: &str) -> Markup {
    let content = html! {
        section.not-found {
            h1 { (heading) }
            p { (detail) }
            a.button href="/" { "Back to the home page" }
        }
    };
    layout(site, heading, Section::Home, None, content)
}

// ============================================================================
// Auth pages
// ============================================================================

pub fn login_page(
    site: &SiteInfo,
    flash: Option<&Flash>,
    email: &str,
    next: &str,
    error: Option<&str>,
) -> Markup {
    let content = html! {
        section.form-page {
            h1 { "Admin login" }
            (error_banner(error))
            form method="post" action="/login" {
                input type="hidden" name="next" value=(next);
                label { "Email" input type="email" name="email" value=(email) required; }
                label { "Password" input type="password" name="password" required; }
                button type="submit" { "Log in" }
            }
        }
    };
    layout(site, "Login", Section::Admin, flash, content)
}

// ============================================================================
// Admin pages
// ============================================================================

fn admin_bar() -> Markup {
    html! {
        div.admin-bar {
            a href="/admin" { "Dashboard" }
            a href="/admin/posts/new" { "New post" }
            a href="/admin/dishes/new" { "New dish" }
            form.inline method="post" action="/logout" {
                button.link type="submit" { "Log out" }
            }
        }
    }
}

pub fn dashboard_page(
    site: &SiteInfo,
    flash: Option<&Flash>,
    error: Option<&str>,
    posts: &[Post],
    dishes: &[Dish],
    categories: &[String],
) -> Markup {
    let content = html! {
        (admin_bar())
        h1 { "Dashboard" }
        (error_banner(error))
        section {
            h2 { "Dishes (" (dishes.len()) ")" }
            @if dishes.is_empty() {
                p.empty-state { "No dishes yet." }
            } @else {
                table.admin-table {
                    thead { tr { th { "Name" } th { "Category" } th { "Price" } th {} } }
                    tbody {
                        @for dish in dishes {
                            tr {
                                td { (dish.name) @if dish.popular { " ★" } }
                                td { (dish.category) }
                                td { (format_price(&site.currency, &dish.price)) }
                                td.actions {
                                    a href={ "/admin/dishes/" (dish.id) "/edit" } { "Edit" }
                                    a href={ "/admin/dishes/" (dish.id) "/delete" } { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }
        section {
            h2 { "Posts (" (posts.len()) ")" }
            @if posts.is_empty() {
                p.empty-state { "No posts yet." }
            } @else {
                table.admin-table {
                    thead { tr { th { "Title" } th { "Author" } th { "Created" } th {} } }
                    tbody {
                        @for post in posts {
                            tr {
                                td { (post.title) }
                                td { (post.author) }
                                td { (post.created_at.format("%Y-%m-%d")) }
                                td.actions {
                                    a href={ "/admin/posts/" (post.id) "/edit" } { "Edit" }
                                    a href={ "/admin/posts/" (post.id) "/delete" } { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }
        section {
            h2 { "Categories" }
            @if !categories.is_empty() {
                ul.category-list {
                    @for name in categories { li { (name) } }
                }
            }
            form.inline method="post" action="/admin/categories" {
                input type="text" name="name" placeholder="New category" required;
                button type="submit" { "Add category" }
            }
        }
    };
    layout(site, "Dashboard", Section::Admin, flash, content)
}

/// Everything a post or dish form needs besides the draft itself.
pub struct FormContext<'a> {
    /// Page heading, e.g. "New dish".
    pub heading: &'a str,
    /// Where the form posts to.
    pub action: String,
    /// Image currently stored on the record, shown as a preview.
    pub current_image: Option<&'a str>,
    /// `updated_at` of the record being edited, as RFC 3339.
    pub edit_token: Option<String>,
    pub error: Option<String>,
}

fn form_frame(form: &FormContext<'_>, fields: Markup) -> Markup {
    html! {
        (admin_bar())
        section.form-page {
            h1 { (form.heading) }
            (error_banner(form.error.as_deref()))
            form method="post" action=(form.action) enctype="multipart/form-data" {
                @if let Some(token) = &form.edit_token {
                    input type="hidden" name="edit_token" value=(token);
                }
                (fields)
                label {
                    "Image"
                    @if let Some(url) = form.current_image {
                        img.preview src=(url) alt="Current image";
                        small { "Leave empty to keep the current image." }
                    }
                    input type="file" name="image" accept="image/*";
                }
                div.form-actions {
                    button type="submit" { "Save" }
                    a href="/admin" { "Cancel" }
                }
            }
        }
    }
}

pub fn post_form_page(
    site: &SiteInfo,
    form: &FormContext<'_>,
    draft: &PostDraft,
) -> Markup {
    let fields = html! {
        label { "Title" input type="text" name="title" value=(draft.title) required; }
        label { "Author" input type="text" name="author" value=(draft.author); }
        label {
            "Content (Markdown)"
            textarea name="content" rows="14" { (draft.content) }
        }
    };
    layout(site, form.heading, Section::Admin, None, form_frame(form, fields))
}

pub fn dish_form_page(
    site: &SiteInfo,
    form: &FormContext<'_>,
    draft: &DishDraft,
    categories: &[String],
) -> Markup {
    let fields = html! {
        label { "Name" input type="text" name="name" value=(draft.name) required; }
        label {
            "Category"
            input type="text" name="category" value=(draft.category) list="category-choices";
            datalist id="category-choices" {
                @for name in categories { option value=(name) {} }
            }
        }
        label { "Price" input type="text" name="price" value=(draft.price) inputmode="decimal" required; }
        label {
            "Description"
            textarea name="description" rows="4" { (draft.description) }
        }
        label.checkbox {
            input type="checkbox" name="popular" value="on" checked[draft.popular];
            "Popular"
        }
        label { "Order link" input type="url" name="order_link" value=(draft.order_link) placeholder="https://"; }
        label { "Display order" input type="number" name="order" value=(draft.order) step="1"; }
    };
    layout(site, form.heading, Section::Admin, None, form_frame(form, fields))
}

pub fn confirm_delete_page(site: &SiteInfo, kind: &str, name: &str, action: &str) -> Markup {
    let content = html! {
        (admin_bar())
        section.form-page {
            h1 { "Delete " (kind) "?" }
            p { "“" (name) "” will be removed permanently." }
            form method="post" action=(action) {
                div.form-actions {
                    button.danger type="submit" { "Delete" }
                    a href="/admin" { "Cancel" }
                }
            }
        }
    };
    layout(site, "Delete", Section::Admin, None, content)
}

fn url_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// ============================================================================
// Tests
// ============================================================================

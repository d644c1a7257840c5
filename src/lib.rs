//! # Simple Bistro
//!
//! A restaurant website: a public menu and blog, and a small admin panel
//! for managing dishes, posts, and menu categories. Records live in a hosted
//! document database (the content store); images live on an image host (the
//! media host). The site itself keeps no state beyond admin sessions.
//!
//! # Architecture: Forms → Media → Store → Views
//!
//! ```text
//! admin form ──validate──▶ media host (upload) ──▶ content store (write)
//!                                                        │
//! visitor ◀──── maud pages ◀── sort + filter ◀── read ───┘
//! ```
//!
//! Each arrow is a separate module with its own error type, so a failure is
//! always attributable to one step: bad input, a failed upload, or a failed
//! write.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading, stock defaults, env credentials, validation |
//! | [`types`] | `Post`, `Dish`, `Category` records and their form drafts |
//! | [`validate`] | Field rules applied before any network call |
//! | [`slug`] | Post slugs derived from titles |
//! | [`store`] | Content store trait with Firestore and in-memory backends |
//! | [`media`] | Media host trait with Cloudinary and in-memory backends |
//! | [`content`] | Save, read, and delete workflows tying the above together |
//! | [`listing`] | Menu and blog ordering and filtering |
//! | [`auth`] | Admin credentials and sessions |
//! | [`web`] | axum routes, handlers, and maud views |
//! | [`output`] | CLI output formatting for `check` |
//!
//! # Design Decisions
//!
//! ## Validate, Upload, Write
//!
//! A save validates everything it can locally first (required fields,
//! price, order link, image size and type). Only then does it upload the
//! image and write the record. Nothing about a rejected form ever reaches
//! the network.
//!
//! ## No Transaction Across Upload and Write
//!
//! The media host and the content store are separate services, so an
//! upload can succeed and the write that would reference it can fail. The
//! content service then asks the media host to delete the image. That
//! cleanup is best effort: if it fails too, the orphan is logged.
//!
//! ## Edit Tokens
//!
//! Edit forms carry the record's `updatedAt`. A save whose token no longer
//! matches is refused with a conflict, so two admins editing the same dish
//! cannot silently overwrite each other.
//!
//! ## Categories Are Free Text
//!
//! A dish stores a copy of its category name, not a reference. Categories
//! may be added twice; every place that lists them de-duplicates by name.
//!
//! ## Maud Over Template Engines
//!
//! Pages are built with [Maud](https://maud.lambda.xyz/): malformed markup
//! is a compile error and every interpolated value is escaped. Post bodies
//! are Markdown rendered with `pulldown-cmark`.
//!
//! ## Pluggable Backends
//!
//! Both services sit behind traits ([`store::ContentStore`],
//! [`media::MediaHost`]) and are injected into the router state. The
//! in-memory backends make the whole site runnable with no accounts and
//! back the test suite.

pub mod auth;
pub mod config;
pub mod content;
pub mod listing;
pub mod media;
pub mod output;
pub mod slug;
pub mod store;
pub mod types;
pub mod validate;
pub mod web;

#[cfg(test)]
pub(crate) mod test_helpers;

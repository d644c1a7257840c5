//! Local validation of admin form input.
//!
//! Everything here runs before any network call. A draft that fails
//! validation never reaches the media host or the content store.
//!
//! Rules:
//! - post title and dish name must be non-blank
//! - dish price must be a plain positive decimal (`12`, `12.5`, `0.99`)
//! - dish order link, when given, must parse as an absolute URL
//! - dish manual order, when given, must be a whole number
//! - a category name must be non-blank
//!
//! Image constraints (size cap, image-only) live in
//! [`media::check_upload`](crate::media::check_upload).

use crate::types::{DishDraft, DishInput, PostDraft, PostInput};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("price must be a positive number, got {0:?}")]
    InvalidPrice(String),
    #[error("order link is not a valid URL: {0:?}")]
    InvalidOrderLink(String),
    #[error("display order must be a whole number, got {0:?}")]
    InvalidOrder(String),
    #[error("image is {size} bytes, the limit is {max} bytes")]
    ImageTooLarge { size: usize, max: usize },
    #[error("only image uploads are accepted ({0})")]
    NotAnImage(String),
}

impl ValidationError {
    /// Form field the error belongs to, for highlighting.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required(field) => *field,
            ValidationError::InvalidPrice(_) => "price",
            ValidationError::InvalidOrderLink(_) => "order_link",
            ValidationError::InvalidOrder(_) => "order",
            ValidationError::ImageTooLarge { .. } | ValidationError::NotAnImage(_) => "image",
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

pub fn validate_post(draft: &PostDraft) -> Result<PostInput, ValidationError> {
    Ok(PostInput {
        title: required(&draft.title, "title")?,
        author: draft.author.trim().to_string(),
        content: draft.content.trim_end().to_string(),
    })
}

pub fn validate_dish(draft: &DishDraft) -> Result<DishInput, ValidationError> {
    Ok(DishInput {
        name: required(&draft.name, "name")?,
        category: draft.category.trim().to_string(),
        price: parse_price(&draft.price)?,
        description: draft.description.trim().to_string(),
        popular: draft.popular,
        order_link: parse_order_link(&draft.order_link)?,
        order: parse_order(&draft.order)?,
    })
}

pub fn validate_category(name: &str) -> Result<String, ValidationError> {
    required(name, "category name")
}

/// Accept a plain positive decimal and return it trimmed.
///
/// Exponents, signs, `inf`, and `NaN` are rejected even though `f64` would
/// parse them; a menu price is digits with at most one decimal point.
pub fn parse_price(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let invalid = || ValidationError::InvalidPrice(raw.to_string());

    let mut parts = trimmed.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    let well_formed = match fraction {
        Some(frac) => {
            all_digits(whole) && all_digits(frac) && !(whole.is_empty() && frac.is_empty())
        }
        None => !whole.is_empty() && all_digits(whole),
    };
    if !well_formed {
        return Err(invalid());
    }

    let value: f64 = trimmed.parse().map_err(|_| invalid())?;
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

/// Empty means "no link". Anything else must be an absolute http(s) URL
/// with a host, since it is rendered as a live link on the menu.
pub fn parse_order_link(raw: &str) -> Result<Option<String>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            Ok(Some(url.to_string()))
        }
        _ => Err(ValidationError::InvalidOrderLink(raw.to_string())),
    }
}

pub fn parse_order(raw: &str) -> Result<Option<i64>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| ValidationError::InvalidOrder(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dish_draft() -> DishDraft {
        DishDraft {
            name: "Suya Platter".to_string(),
            category: "Grills".to_string(),
            price: "12.50".to_string(),
            description: "Spiced beef skewers".to_string(),
            popular: false,
            order_link: String::new(),
            order: String::new(),
        }
    }

    // =========================================================================
    // Price
    // =========================================================================

    #[test]
    fn price_accepts_plain_decimals() {
        for price in ["12", "12.5", "12.50", "0.99", " 7 ", ".5", "5."] {
            assert!(parse_price(price).is_ok(), "{price:?} should be accepted");
        }
    }

    #[test]
    fn price_rejects_non_numeric() {
        for price in ["abc", "twelve", "12,50", "$12", "1e3", "inf", "NaN", "1.2.3", "", "."] {
            assert_eq!(
                parse_price(price),
                Err(ValidationError::InvalidPrice(price.to_string())),
                "{price:?} should be rejected"
            );
        }
    }

    #[test]
    fn price_rejects_zero_and_negative() {
        assert!(parse_price("0").is_err());
        assert!(parse_price("0.00").is_err());
        assert!(parse_price("-3").is_err());
    }

    #[test]
    fn price_is_trimmed() {
        assert_eq!(parse_price("  9.75 ").unwrap(), "9.75");
    }

    // =========================================================================
    // Order link
    // =========================================================================

    #[test]
    fn order_link_rejects_garbage() {
        assert_eq!(
            parse_order_link("not a url"),
            Err(ValidationError::InvalidOrderLink("not a url".to_string()))
        );
        assert!(parse_order_link("example.com/order").is_err());
    }

    #[test]
    fn order_link_rejects_non_web_schemes() {
        for link in [
            "javascript:alert(document.cookie)",
            "javascript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "mailto:x@y",
            "ftp://example.com/menu",
            "file:///etc/passwd",
        ] {
            assert_eq!(
                parse_order_link(link),
                Err(ValidationError::InvalidOrderLink(link.to_string())),
                "{link}"
            );
        }
        assert!(parse_order_link("http://example.com/order").is_ok());
    }

    #[test]
    fn order_link_accepts_absolute_url() {
        assert_eq!(
            parse_order_link("https://example.com/order").unwrap(),
            Some("https://example.com/order".to_string())
        );
    }

    #[test]
    fn order_link_blank_is_none() {
        assert_eq!(parse_order_link("   ").unwrap(), None);
    }

    // =========================================================================
    // Order
    // =========================================================================

    #[test]
    fn order_parses_integers() {
        assert_eq!(parse_order("3").unwrap(), Some(3));
        assert_eq!(parse_order("-1").unwrap(), Some(-1));
        assert_eq!(parse_order("").unwrap(), None);
        assert!(parse_order("first").is_err());
        assert!(parse_order("1.5").is_err());
    }

    // =========================================================================
    // Whole drafts
    // =========================================================================

    #[test]
    fn valid_dish_draft() {
        let mut draft = dish_draft();
        draft.order_link = "https://example.com/order".to_string();
        draft.order = "4".to_string();
        let input = validate_dish(&draft).unwrap();
        assert_eq!(input.name, "Suya Platter");
        assert_eq!(input.price, "12.50");
        assert_eq!(input.order_link.as_deref(), Some("https://example.com/order"));
        assert_eq!(input.order, Some(4));
    }

    #[test]
    fn blank_dish_name_is_rejected() {
        let mut draft = dish_draft();
        draft.name = "   ".to_string();
        let err = validate_dish(&draft).unwrap_err();
        assert_eq!(err, ValidationError::Required("name"));
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn blank_post_title_is_rejected() {
        let draft = PostDraft {
            title: String::new(),
            author: "Ada".to_string(),
            content: "Body".to_string(),
        };
        assert_eq!(validate_post(&draft), Err(ValidationError::Required("title")));
    }

    #[test]
    fn post_fields_are_trimmed() {
        let draft = PostDraft {
            title: "  Suya Night  ".to_string(),
            author: " Ada ".to_string(),
            content: "Line one\n\n".to_string(),
        };
        let input = validate_post(&draft).unwrap();
        assert_eq!(input.title, "Suya Night");
        assert_eq!(input.author, "Ada");
        assert_eq!(input.content, "Line one");
    }

    #[test]
    fn category_name_required() {
        assert!(validate_category("  ").is_err());
        assert_eq!(validate_category(" Soups ").unwrap(), "Soups");
    }

    #[test]
    fn error_fields() {
        assert_eq!(ValidationError::InvalidPrice(String::new()).field(), "price");
        assert_eq!(
            ValidationError::ImageTooLarge { size: 2, max: 1 }.field(),
            "image"
        );
    }
}

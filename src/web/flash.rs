//! One-shot notifications carried across a redirect.
//!
//! A handler that redirects after a save sets the flash cookie; the next
//! page that renders reads it and removes it, so each message shows once.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tower_cookies::{Cookie, Cookies};

const FLASH_COOKIE_NAME: &str = "_flash";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn css_class(self) -> &'static str {
        match self {
            FlashKind::Success => "flash flash-success",
            FlashKind::Error => "flash flash-error",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Deserialize)]
struct ValuedMessage<T> {
    #[serde(rename = "_")]
    value: T,
}

#[derive(Serialize)]
struct ValuedMessageRef<'a, T> {
    #[serde(rename = "_")]
    value: &'a T,
}

fn encode<T: Serialize>(data: &T) -> Option<String> {
    serde_json::to_string(&ValuedMessageRef { value: data }).ok()
}

fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str::<ValuedMessage<T>>(raw)
        .ok()
        .map(|message| message.value)
}

fn flash_cookie(value: String) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .build()
}

pub fn set_flash(cookies: &Cookies, flash: &Flash) {
    if let Some(value) = encode(flash) {
        cookies.add(flash_cookie(value));
    }
}

/// Read and clear the pending flash, if any.
pub fn take_flash(cookies: &Cookies) -> Option<Flash> {
    let raw = cookies.get(FLASH_COOKIE_NAME)?;
    cookies.remove(flash_cookie(String::new()));
    decode(raw.value())
}

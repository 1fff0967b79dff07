//! Cart cookie codec.
//!
//! The cart is kept entirely client-side in a `cart` cookie whose value is
//! the JSON array of entries, base64url encoded. Anything read back is
//! untrusted: oversized, undecodable or malformed values yield an empty cart
//! and bad entries are dropped by [`Cart::from_values`].

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;
use stockroom_core::Cart;
use thiserror::Error;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

/// Cookie name.
pub const CART_COOKIE_NAME: &str = "cart";

/// Largest encoded value accepted or written.
pub const MAX_COOKIE_VALUE_BYTES: usize = 4000;

const MAX_AGE_DAYS: i64 = 30;

/// Errors when writing the cart cookie.
#[derive(Debug, Error)]
pub enum CartCookieError {
    #[error("cart cookie would be {size} bytes, limit is {MAX_COOKIE_VALUE_BYTES}")]
    TooLarge { size: usize },

    #[error("failed to encode cart: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cart cookie is not a valid header value")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

/// Decode a raw cookie value. `None` means the value was unusable.
#[must_use]
pub fn decode(value: &str) -> Option<Cart> {
    if value.len() > MAX_COOKIE_VALUE_BYTES {
        tracing::warn!(size = value.len(), "Discarding oversized cart cookie");
        return None;
    }

    let bytes = match URL_SAFE_NO_PAD.decode(value.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Discarding undecodable cart cookie");
            return None;
        }
    };

    match serde_json::from_slice::<Vec<Value>>(&bytes) {
        Ok(values) => Some(Cart::from_values(&values)),
        Err(e) => {
            tracing::debug!(error = %e, "Discarding malformed cart cookie");
            None
        }
    }
}

/// Encode a cart as a cookie value.
///
/// # Errors
///
/// Returns `CartCookieError::TooLarge` if the encoded value exceeds
/// [`MAX_COOKIE_VALUE_BYTES`].
pub fn encode(cart: &Cart) -> Result<String, CartCookieError> {
    let json = serde_json::to_vec(cart)?;
    let value = URL_SAFE_NO_PAD.encode(json);
    if value.len() > MAX_COOKIE_VALUE_BYTES {
        return Err(CartCookieError::TooLarge { size: value.len() });
    }
    Ok(value)
}

/// Read the cart from request headers. Missing or unusable cookies give an
/// empty cart.
#[must_use]
pub fn read(headers: &HeaderMap) -> Cart {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == CART_COOKIE_NAME)
        .and_then(|c| decode(c.value()))
        .unwrap_or_default()
}

fn build(value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((CART_COOKIE_NAME, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// `Set-Cookie` value storing `cart`.
///
/// # Errors
///
/// Returns `CartCookieError` if the cart cannot be encoded within the size
/// limit.
pub fn store(cart: &Cart, secure: bool) -> Result<HeaderValue, CartCookieError> {
    let cookie = build(encode(cart)?, Duration::days(MAX_AGE_DAYS), secure);
    Ok(HeaderValue::from_str(&cookie.to_string())?)
}

/// `Set-Cookie` value deleting the cart.
#[must_use]
pub fn clear(secure: bool) -> HeaderValue {
    let cookie = build(String::new(), Duration::ZERO, secure);
    HeaderValue::from_str(&cookie.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("cart=; Path=/; Max-Age=0"))
}

/// Extractor yielding the request's cart.
pub struct CartCookie(pub Cart);

impl<S> FromRequestParts<S> for CartCookie
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(read(&parts.headers)))
    }
}

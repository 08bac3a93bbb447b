//! Session bootstrap: credential storage and the one-shot profile fetch.
//!
//! A failed bootstrap is terminal for the session; callers clear the stored
//! credential and redirect rather than retry.

use gloo::net::http::Request;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The credential is valid but no profile exists yet; callers redirect to
    /// a creation flow.
    #[error("profile not found")]
    NotFound,
    #[error("credential rejected (status {status})")]
    Unauthorized { status: u16 },
    #[error("network error: {0}")]
    Network(String),
}

/// Reads a stored credential, treating blank values as absent.
pub fn stored_token(key: &str) -> Option<String> {
    let storage = web_sys::window()?.local_storage().ok()??;
    storage
        .get_item(key)
        .ok()?
        .filter(|token| !token.trim().is_empty())
}

pub fn store_token(key: &str, value: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, value);
    }
}

pub fn clear_token(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn redirect(path: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(path);
    }
}

/// Maps a bootstrap response status to its terminal error, if any. 404 means
/// the credential is fine but no profile exists yet; everything else outside
/// 2xx invalidates the session.
pub fn classify_status(status: u16) -> Option<BootstrapError> {
    match status {
        404 => Some(BootstrapError::NotFound),
        status if (200..300).contains(&status) => None,
        status => Some(BootstrapError::Unauthorized { status }),
    }
}

/// One authenticated fetch of the current profile. No retry.
pub async fn fetch_profile<T: DeserializeOwned>(url: &str, token: &str) -> Result<T, BootstrapError> {
    let response = Request::get(url)
        .header("Authorization", &format!("Bearer {token}"))
        .send()
        .await
        .map_err(|err| BootstrapError::Network(err.to_string()))?;

    if let Some(err) = classify_status(response.status()) {
        return Err(err);
    }
    response
        .json::<T>()
        .await
        .map_err(|err| BootstrapError::Network(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_profile_routes_to_creation_not_logout() {
        assert!(matches!(classify_status(404), Some(BootstrapError::NotFound)));
    }

    #[test]
    fn non_success_statuses_invalidate_the_session() {
        for status in [400, 401, 403, 500] {
            match classify_status(status) {
                Some(BootstrapError::Unauthorized { status: got }) => assert_eq!(got, status),
                other => panic!("unexpected for {status}: {other:?}"),
            }
        }
    }

    #[test]
    fn success_statuses_pass_through() {
        assert!(classify_status(200).is_none());
        assert!(classify_status(204).is_none());
    }
}

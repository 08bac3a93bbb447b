//! Pixolve REST client: auth, lobby membership, and category administration.
//! Gameplay itself happens over the websocket; these calls only set it up.

use gloo::net::http::Request;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_level")]
    pub level: i64,
    #[serde(default)]
    pub xp: i64,
}

fn default_level() -> i64 {
    1
}

impl Profile {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInLobby {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub ready: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lobby {
    pub id: String,
    pub host_id: String,
    #[serde(default)]
    pub max_players: u32,
    #[serde(default)]
    pub players: Vec<PlayerInLobby>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rounds: u32,
    #[serde(default)]
    pub join_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LobbyCreate {
    pub host_id: String,
    pub max_players: u32,
    pub rounds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinByCodeResponse {
    pub lobby: Lobby,
    #[serde(default)]
    pub players: Vec<PlayerInLobby>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

pub async fn login(credentials: &Credentials) -> Result<Token, ApiError> {
    post_json("/auth/login", credentials).await
}

pub async fn register(credentials: &Credentials) -> Result<Profile, ApiError> {
    post_json("/auth/register", credentials).await
}

pub async fn create_lobby(body: &LobbyCreate) -> Result<Lobby, ApiError> {
    post_json("/lobbies", body).await
}

pub async fn join_by_code(
    code: &str,
    player: &PlayerInLobby,
) -> Result<JoinByCodeResponse, ApiError> {
    #[derive(Serialize)]
    struct Body<'a> {
        code: &'a str,
        player: &'a PlayerInLobby,
    }
    post_json("/lobbies/join_by_code", &Body { code, player }).await
}

pub async fn leave_lobby(lobby_id: &str, player: &PlayerInLobby) -> Result<(), ApiError> {
    let url = format!("/lobbies/{lobby_id}/leave");
    let response = Request::post(&url)
        .json(player)
        .map_err(|err| ApiError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check_status(&response).await?;
    Ok(())
}

pub async fn list_categories() -> Result<Vec<Category>, ApiError> {
    let response = Request::get("/categories")
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check_status(&response).await?;
    decode(response).await
}

pub async fn create_category(body: &CategoryCreate) -> Result<Category, ApiError> {
    post_json("/categories", body).await
}

pub async fn update_category(id: &str, body: &CategoryUpdate) -> Result<Category, ApiError> {
    let url = format!("/categories/{id}");
    let response = Request::put(&url)
        .json(body)
        .map_err(|err| ApiError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check_status(&response).await?;
    decode(response).await
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    pub path: String,
}

/// Multipart upload of one image into a category. The server stores a
/// lightly pixelated rendition and returns its relative path.
pub async fn upload_category_image(
    category_id: &str,
    file: &web_sys::File,
) -> Result<UploadedImage, ApiError> {
    let form = web_sys::FormData::new()
        .map_err(|err| ApiError::Network(format!("{err:?}")))?;
    form.append_with_blob("file", file)
        .map_err(|err| ApiError::Network(format!("{err:?}")))?;
    let url = format!("/categories/{category_id}/upload");
    let response = Request::post(&url)
        .body(form)
        .map_err(|err| ApiError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check_status(&response).await?;
    decode(response).await
}

pub async fn delete_category(id: &str) -> Result<(), ApiError> {
    delete(&format!("/categories/{id}")).await
}

pub async fn delete_category_image(category_id: &str, image_path: &str) -> Result<(), ApiError> {
    delete(&format!("/categories/{category_id}/images/{image_path}")).await
}

/// Builds the URL for a server-pixelated rendition of a category image.
/// `pixel_size` 0 asks for the untouched original.
pub fn pixelated_image_url(image_path: &str, pixel_size: u32, num_colors: u32) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("image_path", image_path)
        .append_pair("pixel_size", &pixel_size.to_string())
        .append_pair("num_colors", &num_colors.to_string())
        .finish();
    format!("/categories/images/pixelated?{query}")
}

async fn post_json<B: Serialize, T: DeserializeOwned>(url: &str, body: &B) -> Result<T, ApiError> {
    let response = Request::post(url)
        .json(body)
        .map_err(|err| ApiError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check_status(&response).await?;
    decode(response).await
}

async fn delete(url: &str) -> Result<(), ApiError> {
    let response = Request::delete(url)
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    check_status(&response).await?;
    Ok(())
}

async fn check_status(response: &gloo::net::http::Response) -> Result<(), ApiError> {
    if response.ok() {
        return Ok(());
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<no body>"));
    Err(ApiError::Http {
        status: response.status(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: gloo::net::http::Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::pixelated_image_url;

    #[test]
    fn pixelated_url_escapes_the_image_path() {
        let url = pixelated_image_url("dogs/shiba inu.png", 16, 16);
        assert_eq!(
            url,
            "/categories/images/pixelated?image_path=dogs%2Fshiba+inu.png&pixel_size=16&num_colors=16"
        );
    }

    #[test]
    fn pixel_size_zero_requests_the_original() {
        let url = pixelated_image_url("cats/a.png", 0, 16);
        assert!(url.contains("pixel_size=0"));
    }
}

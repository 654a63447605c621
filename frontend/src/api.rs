//! Thin client for the `/api/users` endpoints.

use std::collections::BTreeMap;

use gloo_net::http::{Request, Response};
use serde::{Deserialize, Serialize};

const API_BASE_URL: &str = "/api/users";

pub type FieldErrors = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UserInfo {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Form contents sent on create and update.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&UserInfo> for UserDraft {
    fn from(user: &UserInfo) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApiFailure {
    /// Per-field validation messages from a 400 response.
    Fields(FieldErrors),
    Message(String),
}

impl ApiFailure {
    pub fn message(&self) -> String {
        match self {
            Self::Fields(_) => "Please fix the highlighted fields".to_string(),
            Self::Message(message) => message.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<FieldErrors>,
}

fn network(e: gloo_net::Error) -> ApiFailure {
    ApiFailure::Message(format!("Request failed: {}", e))
}

async fn failure(response: &Response) -> ApiFailure {
    match response.json::<ErrorResponse>().await {
        Ok(ErrorResponse { errors: Some(errors), .. }) => ApiFailure::Fields(errors),
        Ok(ErrorResponse { error: Some(error), .. }) => ApiFailure::Message(error),
        _ => ApiFailure::Message(format!("Request failed with status {}", response.status())),
    }
}

pub async fn fetch_users() -> Result<Vec<UserInfo>, ApiFailure> {
    let response = Request::get(API_BASE_URL).send().await.map_err(network)?;
    if !response.ok() {
        return Err(failure(&response).await);
    }
    response
        .json::<Vec<UserInfo>>()
        .await
        .map_err(|_| ApiFailure::Message("Failed to parse users data".to_string()))
}

/// POST a new user, or PUT over `id` when editing.
pub async fn save_user(id: Option<i32>, draft: &UserDraft) -> Result<UserInfo, ApiFailure> {
    let request = match id {
        Some(id) => Request::put(&format!("{}/{}", API_BASE_URL, id)),
        None => Request::post(API_BASE_URL),
    };
    let response = request
        .json(draft)
        .map_err(network)?
        .send()
        .await
        .map_err(network)?;
    if !response.ok() {
        return Err(failure(&response).await);
    }
    response
        .json::<UserInfo>()
        .await
        .map_err(|_| ApiFailure::Message("Failed to parse server response".to_string()))
}

pub async fn delete_user(id: i32) -> Result<(), ApiFailure> {
    let response = Request::delete(&format!("{}/{}", API_BASE_URL, id))
        .send()
        .await
        .map_err(network)?;
    if !response.ok() {
        return Err(failure(&response).await);
    }
    Ok(())
}

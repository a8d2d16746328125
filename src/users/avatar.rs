use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use futures_util::future::try_join_all;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{config::Config, error::ChatError, AppResult};

use super::Directory;

#[derive(Deserialize)]
pub(crate) struct SetAvatarRequest {
    #[serde(default)]
    image: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetAvatarReply {
    is_set: bool,
    image: String,
}

#[derive(Serialize)]
pub(crate) struct AvatarCandidates {
    avatars: Vec<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn set_avatar(
    Path(id): Path<String>,
    State(directory): State<Directory>,
    Json(SetAvatarRequest { image }): Json<SetAvatarRequest>,
) -> AppResult<Json<SetAvatarReply>> {
    validate_image(&image)?;

    let user = directory.set_avatar(&id, &image).await?;
    info!("u/{id} picked an avatar");

    Ok(Json(SetAvatarReply {
        is_set: user.is_avatar_image_set,
        image: user.avatar_image,
    }))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn avatar_candidates(
    State(http): State<reqwest::Client>,
    State(config): State<Arc<Config>>,
) -> AppResult<Json<AvatarCandidates>> {
    let seeds: Vec<u32> = {
        let mut rng = rand::rng();
        (0..config.avatar_candidates).map(|_| rng.random_range(0..=1000)).collect()
    };

    let avatars = try_join_all(
        seeds
            .into_iter()
            .map(|seed| fetch_avatar(&http, &config.avatar_api, seed)),
    )
    .await?;

    Ok(Json(AvatarCandidates { avatars }))
}

async fn fetch_avatar(http: &reqwest::Client, api: &str, seed: u32) -> anyhow::Result<String> {
    let image = http
        .get(candidate_url(api, seed))
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    Ok(STANDARD.encode(image))
}

fn candidate_url(api: &str, seed: u32) -> String {
    format!("{}/{seed}", api.trim_end_matches('/'))
}

fn validate_image(image: &str) -> Result<(), ChatError> {
    if image.is_empty() {
        return Err(ChatError::invalid("Please select an avatar"));
    }
    STANDARD
        .decode(image)
        .map(|_| ())
        .map_err(|_| ChatError::invalid("avatar image must be base64"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_urls_append_the_seed() {
        assert_eq!(candidate_url("https://avatars.test/abc", 7), "https://avatars.test/abc/7");
        assert_eq!(candidate_url("https://avatars.test/abc/", 7), "https://avatars.test/abc/7");
    }

    #[test]
    fn images_must_be_base64() {
        assert!(validate_image(&STANDARD.encode("<svg/>")).is_ok());
        assert!(matches!(validate_image(""), Err(ChatError::InvalidArgument(_))));
        assert!(matches!(validate_image("not base64!"), Err(ChatError::InvalidArgument(_))));
    }
}

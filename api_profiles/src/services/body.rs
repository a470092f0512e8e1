use actix_multipart::Multipart;
use actix_web::{HttpRequest, http::header, web};
use common::error::{AppError, Res};
use futures::StreamExt;
use url::form_urlencoded;

use crate::{
    dtos::profile::{AvatarUpload, ProfilePatch},
    services::avatar::MAX_AVATAR_BYTES,
};

/// Upper bound for a JSON or form body, or a single multipart text field.
const MAX_TEXT_BYTES: usize = 64 * 1024;

/// Reads a profile patch from a JSON, urlencoded form or multipart body.
/// Only multipart bodies can carry an avatar upload.
pub async fn read_profile_patch(
    req: &HttpRequest,
    payload: web::Payload,
) -> Res<(ProfilePatch, Option<AvatarUpload>)> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        read_multipart(Multipart::new(req.headers(), payload)).await
    } else if content_type.is_empty() || content_type.starts_with("application/json") {
        let bytes = read_limited(payload, MAX_TEXT_BYTES).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok((ProfilePatch::default(), None));
        }
        let patch = serde_json::from_slice::<ProfilePatch>(&bytes)
            .map_err(|e| AppError::BadRequest(format!("JSON parse error - {}", e)))?;
        Ok((patch, None))
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let bytes = read_limited(payload, MAX_TEXT_BYTES).await?;
        let mut patch = ProfilePatch::default();
        for (name, value) in form_urlencoded::parse(&bytes) {
            patch.set_text(&name, value.into_owned());
        }
        Ok((patch, None))
    } else {
        Err(AppError::BadRequest(format!(
            "Unsupported media type \"{}\" in request.",
            content_type
        )))
    }
}

async fn read_limited(mut payload: web::Payload, limit: usize) -> Res<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(AppError::BadRequest("Request body is too large.".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn read_multipart(mut multipart: Multipart) -> Res<(ProfilePatch, Option<AvatarUpload>)> {
    let mut patch = ProfilePatch::default();
    let mut upload = None;

    while let Some(field) = multipart.next().await {
        let mut field = field.map_err(|e| AppError::BadRequest(e.to_string()))?;
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();

        if name == "file" && is_file {
            let content_type = field.content_type().map(|mime| mime.essence_str().to_owned());
            let mut bytes = Vec::new();
            let mut truncated = false;
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
                if bytes.len() + chunk.len() > MAX_AVATAR_BYTES {
                    // keep draining the stream so the rest of the form can be read
                    truncated = true;
                    continue;
                }
                bytes.extend_from_slice(&chunk);
            }
            upload = Some(AvatarUpload {
                content_type,
                bytes,
                truncated,
            });
            continue;
        }

        let mut value = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            if value.len() + chunk.len() > MAX_TEXT_BYTES {
                return Err(AppError::field(&name, "Value is too long."));
            }
            value.extend_from_slice(&chunk);
        }
        let value = String::from_utf8(value)
            .map_err(|_| AppError::field(&name, "Value must be valid UTF-8 text."))?;
        patch.set_text(&name, value);
    }

    Ok((patch, upload))
}

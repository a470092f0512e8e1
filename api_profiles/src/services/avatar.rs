use std::path::PathBuf;

use common::error::{AppError, Res};
use uuid::Uuid;

use crate::dtos::profile::AvatarUpload;

/// 5 MiB.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Accepted MIME types and the extension files are stored with.
pub const ALLOWED_AVATAR_TYPES: [(&str, &str); 3] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// Checks type and size of an uploaded avatar and returns the file extension to store it with.
pub fn validate_avatar(upload: &AvatarUpload) -> Res<&'static str> {
    let content_type = upload
        .content_type
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let Some((_, extension)) = ALLOWED_AVATAR_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
    else {
        return Err(AppError::field(
            "file",
            "Unsupported file type. Allowed: JPEG, PNG, WEBP.",
        ));
    };

    if upload.truncated || upload.bytes.len() > MAX_AVATAR_BYTES {
        return Err(AppError::field("file", "File too large (>5MB)."));
    }

    Ok(extension)
}

/// Relative location of a new avatar below the media root, e.g. `avatars/7/<hex>.png`.
pub fn avatar_path(user_id: i64, extension: &str) -> String {
    format!("avatars/{}/{}.{}", user_id, Uuid::new_v4().simple(), extension)
}

/// Writes the avatar to `relative` below `media_root`.
pub async fn store_avatar(media_root: &str, relative: &str, bytes: &[u8]) -> Res<()> {
    let target = PathBuf::from(media_root).join(relative);

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, bytes).await?;

    log::info!("Stored avatar at {}", target.display());
    Ok(())
}

/// Absolute URL of a stored avatar, e.g. `http://host/media/avatars/7/<hex>.png`.
pub fn avatar_url(origin: &str, media_url: &str, relative: &str) -> String {
    format!("{}{}{}", origin.trim_end_matches('/'), media_url, relative)
}

/// Maps a profile `file` URL back to an avatar this service stored for `user_id`.
/// URLs pointing anywhere else yield `None`.
pub fn stored_avatar_path(url: &str, media_url: &str, user_id: i64) -> Option<String> {
    let prefix = format!("{}avatars/{}/", media_url, user_id);
    let start = url.find(&prefix)?;
    let name = &url[start + prefix.len()..];

    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
    valid.then(|| format!("avatars/{}/{}", user_id, name))
}

/// Deletes a stored avatar. Failures are logged and otherwise ignored.
pub async fn remove_avatar(media_root: &str, relative: &str) {
    let target = PathBuf::from(media_root).join(relative);
    match tokio::fs::remove_file(&target).await {
        Ok(()) => log::info!("Removed avatar {}", target.display()),
        Err(e) => log::warn!("Could not remove avatar {}: {}", target.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, size: usize) -> AvatarUpload {
        AvatarUpload {
            content_type: Some(content_type.to_string()),
            bytes: vec![0; size],
            truncated: false,
        }
    }

    #[test]
    fn accepts_allowed_types_within_limit() {
        assert_eq!(validate_avatar(&upload("image/jpeg", 10)).unwrap(), "jpg");
        assert_eq!(validate_avatar(&upload("image/PNG", 10)).unwrap(), "png");
        assert_eq!(
            validate_avatar(&upload("image/webp", MAX_AVATAR_BYTES)).unwrap(),
            "webp"
        );
    }

    #[test]
    fn rejects_other_types_and_oversized_files() {
        for content_type in ["image/gif", "application/pdf", ""] {
            assert!(matches!(
                validate_avatar(&upload(content_type, 10)),
                Err(AppError::Validation(ref e)) if e.contains("file")
            ));
        }
        assert!(validate_avatar(&upload("image/png", MAX_AVATAR_BYTES + 1)).is_err());

        let mut truncated = upload("image/png", 10);
        truncated.truncated = true;
        assert!(validate_avatar(&truncated).is_err());
    }

    #[test]
    fn avatar_path_is_scoped_by_user() {
        let path = avatar_path(7, "png");
        assert!(path.starts_with("avatars/7/"));
        assert!(path.ends_with(".png"));
        assert_eq!(path.len(), "avatars/7/".len() + 32 + ".png".len());
    }

    #[test]
    fn absolute_url_joins_origin_and_media_prefix() {
        assert_eq!(
            avatar_url("http://localhost:8000", "/media/", "avatars/3/a.png"),
            "http://localhost:8000/media/avatars/3/a.png"
        );
        assert_eq!(
            avatar_url("https://shop.example/", "/uploads/", "avatars/3/a.png"),
            "https://shop.example/uploads/avatars/3/a.png"
        );
    }

    #[test]
    fn only_own_stored_avatars_map_to_a_path() {
        let url = "http://localhost:8000/media/avatars/3/0f3c.png";
        assert_eq!(
            stored_avatar_path(url, "/media/", 3).as_deref(),
            Some("avatars/3/0f3c.png")
        );
        assert_eq!(
            stored_avatar_path("/media/avatars/3/0f3c.png", "/media/", 3).as_deref(),
            Some("avatars/3/0f3c.png")
        );
        // another user's file, an external URL, traversal and nested paths are left alone
        assert_eq!(stored_avatar_path(url, "/media/", 4), None);
        assert_eq!(stored_avatar_path("https://cdn.example/x.png", "/media/", 3), None);
        assert_eq!(stored_avatar_path("/media/avatars/3/..", "/media/", 3), None);
        assert_eq!(stored_avatar_path("/media/avatars/3/../4/a.png", "/media/", 3), None);
        assert_eq!(stored_avatar_path("/media/avatars/3/", "/media/", 3), None);
        assert_eq!(stored_avatar_path("", "/media/", 3), None);
    }

    #[actix_web::test]
    async fn stores_and_removes_avatar_below_media_root() {
        let root = std::env::temp_dir().join(format!("avatar-test-{}", Uuid::new_v4().simple()));
        let root_str = root.to_string_lossy().to_string();
        let relative = avatar_path(3, "png");
        store_avatar(&root_str, &relative, b"png-bytes").await.unwrap();

        let stored = root.join(&relative);
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"png-bytes");

        remove_avatar(&root_str, &relative).await;
        assert!(!stored.exists());
        // a second removal only logs
        remove_avatar(&root_str, &relative).await;

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}

use base64::{engine::general_purpose::STANDARD, Engine as _};
use db::cooking::NewAttachment;
use serde::Deserialize;

use super::{validation, ServiceResult};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// An image as clients upload it: base64 `data`, optionally a full
/// `data:<mime>;base64,` URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let Some(rest) = data.strip_prefix("data:") else {
        return (None, data);
    };

    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, data),
    }
}

/// Decodes uploads, skipping entries without data.
pub(crate) fn decode_all(
    uploads: &[ImageUpload],
    max_bytes: usize,
) -> ServiceResult<Vec<NewAttachment>> {
    let mut images = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let Some(raw) = upload.data.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
            continue;
        };

        let (url_mime, payload) = split_data_url(raw);
        let payload = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect::<String>();

        // base64 grows data by a third; reject oversized uploads before decoding.
        if payload.len() / 4 * 3 > max_bytes + 3 {
            return Err(image_too_large(max_bytes));
        }

        let data = STANDARD
            .decode(payload.as_bytes())
            .map_err(|_| validation("Image data is not valid base64"))?;
        if data.len() > max_bytes {
            return Err(image_too_large(max_bytes));
        }

        let mime_type = upload
            .mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or(url_mime)
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        images.push(NewAttachment { mime_type, data });
    }

    Ok(images)
}

fn image_too_large(max_bytes: usize) -> super::ServiceError {
    validation(format!("Image exceeds the maximum size of {max_bytes} bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;

    fn upload(data: &str, mime_type: Option<&str>) -> ImageUpload {
        ImageUpload {
            data: Some(data.to_string()),
            mime_type: mime_type.map(ToString::to_string),
        }
    }

    #[test]
    fn plain_base64_defaults_to_jpeg() {
        let images = decode_all(&[upload("aGVsbG8=", None)], 1024).unwrap();

        assert_eq!(
            images,
            vec![NewAttachment {
                mime_type: "image/jpeg".to_string(),
                data: b"hello".to_vec(),
            }]
        );
    }

    #[test]
    fn data_urls_supply_the_mime_type() {
        let images = decode_all(&[upload("data:image/png;base64,aGVsbG8=", None)], 1024).unwrap();
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[0].data, b"hello");

        let images = decode_all(
            &[upload("data:image/png;base64,aGVsbG8=", Some("image/webp"))],
            1024,
        )
        .unwrap();
        assert_eq!(images[0].mime_type, "image/webp");
    }

    #[test]
    fn empty_entries_are_skipped() {
        let uploads = [upload("", None), ImageUpload::default(), upload("  ", None)];

        assert!(decode_all(&uploads, 1024).unwrap().is_empty());
    }

    #[test]
    fn invalid_or_oversized_data_is_rejected() {
        assert!(matches!(
            decode_all(&[upload("not base64!", None)], 1024),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            decode_all(&[upload("aGVsbG8=", None)], 4),
            Err(ServiceError::Validation(m)) if m.contains("maximum size of 4 bytes")
        ));
    }
}

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Splits a `data:<mime>;base64,<payload>` URI. Returns `None` for anything
/// else, including plain http URLs.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    if payload.is_empty() {
        return None;
    }
    Some((mime, payload))
}

/// Decodes the payload of a base64 data URI.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let (mime, payload) = split_data_uri(uri)?;
    match STANDARD.decode(payload) {
        Ok(bytes) => Some((mime.to_string(), bytes)),
        Err(e) => {
            log::debug!("invalid base64 payload in data URI: {}", e);
            None
        }
    }
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub fn image_extension(mime: &str) -> &'static str {
    if mime.to_ascii_lowercase().contains("png") {
        "png"
    } else {
        "jpeg"
    }
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

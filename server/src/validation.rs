use crate::error::ApiError;

/// Validate the `text` field of a TTS request and return it trimmed.
pub fn validate_tts_text(text: Option<&str>, max_length: usize) -> Result<&str, ApiError> {
    let text = text.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::NoText);
    }
    if text.chars().count() > max_length {
        return Err(ApiError::TextTooLong(max_length));
    }
    Ok(text)
}

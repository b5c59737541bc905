// The `text` field of a TTS request, read from a urlencoded or multipart body

use std::convert::Infallible;

use anyhow::anyhow;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header,
    Form,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct TtsForm {
    text: Option<String>,
}

/// The submitted `text`, or `None` when the body has no such field or is not
/// a readable form. Validation decides what a missing value means.
#[derive(Debug)]
pub struct TtsText(pub Option<String>);

impl<S> FromRequest<S> for TtsText
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let read = if is_multipart(&req) {
            multipart_text(req, state).await
        } else {
            Form::<TtsForm>::from_request(req, state)
                .await
                .map(|Form(form)| form.text)
                .map_err(|rejection| anyhow!("{rejection}"))
        };

        Ok(TtsText(read.unwrap_or_else(|e| {
            warn!("Unreadable TTS form: {e}");
            None
        })))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"))
}

async fn multipart_text<S>(req: Request, state: &S) -> anyhow::Result<Option<String>>
where
    S: Send + Sync,
{
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|rejection| anyhow!("{rejection}"))?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("text") {
            return Ok(Some(field.text().await?));
        }
    }
    Ok(None)
}

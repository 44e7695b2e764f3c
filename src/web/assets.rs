//! Static transport for the client bundle. `ServeDir` resolves and reads
//! files under the root; anything it cannot serve falls back to the index
//! document. Content types come from a fixed table keyed on the requested
//! extension.

use std::{convert::Infallible, path::Path};

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tracing::warn;

pub const INDEX_DOCUMENT: &str = "index.html";
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "application/javascript; charset=utf-8"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
];

pub fn content_type(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return FALLBACK_CONTENT_TYPE;
    };
    let ext = ext.to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[derive(Debug, Clone)]
pub struct AssetHost {
    files: ServeDir,
    index: ServeFile,
}

impl AssetHost {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            files: ServeDir::new(root).append_index_html_on_directories(true),
            index: ServeFile::new(root.join(INDEX_DOCUMENT)),
        }
    }

    pub async fn serve(&self, request: Request) -> Response {
        let path = request.uri().path();
        // "/" and "dir/" are answered with the directory's index.html.
        let mime = if path.ends_with('/') {
            content_type(Path::new(INDEX_DOCUMENT))
        } else {
            content_type(Path::new(path))
        };

        let response = match self.files.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        if status.is_server_error() {
            warn!(%status, "failed to read asset");
            return server_error();
        }
        if status.is_success() || status == StatusCode::NOT_MODIFIED {
            return with_content_type(response.into_response(), mime);
        }
        self.serve_index().await
    }

    async fn serve_index(&self) -> Response {
        let result: Result<_, Infallible> =
            self.index.clone().oneshot(Request::new(Body::empty())).await;
        let response = match result {
            Ok(response) => response,
            Err(never) => match never {},
        };
        if response.status().is_success() {
            with_content_type(
                response.into_response(),
                content_type(Path::new(INDEX_DOCUMENT)),
            )
        } else {
            warn!(status = %response.status(), "index document unavailable");
            server_error()
        }
    }
}

fn with_content_type(mut response: Response, mime: &'static str) -> Response {
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    response
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, FALLBACK_CONTENT_TYPE)],
        "Server error.",
    )
        .into_response()
}

use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// URL prefix user-uploaded files are served under.
pub const UPLOADS_PREFIX: &str = "/uploads";

fn is_upload_path(path: &str) -> bool {
    path.strip_prefix(UPLOADS_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'))
}

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_upload = is_upload_path(req.uri().path());

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    if is_upload {
        // Uploads stay viewable inline (PDFs, images), but any HTML among them
        // runs in an opaque origin without scripts.
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static("sandbox"),
        );
        headers.insert(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("SAMEORIGIN"),
        );
    } else {
        // JSON API responses never need to load or be framed by anything.
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
        headers.insert(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        );
    }

    response
}

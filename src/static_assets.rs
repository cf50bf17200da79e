use anyhow::Result;
use axum::extract::Request;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::middleware::{from_fn, Next};
use axum::response::Html;
use axum::response::Response;
use axum::routing::get_service;
use axum::{routing::get, Router};
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};

const LANDING_PAGE: &str = "welcome.html";
const VIEWER_PAGE: &str = "index.html";
const ASSET_DIR: &str = "static";

const PLACEHOLDER_LANDING: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>District Atlas</title>
  </head>
  <body style="font-family: system-ui; padding: 24px">
    <h1>District Atlas</h1>
    <p>Land cover, terrain and water layers for Indian districts. Open the <a href="/app">map viewer</a>.</p>
    <p>This is a placeholder page. Provide <code>--static-root</code> to serve the real pages.</p>
  </body>
</html>
"#;

const PLACEHOLDER_VIEWER: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>District Atlas viewer</title>
  </head>
  <body style="font-family: system-ui; padding: 24px">
    <h1>District Atlas viewer</h1>
    <p>No viewer build is installed. The JSON API is available at <code>/get_states</code>, <code>/get_districts/{state}</code> and <code>/generate_map_data</code>.</p>
  </body>
</html>
"#;

async fn apply_cache_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    if response.headers().contains_key(CACHE_CONTROL) {
        return response;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let cache_value = if content_type.starts_with("text/html") {
        // Pages reference tile templates that expire; never serve a stale shell.
        "no-store"
    } else {
        "public, max-age=86400"
    };

    if let Ok(value) = HeaderValue::from_str(cache_value) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }

    response
}

/// Landing page at `/`, viewer at `/app`, assets under `/static`.
pub fn service(static_root: Option<PathBuf>) -> Result<Router> {
    let router = if let Some(root) = static_root {
        if !root.exists() {
            anyhow::bail!("static_root not found at {}", root.display());
        }
        Router::new()
            .route("/", get_service(ServeFile::new(root.join(LANDING_PAGE))))
            .route("/app", get_service(ServeFile::new(root.join(VIEWER_PAGE))))
            .nest_service("/static", ServeDir::new(root.join(ASSET_DIR)))
            .layer(from_fn(apply_cache_headers))
    } else {
        async fn landing_handler() -> Html<&'static str> {
            Html(PLACEHOLDER_LANDING)
        }
        async fn viewer_handler() -> Html<&'static str> {
            Html(PLACEHOLDER_VIEWER)
        }

        Router::new()
            .route("/", get(landing_handler))
            .route("/app", get(viewer_handler))
    };
    Ok(router)
}

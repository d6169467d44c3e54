use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers;

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new().route("/apts", get(handlers::get_units));
    if state.notifier.is_some() {
        router = router.route("/chat", post(handlers::notify_chat));
    }

    router
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BotIdentity;
    use crate::core::notify::TelegramNotifier;
    use axum::http::{Method, StatusCode};
    use tower::util::ServiceExt;

    fn state(with_notifier: bool) -> AppState {
        let notifier = with_notifier.then(|| {
            TelegramNotifier::new(&BotIdentity {
                credential: "1:token".into(),
                destination_id: "42".into(),
            })
            .unwrap()
        });
        AppState::new(reqwest::Client::new(), notifier)
    }

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn units_requires_url() {
        let app = build_router(state(false));
        let (status, body) = call(app.clone(), Method::GET, "/apts").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("`url` query parameter is required"));

        let (status, _) = call(app, Method::GET, "/apts?url=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn units_rejects_invalid_and_unsupported_urls() {
        let app = build_router(state(false));

        let (status, body) = call(app.clone(), Method::GET, "/apts?url=nonsense").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("invalid URL"));

        let (status, body) = call(
            app,
            Method::GET,
            "/apts?url=https%3A%2F%2Fwww.zillow.com%2Fhomedetails%2F1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("unsupported host"));
    }

    #[tokio::test]
    async fn chat_is_only_mounted_with_notifications() {
        let (status, _) = call(build_router(state(false)), Method::POST, "/chat?url=x").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(build_router(state(true)), Method::POST, "/chat").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("`url` query parameter is required"));
    }

    #[tokio::test]
    async fn chat_scrape_failure_is_internal_error() {
        let (status, body) = call(
            build_router(state(true)),
            Method::POST,
            "/chat?url=https%3A%2F%2Fexample.com%2F",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("unsupported host"));
    }

    #[tokio::test]
    async fn security_headers_present_on_responses() {
        let req = Request::builder()
            .uri("/apts")
            .body(Body::empty())
            .unwrap();
        let resp = build_router(state(false)).oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
    }
}

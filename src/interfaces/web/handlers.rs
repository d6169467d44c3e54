use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::AppState;
use crate::core::listing::{self, ScrapeError};

#[derive(Debug, serde::Deserialize)]
pub struct ListingQuery {
    url: Option<String>,
}

impl ListingQuery {
    fn required_url(&self) -> Result<&str, Response> {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err((
                StatusCode::BAD_REQUEST,
                "`url` query parameter is required\n",
            )
                .into_response()),
        }
    }
}

fn scrape_failure(err: &ScrapeError) -> Response {
    let status = if err.is_client_error() {
        warn!(error = %err, "rejected listing url");
        StatusCode::BAD_REQUEST
    } else {
        error!(error = %err, "scrape failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, format!("{}\n", err)).into_response()
}

/// `GET /apts?url=` returns the current unit records as JSON.
pub async fn get_units(State(state): State<AppState>, Query(query): Query<ListingQuery>) -> Response {
    let url = match query.required_url() {
        Ok(url) => url,
        Err(response) => return response,
    };

    match listing::scrape(&state.client, url).await {
        Ok(listing) => Json(listing.units).into_response(),
        Err(err) => scrape_failure(&err),
    }
}

/// `POST /chat?url=` scrapes the listing and pushes a summary to Telegram.
pub async fn notify_chat(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Response {
    let url = match query.required_url() {
        Ok(url) => url,
        Err(response) => return response,
    };
    let Some(notifier) = state.notifier.as_ref() else {
        return (StatusCode::NOT_FOUND, "notifications are disabled\n").into_response();
    };

    let listing = match listing::scrape(&state.client, url).await {
        Ok(listing) => listing,
        Err(err) => {
            error!(error = %err, "scrape failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", err)).into_response();
        }
    };

    if let Err(err) = notifier.send(&listing).await {
        error!(error = %err, "notification failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", err)).into_response();
    }

    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")]).into_response()
}

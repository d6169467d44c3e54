//! Fetch a listing page and pull out the unit records embedded in its markup.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

/// The only listing site the scraper understands.
pub const SUPPORTED_HOST: &str = "www.apartments.com";

/// Units still without a move-in date carry this text.
const NOT_YET_AVAILABLE: &str = "Available Soon";

static RENTALS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rentals:\s*(\[.*?\])\s*,\s*disableMediaCascading").expect("valid rentals regex")
});

static LISTING_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"listingName:\s*'([^']+)'").expect("valid listing name regex")
});

/// One rentable unit as embedded in the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnitRecord {
    #[serde(default, alias = "name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, alias = "unitNumber", deserialize_with = "null_as_default")]
    pub unit_number: String,
    #[serde(default, alias = "beds", deserialize_with = "null_as_default")]
    pub beds: i64,
    #[serde(default, alias = "baths", deserialize_with = "null_as_default")]
    pub baths: f64,
    #[serde(default, alias = "squareFeet", deserialize_with = "null_as_default")]
    pub square_feet: f64,
    #[serde(default, alias = "rent", deserialize_with = "null_as_default")]
    pub rent: f64,
    #[serde(
        default,
        alias = "availableDateText",
        deserialize_with = "null_as_default"
    )]
    pub available_date_text: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    /// Empty when the page does not name the property.
    pub name: String,
    pub units: Vec<UnitRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported host: {0}")]
    UnsupportedHost(String),
    #[error("sending HTTP request to {host} failed: {source}")]
    Network {
        host: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("received status {0} from the listing site")]
    Status(u16),
    #[error("parsing json: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Errors caused by the caller's input rather than the upstream site.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ScrapeError::InvalidUrl(_) | ScrapeError::UnsupportedHost(_))
    }
}

/// Fetch `raw_url` and return the units currently worth reporting.
pub async fn scrape(client: &reqwest::Client, raw_url: &str) -> Result<Listing, ScrapeError> {
    let url = url::Url::parse(raw_url)?;
    let host = url.host_str().unwrap_or_default().to_string();
    if host != SUPPORTED_HOST {
        return Err(ScrapeError::UnsupportedHost(host));
    }

    let body = fetch_page(client, url).await?;
    let listing = extract_listing(&body)?;
    info!(
        listing = %listing.name,
        units = listing.units.len(),
        "scraped listing"
    );
    Ok(listing)
}

pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    url: url::Url,
) -> Result<String, ScrapeError> {
    let host = url.host_str().unwrap_or_default().to_string();
    let network = |source| ScrapeError::Network {
        host: host.clone(),
        source,
    };

    let response = client.get(url).send().await.map_err(network)?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(ScrapeError::Status(status.as_u16()));
    }
    response.text().await.map_err(network)
}

/// Extract and filter the embedded unit records from page markup.
///
/// A page without a rentals block yields an empty listing. A listing with
/// exactly one unit is usually a whole home and is returned unfiltered;
/// otherwise only numbered units with a concrete availability are kept.
pub fn extract_listing(body: &str) -> Result<Listing, ScrapeError> {
    let Some(rentals) = RENTALS_PATTERN.captures(body).and_then(|c| c.get(1)) else {
        debug!("no rentals block found in page");
        return Ok(Listing::default());
    };

    let name = LISTING_NAME_PATTERN
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let units: Vec<UnitRecord> = serde_json::from_str(rentals.as_str())?;
    if units.len() == 1 {
        return Ok(Listing { name, units });
    }

    let units = units
        .into_iter()
        .filter(|unit| !unit.unit_number.is_empty() && unit.available_date_text != NOT_YET_AVAILABLE)
        .collect();
    Ok(Listing { name, units })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pages embed the rentals array on a single line.
    fn page(rentals: &str) -> String {
        let rentals = rentals.replace('\n', "");
        format!(
            "<script>window.data = {{ listingName: 'Maple Court', rentals: {rentals}, disableMediaCascading: false }};</script>"
        )
    }

    #[test]
    fn keeps_numbered_available_units() {
        let body = page(
            r#"[
                {"Name":"A1","UnitNumber":"101","Beds":1,"Baths":1.0,"SquareFeet":650,"Rent":1500,"AvailableDateText":"Now"},
                {"Name":"A2","UnitNumber":"","Beds":1,"Baths":1.0,"SquareFeet":650,"Rent":1500,"AvailableDateText":"Now"},
                {"Name":"B1","UnitNumber":"202","Beds":2,"Baths":2.0,"SquareFeet":900,"Rent":2100,"AvailableDateText":"Available Soon"},
                {"Name":"B2","UnitNumber":"203","Beds":2,"Baths":1.5,"SquareFeet":880,"Rent":1995.5,"AvailableDateText":"Nov 1"}
            ]"#,
        );

        let listing = extract_listing(&body).unwrap();
        assert_eq!(listing.name, "Maple Court");
        let numbers: Vec<_> = listing.units.iter().map(|u| u.unit_number.as_str()).collect();
        assert_eq!(numbers, ["101", "203"]);
        assert_eq!(listing.units[1].baths, 1.5);
        assert_eq!(listing.units[1].rent, 1995.5);
    }

    #[test]
    fn single_unit_is_returned_unfiltered() {
        let body = page(r#"[{"Name":"","UnitNumber":"","Beds":3,"AvailableDateText":"Available Soon"}]"#);
        let listing = extract_listing(&body).unwrap();
        assert_eq!(listing.units.len(), 1);
        assert_eq!(listing.units[0].beds, 3);
    }

    #[test]
    fn camel_case_and_null_fields_decode() {
        let body = page(
            r#"[{"name":"C","unitNumber":"7","beds":null,"baths":2,"squareFeet":null,"rent":1200,"availableDateText":"Now","extra":true}]"#,
        );
        let unit = &extract_listing(&body).unwrap().units[0];
        assert_eq!(unit.unit_number, "7");
        assert_eq!(unit.beds, 0);
        assert_eq!(unit.square_feet, 0.0);
        assert_eq!(unit.baths, 2.0);
    }

    #[test]
    fn missing_rentals_block_is_empty() {
        let listing = extract_listing("<html>captcha</html>").unwrap();
        assert_eq!(listing, Listing::default());
    }

    #[test]
    fn malformed_rentals_is_a_parse_error() {
        let err = extract_listing(&page(r#"[{"Beds":"two"}]"#)).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn serializes_with_page_field_names() {
        let json = serde_json::to_value(UnitRecord {
            unit_number: "9".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["UnitNumber"], "9");
        assert!(json.get("AvailableDateText").is_some());
    }

    #[tokio::test]
    async fn rejects_bad_urls_before_fetching() {
        let client = reqwest::Client::new();

        let err = scrape(&client, "not a url").await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl(_)));
        assert!(err.to_string().starts_with("invalid URL"));

        let err = scrape(&client, "https://www.zillow.com/homedetails/1")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::UnsupportedHost(ref h) if h == "www.zillow.com"));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn non_ok_status_is_reported() {
        use axum::{Router, http::StatusCode, routing::get};

        let app = Router::new().route("/listing", get(|| async { StatusCode::FORBIDDEN }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let url = url::Url::parse(&format!("http://{}/listing", addr)).unwrap();
        let err = fetch_page(&reqwest::Client::new(), url).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Status(403)));
    }
}

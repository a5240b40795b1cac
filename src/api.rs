//! HTTP client for the shop locator backend.
//!
//! Covers every endpoint the map talks to: shop snapshots, geocoding,
//! product search, report submission and platform stats. Requires the
//! `http` feature.

use crate::error::{Result, ShopMapError};
use crate::source::{FetchError, ShopQuery};
use geo::Point;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shopmap_types::{PlaceMatch, PlatformStats, ProductMatch, ReportRequest, ShopPoint};
use std::time::Duration;

/// Shortest product query sent to the search endpoint.
pub const MIN_SEARCH_LEN: usize = 2;

/// Header carrying the anti-forgery token on report submission.
pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Deserialize)]
struct ShopsResponse {
    #[serde(default)]
    shops: Vec<ShopPoint>,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<ProductMatch>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    city: String,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    report_id: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Confirmation of an accepted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportReceipt {
    pub report_id: Option<u64>,
    pub message: String,
}

/// Async client for the backend API.
///
/// `base_url` is the API root, e.g. `http://127.0.0.1:8000/api`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ShopMapError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("shopmap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use an already configured `reqwest` client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.client.get(self.url(path)).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ShopMapError::Service(format!(
                "GET /{} returned HTTP {}",
                path, status
            )));
        }
        Ok(response.json().await?)
    }

    /// Shops around the query center, as the map's data source.
    ///
    /// Errors are reported as [`FetchError`] so the result can be handed
    /// straight to `MapSession::complete_fetch`.
    pub async fn fetch_shops(
        &self,
        query: &ShopQuery,
    ) -> std::result::Result<Vec<ShopPoint>, FetchError> {
        let mut params = vec![
            ("lat", query.center.y().to_string()),
            ("lon", query.center.x().to_string()),
            ("zoom", query.zoom.to_string()),
        ];
        push_user_location(&mut params, query.user_location);
        if let Some(products) = &query.products {
            params.push(("products", products.clone()));
        }

        let response = self
            .client
            .get(self.url("smart-shops/"))
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ShopsResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        log::debug!(
            "Fetched {} shops around ({}, {}) at zoom {}",
            body.shops.len(),
            query.center.y(),
            query.center.x(),
            query.zoom
        );
        Ok(body.shops)
    }

    /// Same as [`fetch_shops`](Self::fetch_shops) with the crate error type.
    pub async fn smart_shops(&self, query: &ShopQuery) -> Result<Vec<ShopPoint>> {
        Ok(self.fetch_shops(query).await?)
    }

    /// Every known shop, for the initial load and the facet lists.
    pub async fn all_shops(
        &self,
        user_location: Option<Point<f64>>,
        products: Option<&str>,
    ) -> Result<Vec<ShopPoint>> {
        let mut params = Vec::new();
        push_user_location(&mut params, user_location);
        if let Some(products) = products.filter(|p| !p.is_empty()) {
            params.push(("products", products.to_string()));
        }

        let body: ShopsResponse = self.get_json("all-shops/", &params).await?;
        Ok(body.shops)
    }

    /// Look a city up by name. `Ok(None)` when the service knows no such place.
    pub async fn geocode(&self, city: &str) -> Result<Option<PlaceMatch>> {
        let city = city.trim();
        if city.is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(self.url("geocode/"))
            .query(&[("city", city)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ShopMapError::Service(format!(
                "Geocoding '{}' failed with HTTP {}",
                city, status
            )));
        }

        let body: GeocodeResponse = response.json().await?;
        Ok(match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Some(PlaceMatch {
                city: if body.city.is_empty() {
                    city.to_string()
                } else {
                    body.city
                },
                lat,
                lon,
                display_name: body.display_name,
            }),
            _ => None,
        })
    }

    /// Product suggestions for a free-text query.
    ///
    /// Queries shorter than [`MIN_SEARCH_LEN`] characters return nothing
    /// without contacting the service.
    pub async fn search_products(&self, query: &str) -> Result<Vec<ProductMatch>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }

        let body: ProductsResponse = self
            .get_json("search-products/", &[("q", query.to_string())])
            .await?;
        Ok(body.products)
    }

    /// Anti-forgery token required by [`submit_report`](Self::submit_report).
    pub async fn csrf_token(&self) -> Result<String> {
        let body: CsrfResponse = self.get_json("csrf-token/", &[]).await?;
        Ok(body.csrf_token)
    }

    /// Submit a problem report.
    ///
    /// The payload is validated locally first. A response with
    /// `"success": false` is returned as [`ShopMapError::Service`].
    pub async fn submit_report(
        &self,
        report: &ReportRequest,
        csrf_token: &str,
    ) -> Result<ReportReceipt> {
        report.validate().map_err(ShopMapError::InvalidInput)?;
        if csrf_token.is_empty() {
            return Err(ShopMapError::InvalidInput(
                "A security token is required to submit a report".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.url("submit-report/"))
            .header(CSRF_HEADER, csrf_token)
            .json(report)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            #[derive(Deserialize)]
            struct ErrorBody {
                message: Option<String>,
                error: Option<String>,
            }

            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message.or(body.error));
            return Err(ShopMapError::Service(
                detail.unwrap_or_else(|| format!("Report submission failed with HTTP {}", status)),
            ));
        }

        let body: ReportResponse = response.json().await?;
        if !body.success {
            return Err(ShopMapError::Service(
                body.error
                    .unwrap_or_else(|| "Report was rejected".to_string()),
            ));
        }

        log::info!("Report accepted (id {:?})", body.report_id);
        Ok(ReportReceipt {
            report_id: body.report_id,
            message: body.message.unwrap_or_default(),
        })
    }

    /// Shop and product totals.
    pub async fn platform_stats(&self) -> Result<PlatformStats> {
        self.get_json("stats/", &[]).await
    }
}

fn push_user_location(params: &mut Vec<(&'static str, String)>, location: Option<Point<f64>>) {
    if let Some(user) = location {
        params.push(("user_lat", user.y().to_string()));
        params.push(("user_lon", user.x().to_string()));
    }
}

//! External catalog API client
//!
//! Wraps the affiliate item-search endpoint: builds authenticated,
//! parameterized requests and maps HTTP outcomes onto the crate error
//! taxonomy. Transport failures become `Error::Network`, a 400 becomes
//! `Error::BadRequest`, any other non-200 becomes `Error::Unhandled`.

use crate::time::format_gte_date;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.dmm.com/affiliate/v3/ItemList";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upstream per-call maximum for `hits`; larger requests are clamped
pub const MAX_HITS: u32 = 100;

/// Sort mode accepted by the item-search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Popularity ranking
    Rank,
    /// Release date, newest first
    Date,
}

impl SortOrder {
    fn as_param(self) -> &'static str {
        match self {
            SortOrder::Rank => "rank",
            SortOrder::Date => "date",
        }
    }
}

/// Restrict results to items related to a given entity id
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    /// Filter kind as the upstream names it (e.g. "maker", "genre")
    pub kind: String,
    pub id: i64,
}

impl ArticleFilter {
    pub fn maker(id: i64) -> Self {
        Self {
            kind: "maker".to_string(),
            id,
        }
    }
}

/// Item-search request descriptor
#[derive(Debug, Clone)]
pub struct ItemRequest {
    pub site: String,
    pub service: String,
    pub floor: String,
    pub sort: SortOrder,
    pub hits: u32,
    pub filters: Vec<ArticleFilter>,
    /// Inclusive lower bound on release date/time, local, no timezone
    pub gte_date: Option<NaiveDateTime>,
}

/// Raw catalog item as the upstream returns it. Numeric-looking fields
/// arrive as strings and are coerced by the normalizer, not here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawItem {
    pub content_id: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub volume: Option<String>,
    #[serde(rename = "affiliateURL")]
    pub affiliate_url: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<RawImageUrl>,
    pub prices: Option<RawPrices>,
    pub review: Option<RawReview>,
    pub iteminfo: Option<RawItemInfo>,
    #[serde(rename = "sampleImageURL")]
    pub sample_image_url: Option<RawSampleImages>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawImageUrl {
    pub list: Option<String>,
    pub small: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPrices {
    pub price: Option<String>,
    pub list_price: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawReview {
    pub count: Option<i64>,
    pub average: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawItemInfo {
    #[serde(default)]
    pub maker: Vec<RawEntityRef>,
    #[serde(default)]
    pub genre: Vec<RawEntityRef>,
    #[serde(default)]
    pub series: Vec<RawEntityRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawEntityRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSampleImages {
    pub sample_s: Option<RawImageList>,
    pub sample_l: Option<RawImageList>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawImageList {
    #[serde(default)]
    pub image: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: ApiResultBody,
}

#[derive(Debug, Deserialize)]
struct ApiResultBody {
    items: Option<Vec<RawItem>>,
}

/// Catalog API client
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    api_id: String,
    affiliate_id: String,
}

impl CatalogClient {
    pub fn new(api_id: &str, affiliate_id: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_id: api_id.to_string(),
            affiliate_id: affiliate_id.to_string(),
        })
    }

    /// Search catalog items matching the request descriptor
    pub async fn search_items(&self, request: &ItemRequest) -> Result<Vec<RawItem>> {
        let query = self.build_query(request);

        tracing::debug!(
            floor = %request.floor,
            sort = request.sort.as_param(),
            hits = request.hits,
            filters = request.filters.len(),
            "querying catalog API"
        );

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::BadRequest(body));
        }

        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Unhandled {
                status: status.as_u16(),
                body,
            });
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        let items = body.result.items.unwrap_or_default();
        tracing::debug!(items = items.len(), "catalog API returned");
        Ok(items)
    }

    /// Serialize the descriptor into query parameters.
    ///
    /// Exactly one filter is encoded flat (`article`, `article_id`); two or
    /// more are encoded indexed (`article[0]`, `article_id[0]`, ...). The
    /// upstream expects this asymmetry.
    fn build_query(&self, request: &ItemRequest) -> Vec<(String, String)> {
        let mut query = vec![
            ("api_id".to_string(), self.api_id.clone()),
            ("affiliate_id".to_string(), self.affiliate_id.clone()),
            ("site".to_string(), request.site.clone()),
            ("service".to_string(), request.service.clone()),
            ("floor".to_string(), request.floor.clone()),
            ("sort".to_string(), request.sort.as_param().to_string()),
            (
                "hits".to_string(),
                request.hits.min(MAX_HITS).to_string(),
            ),
        ];

        if let Some(gte_date) = request.gte_date {
            query.push(("gte_date".to_string(), format_gte_date(gte_date)));
        }

        match request.filters.as_slice() {
            [] => {}
            [filter] => {
                query.push(("article".to_string(), filter.kind.clone()));
                query.push(("article_id".to_string(), filter.id.to_string()));
            }
            filters => {
                for (i, filter) in filters.iter().enumerate() {
                    query.push((format!("article[{i}]"), filter.kind.clone()));
                    query.push((format!("article_id[{i}]"), filter.id.to_string()));
                }
            }
        }

        query.push(("output".to_string(), "json".to_string()));
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client() -> CatalogClient {
        CatalogClient::new("test-api-id", "test-affiliate-id").unwrap()
    }

    fn request() -> ItemRequest {
        ItemRequest {
            site: "FANZA".into(),
            service: "doujin".into(),
            floor: "digital_doujin".into(),
            sort: SortOrder::Rank,
            hits: 50,
            filters: vec![],
            gte_date: None,
        }
    }

    fn lookup<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_base_parameters() {
        let query = client().build_query(&request());
        assert_eq!(lookup(&query, "api_id"), Some("test-api-id"));
        assert_eq!(lookup(&query, "affiliate_id"), Some("test-affiliate-id"));
        assert_eq!(lookup(&query, "site"), Some("FANZA"));
        assert_eq!(lookup(&query, "sort"), Some("rank"));
        assert_eq!(lookup(&query, "hits"), Some("50"));
        assert_eq!(lookup(&query, "output"), Some("json"));
        assert_eq!(lookup(&query, "gte_date"), None);
        assert_eq!(lookup(&query, "article"), None);
    }

    #[test]
    fn test_hits_clamped_to_upstream_cap() {
        let mut req = request();
        req.hits = 500;
        let query = client().build_query(&req);
        assert_eq!(lookup(&query, "hits"), Some("100"));
    }

    #[test]
    fn test_single_filter_uses_flat_encoding() {
        let mut req = request();
        req.filters = vec![ArticleFilter::maker(12345)];
        let query = client().build_query(&req);
        assert_eq!(lookup(&query, "article"), Some("maker"));
        assert_eq!(lookup(&query, "article_id"), Some("12345"));
        assert_eq!(lookup(&query, "article[0]"), None);
    }

    #[test]
    fn test_multiple_filters_use_indexed_encoding() {
        let mut req = request();
        req.filters = vec![
            ArticleFilter::maker(1),
            ArticleFilter {
                kind: "genre".into(),
                id: 2,
            },
        ];
        let query = client().build_query(&req);
        assert_eq!(lookup(&query, "article"), None);
        assert_eq!(lookup(&query, "article[0]"), Some("maker"));
        assert_eq!(lookup(&query, "article_id[0]"), Some("1"));
        assert_eq!(lookup(&query, "article[1]"), Some("genre"));
        assert_eq!(lookup(&query, "article_id[1]"), Some("2"));
    }

    #[test]
    fn test_gte_date_formatting() {
        let mut req = request();
        req.sort = SortOrder::Date;
        req.gte_date = Some(
            NaiveDate::from_ymd_opt(2024, 3, 8)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        );
        let query = client().build_query(&req);
        assert_eq!(lookup(&query, "sort"), Some("date"));
        assert_eq!(lookup(&query, "gte_date"), Some("2024-03-08T10:30:00"));
    }

    #[test]
    fn test_response_body_unwraps_to_items() {
        let body = serde_json::json!({
            "result": {
                "status": 200,
                "result_count": 1,
                "items": [{
                    "content_id": "d_123",
                    "title": "T",
                    "date": "2024-03-01 10:00:00",
                    "prices": { "price": "770", "list_price": "1100" }
                }]
            }
        });
        let parsed: ApiResponse = serde_json::from_value(body).unwrap();
        let items = parsed.result.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content_id.as_deref(), Some("d_123"));
    }

    #[test]
    fn test_response_without_items_is_empty() {
        let body = serde_json::json!({ "result": { "status": 200, "result_count": 0 } });
        let parsed: ApiResponse = serde_json::from_value(body).unwrap();
        assert!(parsed.result.items.unwrap_or_default().is_empty());
    }
}

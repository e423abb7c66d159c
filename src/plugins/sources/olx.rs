use crate::config::OlxConfig;
use crate::models::{Listing, Platform};
use crate::plugins::traits::ListingSource;
use crate::utils::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

const LISTING_SEARCH_QUERY: &str = r#"query ListingSearchQuery(
  $searchParameters: [SearchParameter!] = {key: "", value: ""}
) {
  clientCompatibleListings(searchParameters: $searchParameters) {
    __typename
    ... on ListingSuccess {
      __typename
      data {
        id
        title
        url
        params {
          key
          name
          type
          value {
            __typename
            ... on PriceParam {
              value
              currency
              negotiable
              label
            }
            ... on GenericParam {
              key
              label
            }
          }
        }
      }
      metadata {
        total_elements
      }
    }
    ... on ListingError {
      __typename
      error {
        code
        detail
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "clientCompatibleListings")]
    client_compatible_listings: Option<ListingsResult>,
}

#[derive(Debug, Deserialize)]
struct ListingsResult {
    #[serde(rename = "__typename")]
    typename: String,
    #[serde(default)]
    data: Vec<RawListing>,
    error: Option<ListingErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ListingErrorBody {
    code: Option<serde_json::Value>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawListing {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    params: Vec<RawParam>,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    key: Option<String>,
    value: Option<serde_json::Value>,
}

/// Pull `(price, currency)` out of the first `price` param typed as `PriceParam`.
fn extract_price(params: &[RawParam]) -> Option<(Decimal, Option<String>)> {
    let value = params
        .iter()
        .filter(|p| p.key.as_deref() == Some("price"))
        .filter_map(|p| p.value.as_ref())
        .find(|v| v.get("__typename").and_then(|t| t.as_str()) == Some("PriceParam"))?;

    let price = match value.get("value")? {
        serde_json::Value::Number(n) => n.to_string().parse::<Decimal>().ok()?,
        serde_json::Value::String(s) => s.parse::<Decimal>().ok()?,
        _ => return None,
    };
    let currency = value
        .get("currency")
        .and_then(|c| c.as_str())
        .map(|c| c.to_string());

    Some((price, currency))
}

/// Turn an OLX GraphQL response body into listings.
///
/// Items lacking a title, URL or price are dropped. A response that is not a
/// `ListingSuccess` is an error.
pub fn parse_listings(body: &serde_json::Value) -> Result<Vec<Listing>, AppError> {
    let response: GraphQlResponse = serde_json::from_value(body.clone())?;

    let result = response
        .data
        .and_then(|d| d.client_compatible_listings)
        .ok_or_else(|| AppError::Parse {
            message: "OLX response has no clientCompatibleListings".to_string(),
        })?;

    if result.typename != "ListingSuccess" {
        let detail = result
            .error
            .map(|e| {
                format!(
                    "{} ({})",
                    e.detail.unwrap_or_default(),
                    e.code.map(|c| c.to_string()).unwrap_or_default()
                )
            })
            .unwrap_or_default();
        return Err(AppError::Parse {
            message: format!("OLX returned {}: {}", result.typename, detail),
        });
    }

    let listings = result
        .data
        .into_iter()
        .filter_map(|item| {
            let (price, currency) = extract_price(&item.params)?;
            Some(Listing {
                title: item.title.filter(|t| !t.is_empty())?,
                url: item.url.filter(|u| !u.is_empty())?,
                price: Some(price),
                currency,
            })
        })
        .collect();

    Ok(listings)
}

pub struct OlxSource {
    client: Client,
    config: OlxConfig,
}

impl OlxSource {
    pub fn new(config: OlxConfig) -> Result<Self, AppError> {
        let client = Client::builder().user_agent(config.user_agent.clone()).build()?;
        Ok(Self { client, config })
    }

    fn create_payload(&self, query: &str) -> serde_json::Value {
        json!({
            "query": LISTING_SEARCH_QUERY,
            "variables": {
                "searchParameters": [
                    {"key": "offset", "value": "0"},
                    {"key": "limit", "value": self.config.page_limit.to_string()},
                    {"key": "query", "value": query},
                    {"key": "filter_refiners", "value": "spell_checker"},
                    {"key": "suggest_filters", "value": "true"}
                ]
            }
        })
    }

    fn referer(&self, query: &str) -> String {
        format!(
            "{}/oferty/q-{}/",
            self.config.base_url.trim_end_matches('/'),
            query.replace(' ', "-")
        )
    }

    async fn fetch(&self, query: &str) -> Result<serde_json::Value, AppError> {
        let endpoint = format!("{}/apigateway/graphql", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&endpoint)
            .header("accept", "application/json")
            .header("accept-language", "pl")
            .header("origin", self.config.base_url.trim_end_matches('/'))
            .header("referer", self.referer(query))
            .json(&self.create_payload(query))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<serde_json::Value>().await?)
    }
}

#[async_trait]
impl ListingSource for OlxSource {
    fn name(&self) -> &'static str {
        "OLX"
    }

    fn platform(&self) -> Platform {
        Platform::Olx
    }

    async fn search(&self, query: &str) -> Result<Vec<Listing>, AppError> {
        let strategy = FixedInterval::new(Duration::from_millis(self.config.retry_delay_ms))
            .take(self.config.retry_attempts as usize);

        let body = Retry::spawn(strategy, || async move {
            self.fetch(query).await.inspect_err(|e| {
                tracing::debug!("OLX request for '{}' failed: {}", query, e);
            })
        })
        .await?;

        let listings = parse_listings(&body)?;
        tracing::debug!("OLX returned {} priced listings for '{}'", listings.len(), query);
        Ok(listings)
    }
}

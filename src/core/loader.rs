//! Bulk loaders: sources of the initial full token list.
//!
//! A loader is opaque to the store: it either returns a complete list of
//! valid records or fails. [`load_into`] applies the outcome, so a failed
//! load sets the store error and never leaves partial data behind.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{ApiConfig, CatalogConfig, CatalogSource};
use crate::core::envelope::ApiResponse;
use crate::core::fixtures;
use crate::core::projection::Page;
use crate::core::store::{write_store, ChangeSet, SharedStore};
use crate::core::types::TokenRecord;
use crate::error::AppError;

/// Upper bound on pages fetched by [`RestLoader`], guarding against an
/// upstream that never reports `hasMore: false`.
const MAX_PAGES: usize = 1_000;

/// Source of a complete token list.
#[async_trait]
pub trait TokenLoader: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Fetch every record.
    async fn load(&self) -> Result<Vec<TokenRecord>, AppError>;
}

// =============================================================================
// Fixture loader
// =============================================================================

/// Generated fixture catalogue behind a simulated network delay.
#[derive(Debug, Clone)]
pub struct FixtureLoader {
    seed: Option<u64>,
    latency: Duration,
}

impl FixtureLoader {
    pub fn new(seed: Option<u64>, latency: Duration) -> Self {
        Self { seed, latency }
    }
}

#[async_trait]
impl TokenLoader for FixtureLoader {
    fn name(&self) -> &'static str {
        "fixtures"
    }

    async fn load(&self) -> Result<Vec<TokenRecord>, AppError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(fixtures::generate(self.seed))
    }
}

// =============================================================================
// REST loader
// =============================================================================

/// Pages through another board's `GET /tokens`.
#[derive(Debug, Clone)]
pub struct RestLoader {
    client: reqwest::Client,
    base_url: String,
    page_size: usize,
}

impl RestLoader {
    pub fn new(base_url: impl Into<String>, page_size: usize) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
        })
    }

    async fn fetch_page(&self, page: usize) -> Result<Page<TokenRecord>, AppError> {
        let url = format!("{}/tokens", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("pageSize", self.page_size)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let envelope: ApiResponse<Page<TokenRecord>> = serde_json::from_str(&body)
            .map_err(|e| AppError::Load(format!("{} page {}: invalid body ({})", url, page, e)))?;

        if !status.is_success() || !envelope.success {
            let message = envelope
                .error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| "no error body".to_string());
            return Err(AppError::Load(format!("{} returned {}: {}", url, status, message)));
        }

        envelope
            .data
            .ok_or_else(|| AppError::Load(format!("{} page {}: missing data", url, page)))
    }
}

#[async_trait]
impl TokenLoader for RestLoader {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn load(&self) -> Result<Vec<TokenRecord>, AppError> {
        let mut records = Vec::new();
        for page in 1..=MAX_PAGES {
            let batch = self.fetch_page(page).await?;
            records.extend(batch.items);
            if !batch.has_more {
                return Ok(records);
            }
        }
        Err(AppError::Load(format!(
            "{}/tokens kept reporting more pages after {}",
            self.base_url, MAX_PAGES
        )))
    }
}

/// Build the loader the catalogue config asks for.
pub fn loader_from_config(
    catalog: &CatalogConfig,
    api: &ApiConfig,
) -> Result<Box<dyn TokenLoader>, AppError> {
    match catalog.source {
        CatalogSource::Fixtures => Ok(Box::new(FixtureLoader::new(
            catalog.seed,
            Duration::from_millis(catalog.latency_ms),
        ))),
        CatalogSource::Rest => {
            let url = catalog.rest_url.as_deref().ok_or_else(|| {
                AppError::Config("catalog.rest_url is required for the rest source".to_string())
            })?;
            Ok(Box::new(RestLoader::new(url, api.max_page_size)?))
        }
    }
}

/// Run a loader and apply its result to the store.
///
/// On success the store is replaced wholesale. On failure (including any
/// invalid record) the store error is set, loading is cleared and existing
/// data is kept.
pub async fn load_into(store: &SharedStore, loader: &dyn TokenLoader) -> Result<ChangeSet, AppError> {
    write_store(store).begin_load();

    let outcome = loader.load().await.and_then(|records| {
        records
            .iter()
            .try_for_each(|r| r.validate())
            .map_err(AppError::Load)?;
        Ok(records)
    });

    let mut guard = write_store(store);
    match outcome {
        Ok(records) => {
            let change = guard.replace_all(records);
            info!(
                loader = loader.name(),
                tokens = guard.len(),
                version = change.version,
                "Token catalogue loaded"
            );
            Ok(change)
        }
        Err(e) => {
            warn!(loader = loader.name(), error = %e, "Token catalogue load failed");
            guard.fail_load(e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{read_store, TokenStore};
    use crate::core::types::test_support::token;
    use crate::core::types::TokenStatus;

    struct FailingLoader;

    #[async_trait]
    impl TokenLoader for FailingLoader {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn load(&self) -> Result<Vec<TokenRecord>, AppError> {
            Err(AppError::Load("upstream unavailable".into()))
        }
    }

    struct StaticLoader(Vec<TokenRecord>);

    #[async_trait]
    impl TokenLoader for StaticLoader {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn load(&self) -> Result<Vec<TokenRecord>, AppError> {
            Ok(self.0.clone())
        }
    }

    fn seeded_store() -> SharedStore {
        let mut store = TokenStore::new();
        store.replace_all(vec![token("old", TokenStatus::New, 1.0)]);
        store.shared()
    }

    #[tokio::test]
    async fn test_fixture_loader_fills_store() {
        let store = TokenStore::new().shared();
        let loader = FixtureLoader::new(Some(5), Duration::ZERO);
        let change = load_into(&store, &loader).await.unwrap();

        let guard = read_store(&store);
        assert_eq!(guard.len(), fixtures::FIXTURE_COUNT);
        assert_eq!(change.ids.len(), fixtures::FIXTURE_COUNT);
        assert!(!guard.is_loading());
        assert!(guard.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixture_loader_waits_for_latency() {
        let loader = FixtureLoader::new(None, Duration::from_millis(300));
        let started = tokio::time::Instant::now();
        loader.load().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_data_and_sets_error() {
        let store = seeded_store();
        let result = load_into(&store, &FailingLoader).await;
        assert!(result.is_err());

        let guard = read_store(&store);
        assert_eq!(guard.len(), 1);
        assert!(guard.contains("old"));
        assert!(!guard.is_loading());
        assert!(guard.error().unwrap().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_invalid_record_rejects_whole_batch() {
        let store = seeded_store();
        let mut bad = token("bad", TokenStatus::New, 1.0);
        bad.liquidity = -5.0;
        let loader = StaticLoader(vec![token("good", TokenStatus::New, 1.0), bad]);

        assert!(load_into(&store, &loader).await.is_err());
        let guard = read_store(&store);
        assert!(guard.contains("old"));
        assert!(!guard.contains("good"));
    }

    #[tokio::test]
    async fn test_rest_loader_follows_pages() {
        let mut server = mockito::Server::new_async().await;

        let first = ApiResponse::ok(Page {
            items: vec![token("a", TokenStatus::New, 1.0), token("b", TokenStatus::New, 2.0)],
            total: 3,
            page: 1,
            page_size: 2,
            has_more: true,
        });
        let second = ApiResponse::ok(Page {
            items: vec![token("c", TokenStatus::Migrated, 3.0)],
            total: 3,
            page: 2,
            page_size: 2,
            has_more: false,
        });

        let page_one = server
            .mock("GET", "/tokens")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("page".into(), "1".into()),
                mockito::Matcher::UrlEncoded("pageSize".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(&first).unwrap())
            .create_async()
            .await;
        let page_two = server
            .mock("GET", "/tokens")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(&second).unwrap())
            .create_async()
            .await;

        let loader = RestLoader::new(server.url(), 2).unwrap();
        let records = loader.load().await.unwrap();

        page_one.assert_async().await;
        page_two.assert_async().await;
        let ids: Vec<&str> = records.iter().map(|t| t.id.as_ref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_rest_loader_error_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tokens")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"error":{"code":"INTERNAL_ERROR","message":"Failed to fetch tokens"}}"#)
            .create_async()
            .await;

        let store = seeded_store();
        let loader = RestLoader::new(server.url(), 20).unwrap();
        let err = load_into(&store, &loader).await.unwrap_err();

        mock.assert_async().await;
        assert!(err.to_string().contains("INTERNAL_ERROR"));
        assert!(read_store(&store).error().is_some());
        assert!(read_store(&store).contains("old"));
    }

    #[test]
    fn test_loader_from_config() {
        let api = ApiConfig::default();
        let loader = loader_from_config(&CatalogConfig::default(), &api).unwrap();
        assert_eq!(loader.name(), "fixtures");

        let catalog = CatalogConfig {
            source: CatalogSource::Rest,
            rest_url: Some("http://127.0.0.1:9".into()),
            ..Default::default()
        };
        assert_eq!(loader_from_config(&catalog, &api).unwrap().name(), "rest");
    }
}

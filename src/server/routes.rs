//! REST handlers.
//!
//! - `GET /health`: liveness plus store counters
//! - `GET /tokens?status=&chain=&page=&pageSize=`: paginated catalogue
//! - `GET /tokens/:id`: single token
//! - `GET /sections/:status?sort=&direction=&liquidityMin=&...`: board projection

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Serialize;
use tracing::debug;

use crate::config::{ApiConfig, ViewConfig};
use crate::core::envelope::ApiResponse;
use crate::core::projection::{
    project_store, CatalogQuery, Page, SortConfig, SortDirection, SortField, ViewSpec,
};
use crate::core::store::read_store;
use crate::core::types::{Chain, TokenRecord, TokenStatus};

use super::error::ApiError;
use super::AppState;

type Params = HashMap<String, String>;

// =============================================================================
// Parameter parsing
// =============================================================================

fn param<T: FromStr>(params: &Params, key: &str) -> Result<Option<T>, ApiError> {
    match params.get(key).map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            ApiError::InvalidParams(format!("Invalid value for '{}': {}", key, raw))
        }),
    }
}

fn number_param(params: &Params, key: &str) -> Result<Option<f64>, ApiError> {
    match param::<f64>(params, key)? {
        Some(v) if !v.is_finite() => Err(ApiError::InvalidParams(format!(
            "Invalid value for '{}': must be finite",
            key
        ))),
        other => Ok(other),
    }
}

/// Build a catalogue query. Page defaults to 1, page size to the configured
/// default; page size is capped at the configured maximum.
pub fn catalog_query(params: &Params, api: &ApiConfig) -> Result<CatalogQuery, ApiError> {
    let page = param::<usize>(params, "page")?.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::InvalidParams("'page' must be >= 1".to_string()));
    }
    let page_size = param::<usize>(params, "pageSize")?.unwrap_or(api.default_page_size);
    if page_size == 0 {
        return Err(ApiError::InvalidParams("'pageSize' must be >= 1".to_string()));
    }

    Ok(CatalogQuery {
        status: param::<TokenStatus>(params, "status")?,
        chain: param::<Chain>(params, "chain")?,
        page,
        page_size: page_size.min(api.max_page_size),
    })
}

/// Build a section view spec, starting from the board's configured sort and
/// filters and overriding whatever the query names.
pub fn section_spec(status: TokenStatus, params: &Params, view: &ViewConfig) -> Result<ViewSpec, ApiError> {
    let mut filters = view.filters.clone();

    if let Some(v) = param::<u32>(params, "ageMin")? {
        filters.age_min = v;
    }
    if let Some(v) = param::<u32>(params, "ageMax")? {
        filters.age_max = v;
    }
    let bounds: [(&str, &mut f64); 7] = [
        ("top10HoldersMax", &mut filters.top10_holders_max),
        ("devHoldingMax", &mut filters.dev_holding_max),
        ("snipersMax", &mut filters.snipers_max),
        ("insidersMax", &mut filters.insiders_max),
        ("liquidityMin", &mut filters.liquidity_min),
        ("volumeMin", &mut filters.volume_min),
        ("marketCapMin", &mut filters.market_cap_min),
    ];
    for (key, slot) in bounds {
        if let Some(v) = number_param(params, key)? {
            *slot = v;
        }
    }

    if let Some(raw) = params.get("chain").filter(|s| !s.trim().is_empty()) {
        filters.chains = raw
            .split(',')
            .map(|c| {
                c.trim()
                    .parse::<Chain>()
                    .map_err(|_| ApiError::InvalidParams(format!("Invalid value for 'chain': {}", c)))
            })
            .collect::<Result<_, _>>()?;
    }
    if let Some(search) = params.get("search").filter(|s| !s.trim().is_empty()) {
        filters.search = Some(search.clone());
    }

    let price = (number_param(params, "priceMin")?, number_param(params, "priceMax")?);
    if price.0.is_some() || price.1.is_some() {
        filters.price_range = Some([price.0.unwrap_or(0.0), price.1.unwrap_or(f64::MAX)]);
    }
    if let Some(max) = number_param(params, "volumeMax")? {
        filters.volume_range = Some([filters.volume_min, max]);
    }

    if filters.age_min > filters.age_max {
        return Err(ApiError::InvalidParams("'ageMin' must be <= 'ageMax'".to_string()));
    }

    let sort = SortConfig {
        field: param::<SortField>(params, "sort")?.unwrap_or(view.sort.field),
        direction: param::<SortDirection>(params, "direction")?.unwrap_or(view.sort.direction),
    };

    Ok(ViewSpec {
        status: Some(status),
        filters,
        sort,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health: server status
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = read_store(&state.store);
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "tokens": store.len(),
        "version": store.version(),
        "loading": store.is_loading(),
        "error": store.error(),
        "feed": state.pipeline.stats(),
    }))
}

/// GET /tokens: paginated catalogue
pub async fn tokens_handler(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<ApiResponse<Page<TokenRecord>>>, ApiError> {
    let query = catalog_query(&params, &state.config.api)?;
    let store = read_store(&state.store);

    if store.is_empty() {
        if let Some(error) = store.error() {
            return Err(ApiError::Internal(format!("Failed to fetch tokens: {}", error)));
        }
    }

    let page = query.run(&store);
    debug!(
        page = page.page,
        page_size = page.page_size,
        total = page.total,
        "Served token page"
    );
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /tokens/:id: single token
pub async fn token_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TokenRecord>>, ApiError> {
    let store = read_store(&state.store);
    store
        .get(&id)
        .cloned()
        .map(|token| Json(ApiResponse::ok(token)))
        .ok_or_else(|| ApiError::NotFound(format!("Token '{}' not found", id)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionData {
    pub status: TokenStatus,
    pub sort: SortConfig,
    pub total: usize,
    pub version: u64,
    pub items: Vec<TokenRecord>,
}

/// GET /sections/:status: one board section
pub async fn section_handler(
    State(state): State<AppState>,
    Path(status): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<ApiResponse<SectionData>>, ApiError> {
    let status = status
        .parse::<TokenStatus>()
        .map_err(ApiError::InvalidParams)?;
    let spec = section_spec(status, &params, &state.config.view)?;

    let (items, version) = {
        let store = read_store(&state.store);
        (project_store(&store, &spec), store.version())
    };

    Ok(Json(ApiResponse::ok(SectionData {
        status,
        sort: spec.sort,
        total: items.len(),
        version,
        items,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_catalog_query_defaults() {
        let query = catalog_query(&Params::new(), &ApiConfig::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 20);
        assert!(query.status.is_none() && query.chain.is_none());
    }

    #[test]
    fn test_catalog_query_parses_and_caps() {
        let query = catalog_query(
            &params(&[("status", "migrated"), ("chain", "eth"), ("page", "2"), ("pageSize", "5000")]),
            &ApiConfig::default(),
        )
        .unwrap();
        assert_eq!(query.status, Some(TokenStatus::Migrated));
        assert_eq!(query.chain, Some(Chain::Eth));
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 100);
    }

    #[test]
    fn test_catalog_query_rejects_bad_params() {
        let api = ApiConfig::default();
        for bad in [
            params(&[("page", "abc")]),
            params(&[("page", "0")]),
            params(&[("pageSize", "-3")]),
            params(&[("status", "listed")]),
            params(&[("chain", "DOGE")]),
        ] {
            let err = catalog_query(&bad, &api).unwrap_err();
            assert_eq!(err.code(), "INVALID_PARAMS", "params: {:?}", bad);
        }
    }

    #[test]
    fn test_section_spec_overrides() {
        let spec = section_spec(
            TokenStatus::New,
            &params(&[
                ("sort", "marketCap"),
                ("direction", "asc"),
                ("liquidityMin", "1000"),
                ("chain", "SOL,base"),
                ("priceMax", "100"),
            ]),
            &ViewConfig::default(),
        )
        .unwrap();

        assert_eq!(spec.status, Some(TokenStatus::New));
        assert_eq!(spec.sort, SortConfig::new(SortField::MarketCap, SortDirection::Asc));
        assert_eq!(spec.filters.liquidity_min, 1000.0);
        assert_eq!(spec.filters.chains, vec![Chain::Sol, Chain::Base]);
        assert_eq!(spec.filters.price_range, Some([0.0, 100.0]));
    }

    #[test]
    fn test_section_spec_rejects_bad_params() {
        let view = ViewConfig::default();
        for bad in [
            params(&[("sort", "bogus")]),
            params(&[("direction", "up")]),
            params(&[("liquidityMin", "NaN")]),
            params(&[("ageMin", "100"), ("ageMax", "10")]),
        ] {
            assert!(section_spec(TokenStatus::New, &bad, &view).is_err(), "params: {:?}", bad);
        }
    }
}

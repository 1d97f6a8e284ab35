//! View projection: per-section filtered and sorted token sequences.
//!
//! A projection is a pure function of (store contents, status, display
//! filters, sort config). [`SectionView`] caches the last result and only
//! recomputes when the store version or its own config generation moves.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::store::TokenStore;
use crate::core::types::{Chain, TokenRecord, TokenStatus};

// =============================================================================
// Sorting
// =============================================================================

/// Token field a section can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Symbol,
    Name,
    ContractAddress,
    Chain,
    Status,
    CurrentPrice,
    PriceChange24h,
    #[default]
    Volume24h,
    MarketCap,
    Liquidity,
    AgeMinutes,
    Top10HoldersPercent,
    DevHoldingPercent,
    SnipersPercent,
    InsidersPercent,
    CreatedAt,
    LastUpdateTime,
}

impl SortField {
    pub const ALL: [SortField; 17] = [
        SortField::Symbol,
        SortField::Name,
        SortField::ContractAddress,
        SortField::Chain,
        SortField::Status,
        SortField::CurrentPrice,
        SortField::PriceChange24h,
        SortField::Volume24h,
        SortField::MarketCap,
        SortField::Liquidity,
        SortField::AgeMinutes,
        SortField::Top10HoldersPercent,
        SortField::DevHoldingPercent,
        SortField::SnipersPercent,
        SortField::InsidersPercent,
        SortField::CreatedAt,
        SortField::LastUpdateTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Symbol => "symbol",
            SortField::Name => "name",
            SortField::ContractAddress => "contractAddress",
            SortField::Chain => "chain",
            SortField::Status => "status",
            SortField::CurrentPrice => "currentPrice",
            SortField::PriceChange24h => "priceChange24h",
            SortField::Volume24h => "volume24h",
            SortField::MarketCap => "marketCap",
            SortField::Liquidity => "liquidity",
            SortField::AgeMinutes => "ageMinutes",
            SortField::Top10HoldersPercent => "top10HoldersPercent",
            SortField::DevHoldingPercent => "devHoldingPercent",
            SortField::SnipersPercent => "snipersPercent",
            SortField::InsidersPercent => "insidersPercent",
            SortField::CreatedAt => "createdAt",
            SortField::LastUpdateTime => "lastUpdateTime",
        }
    }

    /// Next field in declaration order (wraps), for cycling in the dashboard.
    pub fn next(self) -> Self {
        let idx = SortField::ALL.iter().position(|f| *f == self).unwrap_or(0);
        SortField::ALL[(idx + 1) % SortField::ALL.len()]
    }

    fn key<'a>(&self, t: &'a TokenRecord) -> SortKey<'a> {
        match self {
            SortField::Symbol => SortKey::Text(Cow::Borrowed(&t.symbol)),
            SortField::Name => SortKey::Text(Cow::Borrowed(&t.name)),
            SortField::ContractAddress => SortKey::Text(Cow::Borrowed(&t.contract_address)),
            SortField::Chain => SortKey::Text(Cow::Borrowed(t.chain.as_str())),
            SortField::Status => SortKey::Text(Cow::Borrowed(t.status.as_str())),
            SortField::CurrentPrice => SortKey::Number(t.current_price),
            SortField::PriceChange24h => SortKey::Number(t.price_change_24h),
            SortField::Volume24h => SortKey::Number(t.volume_24h),
            SortField::MarketCap => SortKey::Number(t.market_cap),
            SortField::Liquidity => SortKey::Number(t.liquidity),
            SortField::AgeMinutes => SortKey::Number(f64::from(t.age_minutes)),
            SortField::Top10HoldersPercent => SortKey::Number(t.top10_holders_percent),
            SortField::DevHoldingPercent => SortKey::Number(t.dev_holding_percent),
            SortField::SnipersPercent => SortKey::Number(t.snipers_percent),
            SortField::InsidersPercent => SortKey::Number(t.insiders_percent),
            SortField::CreatedAt => SortKey::Number(t.created_at.timestamp_millis() as f64),
            SortField::LastUpdateTime => SortKey::Number(t.last_update_ms.unwrap_or(0) as f64),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown sort field '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// Sort field + direction. Defaults to 24h volume, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub field: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

enum SortKey<'a> {
    Text(Cow<'a, str>),
    Number(f64),
}

/// Base letter for the accented Latin letters, applied after lowercasing.
fn fold_accent(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' => 'd',
        'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ğ' => 'g',
        'ì'..='ï' | 'ī' | 'į' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' => 's',
        'ť' => 't',
        'ù'..='ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// Three-level collation for Latin text: base letters first, then
/// accents (unaccented before accented), then case (lower before upper).
/// Scripts outside Latin fall back to code point order.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let lower = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    let (la, lb) = (lower(a), lower(b));

    la.iter()
        .map(|&c| fold_accent(c))
        .cmp(lb.iter().map(|&c| fold_accent(c)))
        .then_with(|| la.cmp(&lb))
        .then_with(|| a.chars().map(char::is_uppercase).cmp(b.chars().map(char::is_uppercase)))
        .then_with(|| a.cmp(b))
}

fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => locale_compare(a, b),
        (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

impl SortConfig {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Comparator for a stable sort. Direction flips polarity only; equal
    /// keys keep their input order either way.
    pub fn compare(&self, a: &TokenRecord, b: &TokenRecord) -> Ordering {
        let ord = compare_keys(&self.field.key(a), &self.field.key(b));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Display filters applied to every section. A record passes only if it
/// satisfies every bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayFilters {
    pub age_min: u32,
    pub age_max: u32,
    pub top10_holders_max: f64,
    pub dev_holding_max: f64,
    pub snipers_max: f64,
    pub insiders_max: f64,
    pub liquidity_min: f64,
    pub volume_min: f64,
    pub market_cap_min: f64,
    /// Empty means every chain
    pub chains: Vec<Chain>,
    /// Case-insensitive substring of symbol, name or contract address
    pub search: Option<String>,
    /// Inclusive `[min, max]` on current price
    pub price_range: Option<[f64; 2]>,
    /// Inclusive `[min, max]` on 24h volume
    pub volume_range: Option<[f64; 2]>,
}

impl Default for DisplayFilters {
    fn default() -> Self {
        Self {
            age_min: 0,
            age_max: 1440,
            top10_holders_max: 100.0,
            dev_holding_max: 100.0,
            snipers_max: 100.0,
            insiders_max: 100.0,
            liquidity_min: 0.0,
            volume_min: 0.0,
            market_cap_min: 0.0,
            chains: Vec::new(),
            search: None,
            price_range: None,
            volume_range: None,
        }
    }
}

impl DisplayFilters {
    pub fn matches(&self, t: &TokenRecord) -> bool {
        t.age_minutes >= self.age_min
            && t.age_minutes <= self.age_max
            && t.top10_holders_percent <= self.top10_holders_max
            && t.dev_holding_percent <= self.dev_holding_max
            && t.snipers_percent <= self.snipers_max
            && t.insiders_percent <= self.insiders_max
            && t.liquidity >= self.liquidity_min
            && t.volume_24h >= self.volume_min
            && t.market_cap >= self.market_cap_min
            && (self.chains.is_empty() || self.chains.contains(&t.chain))
            && self.matches_search(t)
            && in_range(self.price_range, t.current_price)
            && in_range(self.volume_range, t.volume_24h)
    }

    fn matches_search(&self, t: &TokenRecord) -> bool {
        let query = match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return true,
        };
        t.symbol.to_lowercase().contains(&query)
            || t.name.to_lowercase().contains(&query)
            || t.contract_address.to_lowercase().contains(&query)
    }
}

fn in_range(range: Option<[f64; 2]>, value: f64) -> bool {
    range.map_or(true, |[min, max]| value >= min && value <= max)
}

// =============================================================================
// Projection
// =============================================================================

/// Everything that determines one section's contents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSpec {
    pub status: Option<TokenStatus>,
    pub filters: DisplayFilters,
    pub sort: SortConfig,
}

impl ViewSpec {
    pub fn for_status(status: TokenStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Filter by status, then by every display bound, then stable-sort.
pub fn project<'a, I>(records: I, spec: &ViewSpec) -> Vec<TokenRecord>
where
    I: IntoIterator<Item = &'a TokenRecord>,
{
    let mut rows: Vec<TokenRecord> = records
        .into_iter()
        .filter(|t| spec.status.map_or(true, |status| t.status == status))
        .filter(|t| spec.filters.matches(t))
        .cloned()
        .collect();

    if rows.is_empty() {
        return rows;
    }

    rows.sort_by(|a, b| spec.sort.compare(a, b));
    rows
}

/// Project the store's current contents.
pub fn project_store(store: &TokenStore, spec: &ViewSpec) -> Vec<TokenRecord> {
    project(store.iter(), spec)
}

/// Cached projection for one board section.
///
/// Recomputes only when the store version or the section's own config
/// generation has moved since the last refresh.
#[derive(Debug, Clone)]
pub struct SectionView {
    spec: ViewSpec,
    generation: u64,
    computed_at: Option<(u64, u64)>,
    rows: Vec<TokenRecord>,
}

impl SectionView {
    pub fn new(spec: ViewSpec) -> Self {
        Self {
            spec,
            generation: 0,
            computed_at: None,
            rows: Vec::new(),
        }
    }

    pub fn spec(&self) -> &ViewSpec {
        &self.spec
    }

    pub fn set_filters(&mut self, filters: DisplayFilters) {
        if self.spec.filters != filters {
            self.spec.filters = filters;
            self.generation += 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortConfig) {
        if self.spec.sort != sort {
            self.spec.sort = sort;
            self.generation += 1;
        }
    }

    /// Recompute if stale. Returns `true` when the rows were rebuilt.
    pub fn refresh(&mut self, store: &TokenStore) -> bool {
        let stamp = (store.version(), self.generation);
        if self.computed_at == Some(stamp) {
            return false;
        }
        self.rows = project_store(store, &self.spec);
        self.computed_at = Some(stamp);
        true
    }

    pub fn rows(&self) -> &[TokenRecord] {
        &self.rows
    }
}

// =============================================================================
// Catalog (REST listing)
// =============================================================================

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Offset-paginated listing of the store, optionally narrowed by status
/// and chain. Keeps store order.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub status: Option<TokenStatus>,
    pub chain: Option<Chain>,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            status: None,
            chain: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}

impl CatalogQuery {
    pub fn run(&self, store: &TokenStore) -> Page<TokenRecord> {
        let matching: Vec<&TokenRecord> = store
            .iter()
            .filter(|t| self.status.map_or(true, |s| t.status == s))
            .filter(|t| self.chain.map_or(true, |c| t.chain == c))
            .collect();

        let total = matching.len();
        let start = self.page.saturating_sub(1).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size);

        let items = matching
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();

        Page {
            items,
            total,
            page: self.page,
            page_size: self.page_size,
            has_more: end < total,
        }
    }
}

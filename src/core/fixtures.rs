//! Fixture catalogue: twenty named meme tokens with randomised metrics.
//!
//! Ids are `tkn-0` .. `tkn-19`, which lines up with the mock tick source's
//! default candidates.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::types::{Chain, PriceDirection, TokenRecord, TokenStatus};

/// (symbol, name, launchpad)
const CATALOGUE: [(&str, &str, &str); 20] = [
    ("PEPE", "Pepe Coin", "pump.fun"),
    ("DOGE", "Dogecoin", "virtual-curve"),
    ("SHIB", "Shiba Inu", "launchlab"),
    ("BONK", "Bonk", "pump.fun"),
    ("WIF", "Dog Wif Hat", "virtual-curve"),
    ("BRETT", "Brett", "pump.fun"),
    ("MEW", "cat in a dogs world", "launchlab"),
    ("POPCAT", "Popcat", "pump.fun"),
    ("MOG", "Mog Coin", "virtual-curve"),
    ("PONKE", "Ponke", "pump.fun"),
    ("GIGA", "Giga Chad", "launchlab"),
    ("TURBO", "Turbo", "pump.fun"),
    ("MYRO", "Myro", "virtual-curve"),
    ("BOME", "Book of Meme", "pump.fun"),
    ("SNAP", "Snap", "launchlab"),
    ("MICHI", "Michi", "pump.fun"),
    ("WEN", "Wen", "virtual-curve"),
    ("SLERF", "Slerf", "pump.fun"),
    ("SMOG", "Smog", "launchlab"),
    ("BILLY", "Billy", "pump.fun"),
];

/// Number of fixture tokens.
pub const FIXTURE_COUNT: usize = CATALOGUE.len();

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn contract_address(rng: &mut StdRng) -> String {
    let bytes: [u8; 20] = rng.gen();
    let mut address = String::with_capacity(42);
    address.push_str("0x");
    for byte in bytes {
        address.push_str(&format!("{:02x}", byte));
    }
    address
}

/// Generate the catalogue. The same seed always yields the same metrics
/// (timestamps aside).
pub fn generate(seed: Option<u64>) -> Vec<TokenRecord> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let now = Utc::now();

    CATALOGUE
        .iter()
        .enumerate()
        .map(|(index, (symbol, name, launchpad))| {
            let base_price = 50.0 + rng.gen::<f64>() * 200.0;
            let price_change = (rng.gen::<f64>() - 0.5) * 30.0;
            let volume = rng.gen::<f64>() * 10_000_000.0;
            let market_cap = base_price * (1_000_000.0 + rng.gen::<f64>() * 50_000_000.0);
            let liquidity = rng.gen::<f64>() * 5_000_000.0;

            TokenRecord {
                id: Arc::from(format!("tkn-{}", index)),
                symbol: symbol.to_string(),
                name: name.to_string(),
                contract_address: contract_address(&mut rng),
                chain: Chain::ALL[rng.gen_range(0..Chain::ALL.len())],
                status: TokenStatus::ALL[rng.gen_range(0..TokenStatus::ALL.len())],
                current_price: round2(base_price),
                price_change_24h: round2(price_change),
                volume_24h: round2(volume),
                market_cap: round2(market_cap),
                liquidity: round2(liquidity),
                age_minutes: rng.gen_range(0..1440),
                top10_holders_percent: round2(20.0 + rng.gen::<f64>() * 50.0),
                dev_holding_percent: round2(rng.gen::<f64>() * 20.0),
                snipers_percent: round2(rng.gen::<f64>() * 15.0),
                insiders_percent: round2(rng.gen::<f64>() * 25.0),
                logo: Some(format!(
                    "https://api.dicebear.com/7.x/identicon/svg?seed={}",
                    symbol
                )),
                created_at: now - ChronoDuration::milliseconds(rng.gen_range(0..WEEK_MS)),
                launchpad: Some(launchpad.to_string()),
                last_price_direction: PriceDirection::Neutral,
                last_update_ms: None,
            }
        })
        .collect()
}

//! Shipping quotes from a static rate table.
//!
//! Cost = first item + additional item × (quantity − 1), in US cents.

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

const EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT", "LV",
    "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

pub const MAX_QUANTITY: u32 = 1000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    Us,
    Ca,
    Gb,
    Eu,
    Au,
    RestOfWorld,
}

impl Region {
    pub fn for_country(code: &str) -> Self {
        match code {
            "US" | "PR" => Self::Us,
            "CA" => Self::Ca,
            "GB" => Self::Gb,
            "AU" | "NZ" => Self::Au,
            c if EU_COUNTRIES.contains(&c) => Self::Eu,
            _ => Self::RestOfWorld,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Rate {
    pub first_item: u64,
    pub additional_item: u64,
    pub min_days: u32,
    pub max_days: u32,
}

const fn rate(first_item: u64, additional_item: u64, min_days: u32, max_days: u32) -> Rate {
    Rate { first_item, additional_item, min_days, max_days }
}

/// `None` means the method is not offered for the region.
pub fn rate_for(region: Region, method: ShippingMethod) -> Option<Rate> {
    use ShippingMethod::*;
    match (region, method) {
        (Region::Us, Standard) => Some(rate(475, 240, 3, 5)),
        (Region::Us, Express) => Some(rate(1200, 500, 1, 2)),
        (Region::Ca, Standard) => Some(rate(939, 440, 5, 10)),
        (Region::Ca, Express) => Some(rate(2000, 700, 2, 4)),
        (Region::Gb, Standard) => Some(rate(549, 200, 3, 7)),
        (Region::Gb, Express) => Some(rate(1500, 600, 1, 3)),
        (Region::Eu, Standard) => Some(rate(599, 250, 4, 10)),
        (Region::Eu, Express) => Some(rate(2500, 900, 2, 5)),
        (Region::Au, Standard) => Some(rate(1000, 300, 7, 14)),
        (Region::Au, Express) => None,
        (Region::RestOfWorld, Standard) => Some(rate(1200, 400, 10, 30)),
        (Region::RestOfWorld, Express) => None,
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuoteItem {
    #[serde(default)]
    pub variant_id: Option<u64>,
    pub quantity: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ShippingQuoteRequest {
    pub country: String,
    pub items: Vec<QuoteItem>,
    #[serde(default)]
    pub method: ShippingMethod,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ShippingQuote {
    pub country: String,
    pub region: Region,
    pub method: ShippingMethod,
    pub total_items: u32,
    pub cost: u64,
    pub currency: &'static str,
    pub min_days: u32,
    pub max_days: u32,
}

fn normalize_country(country: &str) -> Result<String, ServiceError> {
    let code = country.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ServiceError::Validation("country must be an ISO 3166-1 alpha-2 code".into()));
    }
    Ok(code)
}

pub fn quote(req: &ShippingQuoteRequest) -> Result<ShippingQuote, ServiceError> {
    let country = normalize_country(&req.country)?;
    if req.items.is_empty() {
        return Err(ServiceError::Validation("items must not be empty".into()));
    }
    let mut total_items: u32 = 0;
    for item in &req.items {
        if item.quantity == 0 {
            return Err(ServiceError::Validation("quantity must be at least 1".into()));
        }
        total_items = total_items.saturating_add(item.quantity);
    }
    if total_items > MAX_QUANTITY {
        return Err(ServiceError::Validation(format!("at most {MAX_QUANTITY} items per quote")));
    }

    let region = Region::for_country(&country);
    let r = rate_for(region, req.method).ok_or_else(|| {
        ServiceError::Validation(format!("{:?} shipping is not available to {country}", req.method).to_lowercase())
    })?;
    let cost = r.first_item + r.additional_item * u64::from(total_items - 1);

    Ok(ShippingQuote {
        country,
        region,
        method: req.method,
        total_items,
        cost,
        currency: "USD",
        min_days: r.min_days,
        max_days: r.max_days,
    })
}

/// Every method offered to `country`, with its rate.
pub fn options(country: &str) -> Result<Vec<(ShippingMethod, Rate)>, ServiceError> {
    let region = Region::for_country(&normalize_country(country)?);
    Ok([ShippingMethod::Standard, ShippingMethod::Express]
        .into_iter()
        .filter_map(|m| rate_for(region, m).map(|r| (m, r)))
        .collect())
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::city::UnknownVariant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    INR,
    JPY,
    AUD,
}

impl Currency {
    pub const ALLOWED: &'static [&'static str] = &["USD", "EUR", "GBP", "INR", "JPY", "AUD"];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::INR => "INR",
            Currency::JPY => "JPY",
            Currency::AUD => "AUD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "INR" => Ok(Currency::INR),
            "JPY" => Ok(Currency::JPY),
            "AUD" => Ok(Currency::AUD),
            _ => Err(UnknownVariant {
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Planned spend for the whole trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub amount: f64,
    pub currency: Currency,
}

/// Cost buckets as tracked by the trip's budget page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub transport: f64,
    pub stay: f64,
    pub activities: f64,
    pub meals: f64,
    pub total: f64,
    pub currency: String,
}

impl Default for BudgetSummary {
    fn default() -> Self {
        Self {
            transport: 0.0,
            stay: 0.0,
            activities: 0.0,
            meals: 0.0,
            total: 0.0,
            currency: Currency::default().code().to_string(),
        }
    }
}

impl BudgetSummary {
    pub fn bucket_sum(&self) -> f64 {
        self.transport + self.stay + self.activities + self.meals
    }
}

/// Non-finite and negative amounts collapse to zero.
pub fn non_negative(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Pricing configuration: sales tax and membership tier discounts.
//!
//! Loaded from JSON; any field left out keeps its default. The tax rate and
//! every discount rate are fractions in `0..=1`.
//!
//! ```json
//! {
//!   "tax_rate": "0.07",
//!   "discount_rates": { "Basic": "0", "Gold": "0.10", "Supreme": "0.30" }
//! }
//! ```

use crate::checkout::MemberTier;
use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Applied to the subtotal after discount.
    pub tax_rate: Decimal,
    /// Fraction of the subtotal taken off per member tier.
    pub discount_rates: HashMap<MemberTier, Decimal>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::ZERO,
            discount_rates: HashMap::from([
                (MemberTier::Basic, Decimal::ZERO),
                (MemberTier::Gold, dec!(0.10)),
                (MemberTier::Supreme, dec!(0.30)),
            ]),
        }
    }
}

impl PricingConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Discount for a tier; tiers without a configured rate get none.
    pub fn discount_rate(&self, tier: Option<MemberTier>) -> Decimal {
        tier.and_then(|tier| self.discount_rates.get(&tier).copied())
            .unwrap_or(Decimal::ZERO)
    }

    /// Rejects a tax rate or any discount outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(ConfigError::Invalid(format!(
                "tax rate {} is outside 0..=1",
                self.tax_rate
            )));
        }
        for (tier, rate) in &self.discount_rates {
            if *rate < Decimal::ZERO || *rate > Decimal::ONE {
                return Err(ConfigError::Invalid(format!(
                    "discount rate {rate} for {tier:?} is outside 0..=1"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_house_rates() {
        let config = PricingConfig::default();
        assert_eq!(config.tax_rate, Decimal::ZERO);
        assert_eq!(config.discount_rate(Some(MemberTier::Basic)), dec!(0));
        assert_eq!(config.discount_rate(Some(MemberTier::Gold)), dec!(0.10));
        assert_eq!(config.discount_rate(Some(MemberTier::Supreme)), dec!(0.30));
        assert_eq!(config.discount_rate(None), Decimal::ZERO);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PricingConfig::from_json(r#"{"tax_rate": "0.07"}"#).unwrap();
        assert_eq!(config.tax_rate, dec!(0.07));
        assert_eq!(config.discount_rate(Some(MemberTier::Gold)), dec!(0.10));
    }

    #[test]
    fn missing_tier_gets_no_discount() {
        let config =
            PricingConfig::from_json(r#"{"discount_rates": {"Gold": "0.15"}}"#).unwrap();
        assert_eq!(config.discount_rate(Some(MemberTier::Gold)), dec!(0.15));
        assert_eq!(config.discount_rate(Some(MemberTier::Supreme)), Decimal::ZERO);
    }

    #[test]
    fn negative_tax_is_invalid() {
        let result = PricingConfig::from_json(r#"{"tax_rate": "-0.01"}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn tax_above_one_is_invalid() {
        let result = PricingConfig::from_json(r#"{"tax_rate": "7"}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        assert!(PricingConfig::from_json(r#"{"tax_rate": "1"}"#).is_ok());
    }

    #[test]
    fn discount_above_one_is_invalid() {
        let result = PricingConfig::from_json(r#"{"discount_rates": {"Supreme": "1.5"}}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            PricingConfig::from_json("{tax"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = PricingConfig::load(Path::new("/nonexistent/pricing.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}

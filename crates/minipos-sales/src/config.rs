//! Engine settings.

use std::time::Duration;

use minipos_core::pricing::{PricingPolicy, TaxPolicy};
use minipos_core::{LoyaltyRate, PaymentMethod};

/// Settings for [`SaleEngine`](crate::SaleEngine).
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use minipos_core::pricing::PricingPolicy;
/// use minipos_sales::SalesConfig;
///
/// let config = SalesConfig::default()
///     .pricing(PricingPolicy::AllowOverride)
///     .commit_timeout(Duration::from_secs(2));
/// assert_eq!(config.default_cashier, "1");
/// ```
#[derive(Debug, Clone)]
pub struct SalesConfig {
    /// Payment methods accepted at this till.
    pub payment_methods: Vec<PaymentMethod>,
    pub pricing: PricingPolicy,
    pub tax: TaxPolicy,
    pub loyalty_rate: LoyaltyRate,
    /// Upper bound on one commit/void/delete, lock waits included.
    pub commit_timeout: Duration,
    /// Cashier recorded when the request does not name one.
    pub default_cashier: String,
}

impl Default for SalesConfig {
    fn default() -> Self {
        SalesConfig {
            payment_methods: PaymentMethod::ALL.to_vec(),
            pricing: PricingPolicy::CatalogOnly,
            tax: TaxPolicy::CallerSupplied,
            loyalty_rate: LoyaltyRate::default(),
            commit_timeout: Duration::from_secs(10),
            default_cashier: "1".to_string(),
        }
    }
}

impl SalesConfig {
    pub fn payment_methods(mut self, methods: Vec<PaymentMethod>) -> Self {
        self.payment_methods = methods;
        self
    }

    pub fn pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn tax(mut self, tax: TaxPolicy) -> Self {
        self.tax = tax;
        self
    }

    pub fn loyalty_rate(mut self, rate: LoyaltyRate) -> Self {
        self.loyalty_rate = rate;
        self
    }

    pub fn commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn default_cashier(mut self, cashier: impl Into<String>) -> Self {
        self.default_cashier = cashier.into();
        self
    }
}

//! # Validation Module
//!
//! Turns a loosely-typed [`NewSale`] request into a [`ValidatedSale`] whose
//! fields are known to be well-formed. Nothing here touches stock.
//!
//! ## Where Validation Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP body (JSON)                                                       │
//! │     │  serde: shape only (loose Option / i64 fields)                    │
//! │     ▼                                                                   │
//! │  THIS MODULE: business rules                                            │
//! │  ├── items non-empty, ≤ MAX_SALE_ITEMS                                  │
//! │  ├── 0 < quantity ≤ MAX_ITEM_QUANTITY                                   │
//! │  ├── 0 ≤ discount, tax, unit_price ≤ MAX_AMOUNT_CENTS                  │
//! │  └── payment_method ∈ configured set                                    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  SQLite: CHECK (stock_quantity >= 0), UNIQUE, FOREIGN KEY               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use minipos_core::validation::validate_sale_request;
//! use minipos_core::{NewSale, NewSaleItem, PaymentMethod};
//!
//! let req = NewSale {
//!     items: vec![NewSaleItem { product_id: "p1".into(), quantity: 2, unit_price: None }],
//!     payment_method: Some("cash".into()),
//!     ..Default::default()
//! };
//! let sale = validate_sale_request(&req, &PaymentMethod::ALL).unwrap();
//! assert_eq!(sale.payment_method, PaymentMethod::Cash);
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewSale, PaymentMethod, SaleStatus};
use crate::{
    MAX_AMOUNT_CENTS, MAX_IDEMPOTENCY_KEY_LEN, MAX_ITEM_QUANTITY, MAX_NOTES_LEN, MAX_SALE_ITEMS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Validated Request
// =============================================================================

/// A sale request that passed every rule in this module.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSale {
    pub customer_id: Option<String>,
    pub lines: Vec<ValidatedLine>,
    pub discount: Money,
    pub tax: Money,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub status: SaleStatus,
}

/// One validated line, still in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLine {
    pub product_id: String,
    pub quantity: i64,
    /// The caller's proposed price. Only honoured under a price-override policy.
    pub proposed_price: Option<Money>,
}

// =============================================================================
// Sale Request
// =============================================================================

/// Validates a complete sale request.
///
/// Rules are checked in field order and the first failure is returned, so a
/// client sees one precise message at a time.
pub fn validate_sale_request(
    req: &NewSale,
    allowed_methods: &[PaymentMethod],
) -> ValidationResult<ValidatedSale> {
    let customer_id = match req.customer_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(id) => Some(id.to_string()),
    };

    if req.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    validate_sale_size(req.items.len())?;

    let mut lines = Vec::with_capacity(req.items.len());
    for (idx, item) in req.items.iter().enumerate() {
        let product_id = item.product_id.trim();
        if product_id.is_empty() {
            return Err(ValidationError::Required {
                field: format!("items[{idx}].product_id"),
            });
        }

        validate_quantity(&format!("items[{idx}].quantity"), item.quantity)?;

        let proposed_price = match item.unit_price {
            Some(cents) => {
                validate_amount(&format!("items[{idx}].unit_price"), cents)?;
                Some(Money::from_cents(cents))
            }
            None => None,
        };

        lines.push(ValidatedLine {
            product_id: product_id.to_string(),
            quantity: item.quantity,
            proposed_price,
        });
    }

    let discount = req.discount_amount.unwrap_or(0);
    validate_amount("discount_amount", discount)?;
    let tax = req.tax_amount.unwrap_or(0);
    validate_amount("tax_amount", tax)?;

    let payment_method = validate_payment_method(req.payment_method.as_deref(), allowed_methods)?;

    let notes = match req.notes.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(notes) => {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(ValidationError::TooLong {
                    field: "notes".to_string(),
                    max: MAX_NOTES_LEN,
                });
            }
            Some(notes.to_string())
        }
    };

    let status = match req.status.as_deref().map(str::trim) {
        None | Some("") => SaleStatus::Completed,
        Some(raw) => validate_initial_status(raw)?,
    };

    Ok(ValidatedSale {
        customer_id,
        lines,
        discount: Money::from_cents(discount),
        tax: Money::from_cents(tax),
        payment_method,
        notes,
        status,
    })
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the number of line items in one sale.
pub fn validate_sale_size(items: usize) -> ValidationResult<()> {
    if items > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }
    Ok(())
}

/// Validates a monetary amount in cents.
///
/// ## Rules
/// - May be zero but not negative
/// - Must not exceed MAX_AMOUNT_CENTS
pub fn validate_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Parses a payment method and checks it against the configured set.
pub fn validate_payment_method(
    method: Option<&str>,
    allowed: &[PaymentMethod],
) -> ValidationResult<PaymentMethod> {
    let raw = method.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }

    raw.parse::<PaymentMethod>()
        .ok()
        .filter(|m| allowed.contains(m))
        .ok_or_else(|| ValidationError::NotAllowed {
            field: "payment_method".to_string(),
            allowed: allowed.iter().map(|m| m.as_str().to_string()).collect(),
        })
}

/// Validates a client-supplied idempotency key.
///
/// Returns the trimmed key.
pub fn validate_idempotency_key(key: &str) -> ValidationResult<String> {
    let key = key.trim();

    if key.is_empty() {
        return Err(ValidationError::Required {
            field: "idempotency_key".to_string(),
        });
    }

    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ValidationError::TooLong {
            field: "idempotency_key".to_string(),
            max: MAX_IDEMPOTENCY_KEY_LEN,
        });
    }

    Ok(key.to_string())
}

/// Parses the status a new sale starts in.
///
/// Only `pending` and `completed` are valid starting points.
pub fn validate_initial_status(status: &str) -> ValidationResult<SaleStatus> {
    match validate_status(status)? {
        status @ (SaleStatus::Pending | SaleStatus::Completed) => Ok(status),
        _ => Err(ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec![
                SaleStatus::Pending.to_string(),
                SaleStatus::Completed.to_string(),
            ],
        }),
    }
}

/// Parses a target status for a status transition request.
pub fn validate_status(status: &str) -> ValidationResult<SaleStatus> {
    if status.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "status".to_string(),
        });
    }

    status.parse().map_err(|_| ValidationError::NotAllowed {
        field: "status".to_string(),
        allowed: SaleStatus::ALL.iter().map(|s| s.to_string()).collect(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

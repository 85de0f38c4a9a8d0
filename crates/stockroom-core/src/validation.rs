//! # Validation Module
//!
//! Parse-and-validate step for loosely typed payloads at the component
//! boundary.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Transport JSON ──► THIS MODULE ──► typed request ──► repository tx     │
//! │  {"quantity": "3"}   parse_*()       SaleOrder         BEGIN ...        │
//! │                          │                                              │
//! │                          └── ValidationError, no transaction opened     │
//! │                                                                         │
//! │  Accepted numeric forms:                                                │
//! │  ├── integers:  3, 3.0, "3"                                             │
//! │  ├── money:     12, 12.5, "12.50"  (max two decimals, exact)            │
//! │  └── percent:   10, "12.5"         (stored as basis points)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quotation quantities are the one place where out-of-range input is
//! clamped instead of rejected: below 1 becomes 1. Non-numeric input is still
//! rejected.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::margin::{MarginBounds, MarginRangeInput, MarkupRate};
use crate::money::Money;
use crate::order::{OrderItem, SaleOrder};
use crate::types::{NewProduct, PaymentMethod};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product code.
pub const MAX_CODE_LEN: usize = 50;

/// Longest accepted product description.
pub const MAX_DESCRIPTION_LEN: usize = 200;

// =============================================================================
// Scalar Parsers
// =============================================================================

/// Parses an integral value: a JSON integer, a float with no fraction, or an
/// integer string.
pub fn parse_integer(value: &Value, field: &str) -> ValidationResult<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(ValidationError::invalid_format(field, "expected an integer")),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::invalid_format(field, "expected an integer")),
        Value::Null => Err(ValidationError::required(field)),
        _ => Err(ValidationError::invalid_format(field, "expected an integer")),
    }
}

/// Parses an entity id (positive integer).
pub fn parse_id(value: &Value, field: &str) -> ValidationResult<i64> {
    let id = parse_integer(value, field)?;
    if id <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(id)
}

/// Parses a strictly positive quantity. Used for sales and restock deltas.
pub fn parse_quantity(value: &Value, field: &str) -> ValidationResult<i64> {
    let qty = parse_integer(value, field)?;
    if qty <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(qty)
}

/// Parses an optional quotation quantity. Absent or null yields `None`; the
/// clamp to 1 is applied by [`OrderItem::new`].
pub fn parse_optional_quantity(value: Option<&Value>, field: &str) -> ValidationResult<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_integer(v, field).map(Some),
    }
}

/// Two-decimal text form of a JSON value, if it is a number or string.
fn decimal_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Parses a non-negative money amount given in major units.
pub fn parse_money(value: &Value, field: &str) -> ValidationResult<Money> {
    if value.is_null() {
        return Err(ValidationError::required(field));
    }
    let text = decimal_text(value)
        .ok_or_else(|| ValidationError::invalid_format(field, "expected a decimal amount"))?;
    let money = Money::parse_decimal(&text).ok_or_else(|| {
        ValidationError::invalid_format(field, "expected a decimal amount with at most 2 decimals")
    })?;
    if money.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(money)
}

fn parse_optional_money(value: Option<&Value>, field: &str) -> ValidationResult<Option<Money>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_money(v, field).map(Some),
    }
}

/// Parses a markup percentage (`10`, `"12.5"`) into basis points.
pub fn parse_percentage(value: &Value, field: &str) -> ValidationResult<MarkupRate> {
    if value.is_null() {
        return Err(ValidationError::required(field));
    }
    // Two decimals of a percentage are exactly basis points.
    let text = decimal_text(value)
        .ok_or_else(|| ValidationError::invalid_format(field, "expected a percentage"))?;
    let bps = Money::parse_decimal(&text)
        .ok_or_else(|| ValidationError::invalid_format(field, "expected a percentage"))?
        .cents();
    let bps = u32::try_from(bps).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: u32::MAX as i64,
    })?;
    Ok(MarkupRate::from_bps(bps))
}

/// Parses a payment method; absent, null and empty are all `Required`.
pub fn parse_payment_method(value: Option<&Value>) -> ValidationResult<PaymentMethod> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::required("payment_method")),
        Some(Value::String(s)) => s.parse(),
        Some(_) => Err(ValidationError::invalid_format(
            "payment_method",
            "expected a string",
        )),
    }
}

fn parse_optional_text(value: Option<&Value>, field: &str) -> ValidationResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok(if s.is_empty() { None } else { Some(s.to_string()) })
        }
        Some(_) => Err(ValidationError::invalid_format(field, "expected a string")),
    }
}

// =============================================================================
// Payload Parsers
// =============================================================================

fn as_object<'a>(value: &'a Value, field: &str) -> ValidationResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::invalid_format(field, "expected an object"))
}

fn as_array<'a>(value: Option<&'a Value>, field: &str) -> ValidationResult<&'a [Value]> {
    match value {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(ValidationError::invalid_format(field, "expected an array")),
    }
}

/// A parsed quotation create/update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationPayload {
    pub client: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub items: Vec<OrderItem>,
}

/// Parses `{client?, payment_method?, items: [{product_id, quantity?}]}`.
///
/// An empty or absent item list is accepted and yields an empty quotation.
pub fn parse_quotation_payload(payload: &Value) -> ValidationResult<QuotationPayload> {
    let obj = as_object(payload, "payload")?;

    let client = parse_optional_text(obj.get("client"), "client")?;
    let payment_method = match parse_optional_text(obj.get("payment_method"), "payment_method")? {
        Some(text) => Some(text.parse::<PaymentMethod>()?),
        None => None,
    };

    let mut items = Vec::new();
    for (index, raw) in as_array(obj.get("items"), "items")?.iter().enumerate() {
        let item = as_object(raw, &format!("items[{}]", index))?;
        let product_id = parse_id(
            item.get("product_id").unwrap_or(&Value::Null),
            &format!("items[{}].product_id", index),
        )?;
        let quantity =
            parse_optional_quantity(item.get("quantity"), &format!("items[{}].quantity", index))?;
        items.push(OrderItem::new(product_id, quantity));
    }

    Ok(QuotationPayload {
        client,
        payment_method,
        items,
    })
}

/// Parses and aggregates `{payment_method, items: [{product_id, quantity}]}`.
///
/// ## Rules
/// - Payment method present and known
/// - At least one item
/// - Every quantity a positive integer
pub fn parse_sale_request(payload: &Value, seller_id: i64) -> ValidationResult<SaleOrder> {
    let obj = as_object(payload, "payload")?;
    let payment_method = parse_payment_method(obj.get("payment_method"))?;

    let raw_items = as_array(obj.get("items"), "items")?;
    let mut lines = Vec::with_capacity(raw_items.len());
    for (index, raw) in raw_items.iter().enumerate() {
        let item = as_object(raw, &format!("items[{}]", index))?;
        let product_id = parse_id(
            item.get("product_id").unwrap_or(&Value::Null),
            &format!("items[{}].product_id", index),
        )?;
        let quantity = parse_quantity(
            item.get("quantity").unwrap_or(&Value::Null),
            &format!("items[{}].quantity", index),
        )?;
        lines.push((product_id, quantity));
    }

    SaleOrder::new(payment_method, seller_id, &lines)
}

/// One validated restock entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockEntry {
    pub product_id: i64,
    pub quantity_delta: i64,
    pub new_purchase_price: Option<Money>,
    pub new_sale_price: Option<Money>,
}

/// Parses a restock batch, either a bare array or `{entries: [...]}`.
///
/// Every entry is validated before the batch is accepted; the first invalid
/// one rejects the whole batch.
pub fn parse_restock_batch(payload: &Value) -> ValidationResult<Vec<RestockEntry>> {
    let raw_entries = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => as_array(obj.get("entries"), "entries")?,
        _ => {
            return Err(ValidationError::invalid_format(
                "entries",
                "expected an array",
            ))
        }
    };

    if raw_entries.is_empty() {
        return Err(ValidationError::required("entries"));
    }

    let mut entries = Vec::with_capacity(raw_entries.len());
    for (index, raw) in raw_entries.iter().enumerate() {
        let field = |name: &str| format!("entries[{}].{}", index, name);
        let entry = as_object(raw, &format!("entries[{}]", index))?;

        entries.push(RestockEntry {
            product_id: parse_id(
                entry.get("product_id").unwrap_or(&Value::Null),
                &field("product_id"),
            )?,
            quantity_delta: parse_quantity(
                entry.get("quantity_delta").unwrap_or(&Value::Null),
                &field("quantity_delta"),
            )?,
            new_purchase_price: parse_optional_money(
                entry.get("purchase_price"),
                &field("purchase_price"),
            )?,
            new_sale_price: parse_optional_money(entry.get("sale_price"), &field("sale_price"))?,
        });
    }

    Ok(entries)
}

/// Parses `{min, max?, percentage}`. A null, absent, `"Infinity"` or `"∞"`
/// max is the unbounded tail.
pub fn parse_margin_range(payload: &Value) -> ValidationResult<MarginRangeInput> {
    let obj = as_object(payload, "payload")?;

    let min = parse_money(obj.get("min").unwrap_or(&Value::Null), "min")?;
    let max = match obj.get("max") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if is_unbounded_marker(s) => None,
        Some(v) => Some(parse_money(v, "max")?),
    };
    let markup = parse_percentage(obj.get("percentage").unwrap_or(&Value::Null), "percentage")?;

    let bounds = MarginBounds::new(min.cents(), max.map(|m| m.cents()))?;
    Ok(MarginRangeInput { bounds, markup })
}

fn is_unbounded_marker(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text == "∞" || text.eq_ignore_ascii_case("infinity")
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_CODE_LEN`] characters
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }
    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::required("description"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

fn validate_non_negative(value: i64, field: &str) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a catalog write payload before it reaches the database.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_code(&product.code)?;
    validate_description(&product.description)?;
    validate_non_negative(product.stock_qty, "stock_qty")?;
    validate_non_negative(product.stock_min, "stock_min")?;
    validate_non_negative(product.stock_max, "stock_max")?;
    validate_non_negative(product.purchase_price_cents, "purchase_price")?;
    if let Some(sale) = product.sale_price_cents {
        validate_non_negative(sale, "sale_price")?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

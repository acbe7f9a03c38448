//! Sale Data Structures
//!
//! A sale starts life as a [`NewSale`] built by the point-of-sale flow, is
//! queued locally as a [`PendingSale`], and is sent to the server as a
//! [`SaleSubmission`] during synchronization.

use crate::shared::error::SharedError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One line of a sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleLine {
    /// Catalog item being sold
    #[serde(rename = "producto_id", alias = "product_id")]
    pub product_id: i64,
    /// Units sold
    #[serde(rename = "cantidad", alias = "quantity")]
    pub quantity: u32,
    /// Price per unit at the time of sale
    #[serde(rename = "precio_unitario", alias = "unit_price")]
    pub unit_price: f64,
}

impl SaleLine {
    /// Create a new sale line
    pub fn new(product_id: i64, quantity: u32, unit_price: f64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Line total
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// How the customer paid
///
/// The server prices sales two ways: list price, or the cash discount.
/// Card and transfer payments all go through at list price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    #[serde(
        rename = "normal",
        alias = "standard",
        alias = "debit_card",
        alias = "credit_card",
        alias = "transfer"
    )]
    Standard,
    #[serde(rename = "efectivo", alias = "cash")]
    Cash,
}

impl PaymentMethod {
    /// Stable tag used for storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Standard => "normal",
            PaymentMethod::Cash => "efectivo",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" | "standard" | "debit_card" | "credit_card" | "transfer" => {
                Ok(PaymentMethod::Standard)
            }
            "efectivo" | "cash" => Ok(PaymentMethod::Cash),
            other => Err(SharedError::validation(
                "payment_method",
                format!("unknown payment method '{}'", other),
            )),
        }
    }
}

/// A sale as recorded by the point-of-sale flow, before it is queued
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSale {
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
}

impl NewSale {
    pub fn new(lines: Vec<SaleLine>, payment_method: PaymentMethod) -> Self {
        Self {
            lines,
            payment_method,
        }
    }

    /// Sum of all line subtotals
    pub fn total(&self) -> f64 {
        self.lines.iter().map(SaleLine::subtotal).sum()
    }

    /// Reject sales the server would refuse anyway
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.lines.is_empty() {
            return Err(SharedError::validation(
                "lines",
                "a sale needs at least one line",
            ));
        }

        for line in &self.lines {
            if line.quantity == 0 {
                return Err(SharedError::validation(
                    "quantity",
                    format!("product {} has a zero quantity", line.product_id),
                ));
            }
            if !line.unit_price.is_finite() || line.unit_price < 0.0 {
                return Err(SharedError::validation(
                    "unit_price",
                    format!("product {} has an invalid price", line.product_id),
                ));
            }
        }

        Ok(())
    }
}

/// A queued sale in the local store
///
/// Only `synchronized` and `synced_at` ever change after the sale is queued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSale {
    /// Local, auto-incrementing sequence id
    pub id: i64,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    /// Whether the server has confirmed this sale
    pub synchronized: bool,
    /// When the server confirmed this sale
    pub synced_at: Option<DateTime<Utc>>,
}

impl PendingSale {
    pub fn total(&self) -> f64 {
        self.lines.iter().map(SaleLine::subtotal).sum()
    }

    /// Build the request body sent to the server for this sale
    pub fn to_submission(&self) -> SaleSubmission {
        SaleSubmission {
            lines: self.lines.clone(),
            payment_method: self.payment_method,
            notes: Some(format!(
                "Offline sale #{} recorded at {}",
                self.id,
                self.created_at.to_rfc3339()
            )),
        }
    }
}

/// Request body for submitting a sale to the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleSubmission {
    #[serde(rename = "items", alias = "lines")]
    pub lines: Vec<SaleLine>,
    #[serde(rename = "metodo_pago", alias = "payment_method")]
    pub payment_method: PaymentMethod,
    #[serde(
        default,
        rename = "observaciones",
        alias = "notes",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_total() {
        let sale = NewSale::new(
            vec![SaleLine::new(1, 2, 10.0), SaleLine::new(2, 1, 5.5)],
            PaymentMethod::Cash,
        );
        assert_eq!(sale.total(), 25.5);
    }

    #[test]
    fn test_validate_rejects_empty_sale() {
        let sale = NewSale::new(vec![], PaymentMethod::Cash);
        match sale.validate() {
            Err(SharedError::ValidationError { field, .. }) => assert_eq!(field, "lines"),
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let sale = NewSale::new(vec![SaleLine::new(1, 0, 10.0)], PaymentMethod::Standard);
        assert!(sale.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let sale = NewSale::new(vec![SaleLine::new(1, 1, -1.0)], PaymentMethod::Cash);
        assert!(sale.validate().is_err());
    }

    #[test]
    fn test_payment_method_tags() {
        for method in [PaymentMethod::Standard, PaymentMethod::Cash] {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("transfer".parse::<PaymentMethod>().unwrap(), PaymentMethod::Standard);
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_submission_serializes_server_field_names() {
        let submission = SaleSubmission {
            lines: vec![SaleLine::new(7, 2, 450.0)],
            payment_method: PaymentMethod::Standard,
            notes: None,
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "items": [{"producto_id": 7, "cantidad": 2, "precio_unitario": 450.0}],
                "metodo_pago": "normal"
            })
        );
    }

    #[test]
    fn test_submission_from_server_field_names() {
        let json = r#"{
            "items": [{"producto_id": 4, "cantidad": 3, "precio_unitario": 99.0}],
            "metodo_pago": "efectivo",
            "observaciones": "Venta offline"
        }"#;
        let submission: SaleSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.lines[0], SaleLine::new(4, 3, 99.0));
        assert_eq!(submission.payment_method, PaymentMethod::Cash);
        assert_eq!(submission.notes.as_deref(), Some("Venta offline"));
    }

    #[test]
    fn test_to_submission_carries_local_id() {
        let sale = PendingSale {
            id: 42,
            lines: vec![SaleLine::new(1, 1, 1.0)],
            payment_method: PaymentMethod::Standard,
            created_at: Utc::now(),
            synchronized: false,
            synced_at: None,
        };
        let submission = sale.to_submission();
        assert_eq!(submission.lines, sale.lines);
        assert!(submission.notes.unwrap().contains("#42"));
    }
}

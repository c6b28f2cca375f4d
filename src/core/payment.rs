//! Client and supplier payments

use crate::core::financial::PaymentRecord;
use crate::core::repository::{Record, RecordId, Relation};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Direction of a payment. Client payments are income, supplier payments
/// are expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    ClientPayment,
    SupplierPayment,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PaymentType::ClientPayment => "client_payment",
                PaymentType::SupplierPayment => "supplier_payment",
            }
        )
    }
}

impl FromStr for PaymentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client_payment" | "client" => Ok(PaymentType::ClientPayment),
            "supplier_payment" | "supplier" => Ok(PaymentType::SupplierPayment),
            _ => Err(anyhow::anyhow!("Invalid payment type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringFrequency {
    Monthly,
    Quarterly,
    Annual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: RecordId,
    pub project_id: RecordId,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub description: String,
    pub payment_date: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub project_id: RecordId,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub description: String,
    pub payment_date: DateTime<Utc>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<RecurringFrequency>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPatch {
    pub project_id: Option<RecordId>,
    #[serde(rename = "type")]
    pub payment_type: Option<PaymentType>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurring_frequency: Option<RecurringFrequency>,
}

impl Record for Payment {
    type New = NewPayment;
    type Patch = PaymentPatch;

    const KIND: &'static str = "payments";
    const LABEL: &'static str = "Payment";
    const RELATIONS: &'static [Relation] = &[Relation::Project];

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_new(id: RecordId, new: NewPayment) -> Self {
        Payment {
            id,
            project_id: new.project_id,
            payment_type: new.payment_type,
            amount: new.amount,
            description: new.description,
            payment_date: new.payment_date,
            is_recurring: new.is_recurring,
            recurring_frequency: new.recurring_frequency,
            created_at: Utc::now(),
        }
    }

    fn apply(&mut self, patch: PaymentPatch) {
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(payment_type) = patch.payment_type {
            self.payment_type = payment_type;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(payment_date) = patch.payment_date {
            self.payment_date = payment_date;
        }
        if let Some(is_recurring) = patch.is_recurring {
            self.is_recurring = is_recurring;
        }
        if patch.recurring_frequency.is_some() {
            self.recurring_frequency = patch.recurring_frequency;
        }
    }

    fn related_id(&self, relation: Relation) -> Option<RecordId> {
        match relation {
            Relation::Project => Some(self.project_id),
            _ => None,
        }
    }
}

impl PaymentRecord for Payment {
    fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    fn amount(&self) -> f64 {
        self.amount.to_f64().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_payment_from_json() {
        let json = r#"{
            "projectId": 3,
            "type": "supplier_payment",
            "amount": "1250.50",
            "description": "Inverter deposit",
            "paymentDate": "2025-03-14T00:00:00Z"
        }"#;

        let new: NewPayment = serde_json::from_str(json).unwrap();
        let payment = Payment::from_new(7, new);

        assert_eq!(payment.id, 7);
        assert_eq!(payment.project_id, 3);
        assert_eq!(payment.payment_type, PaymentType::SupplierPayment);
        assert_eq!(payment.amount, Decimal::new(125050, 2));
        assert!(!payment.is_recurring);
        assert!(payment.recurring_frequency.is_none());
        assert_eq!(payment.signed_amount(), -1250.5);
    }

    #[test]
    fn test_payment_accepts_numeric_amount() {
        let json = r#"{
            "projectId": 1,
            "type": "client_payment",
            "amount": 900,
            "description": "Milestone 1",
            "paymentDate": "2025-01-01T12:00:00Z",
            "isRecurring": true,
            "recurringFrequency": "monthly"
        }"#;

        let new: NewPayment = serde_json::from_str(json).unwrap();
        assert_eq!(new.amount, Decimal::from(900));
        assert_eq!(new.recurring_frequency, Some(RecurringFrequency::Monthly));
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let new: NewPayment = serde_json::from_str(
            r#"{"projectId": 1, "type": "client_payment", "amount": "100",
                "description": "a", "paymentDate": "2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let mut payment = Payment::from_new(1, new);

        let patch: PaymentPatch = serde_json::from_str(r#"{"amount": "250"}"#).unwrap();
        payment.apply(patch);

        assert_eq!(payment.amount, Decimal::from(250));
        assert_eq!(payment.description, "a");
        assert_eq!(payment.payment_type, PaymentType::ClientPayment);
    }

    #[test]
    fn test_payment_type_from_str() {
        assert_eq!(
            "client_payment".parse::<PaymentType>().unwrap(),
            PaymentType::ClientPayment
        );
        assert_eq!(
            "Supplier".parse::<PaymentType>().unwrap(),
            PaymentType::SupplierPayment
        );
        assert!("refund".parse::<PaymentType>().is_err());
    }
}

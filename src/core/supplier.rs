use crate::core::repository::{Record, RecordId, Relation};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: RecordId,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// e.g. "COD", "Net 30"
    pub payment_terms: Option<String>,
    /// "A" (excellent) to "D" (poor)
    pub credit_rating: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub credit_rating: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_terms: Option<String>,
    pub credit_rating: Option<String>,
    pub is_active: Option<bool>,
}

impl Record for Supplier {
    type New = NewSupplier;
    type Patch = SupplierPatch;

    const KIND: &'static str = "suppliers";
    const LABEL: &'static str = "Supplier";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_new(id: RecordId, new: NewSupplier) -> Self {
        Supplier {
            id,
            name: new.name,
            contact_person: new.contact_person,
            email: new.email,
            phone: new.phone,
            address: new.address,
            payment_terms: new.payment_terms,
            credit_rating: new.credit_rating,
            is_active: new.is_active,
            created_at: Utc::now(),
        }
    }

    fn apply(&mut self, patch: SupplierPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if patch.contact_person.is_some() {
            self.contact_person = patch.contact_person;
        }
        if patch.email.is_some() {
            self.email = patch.email;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
        if patch.address.is_some() {
            self.address = patch.address;
        }
        if patch.payment_terms.is_some() {
            self.payment_terms = patch.payment_terms;
        }
        if patch.credit_rating.is_some() {
            self.credit_rating = patch.credit_rating;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}

/// Price a supplier quotes for a cost component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierComponent {
    pub id: RecordId,
    pub supplier_id: RecordId,
    pub component_id: RecordId,
    pub price: Decimal,
    /// Days
    pub lead_time: Option<u32>,
    pub minimum_order: Option<u32>,
    pub payment_terms: Option<String>,
    pub is_preferred: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplierComponent {
    pub supplier_id: RecordId,
    pub component_id: RecordId,
    pub price: Decimal,
    #[serde(default)]
    pub lead_time: Option<u32>,
    #[serde(default)]
    pub minimum_order: Option<u32>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub is_preferred: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierComponentPatch {
    pub supplier_id: Option<RecordId>,
    pub component_id: Option<RecordId>,
    pub price: Option<Decimal>,
    pub lead_time: Option<u32>,
    pub minimum_order: Option<u32>,
    pub payment_terms: Option<String>,
    pub is_preferred: Option<bool>,
}

impl Record for SupplierComponent {
    type New = NewSupplierComponent;
    type Patch = SupplierComponentPatch;

    const KIND: &'static str = "supplier_components";
    const LABEL: &'static str = "Supplier component";
    const RELATIONS: &'static [Relation] = &[Relation::Supplier, Relation::Component];

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_new(id: RecordId, new: NewSupplierComponent) -> Self {
        SupplierComponent {
            id,
            supplier_id: new.supplier_id,
            component_id: new.component_id,
            price: new.price,
            lead_time: new.lead_time,
            minimum_order: new.minimum_order,
            payment_terms: new.payment_terms,
            is_preferred: new.is_preferred,
            created_at: Utc::now(),
        }
    }

    fn apply(&mut self, patch: SupplierComponentPatch) {
        if let Some(supplier_id) = patch.supplier_id {
            self.supplier_id = supplier_id;
        }
        if let Some(component_id) = patch.component_id {
            self.component_id = component_id;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if patch.lead_time.is_some() {
            self.lead_time = patch.lead_time;
        }
        if patch.minimum_order.is_some() {
            self.minimum_order = patch.minimum_order;
        }
        if patch.payment_terms.is_some() {
            self.payment_terms = patch.payment_terms;
        }
        if let Some(is_preferred) = patch.is_preferred {
            self.is_preferred = is_preferred;
        }
    }

    fn related_id(&self, relation: Relation) -> Option<RecordId> {
        match relation {
            Relation::Supplier => Some(self.supplier_id),
            Relation::Component => Some(self.component_id),
            Relation::Project => None,
        }
    }
}

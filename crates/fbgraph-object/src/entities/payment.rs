//! Payments made through an application.

use crate::factory::EntityType;
use crate::record::EntityRecord;
use crate::schema::{ConnectionDefinition, EntitySchema, FieldDefinition, FieldType, Permission};

/// Schema of the `Payment` node. Every field needs the app access token.
pub static PAYMENT: EntitySchema = EntitySchema::new(
    "Payment",
    "The payment ID",
    &[
        FieldDefinition::new("user", FieldType::Object, "The user's first and last name along with their user id")
            .permission(Permission::App),
        FieldDefinition::new("product", FieldType::String, "The URL of the og:product object ordered")
            .permission(Permission::App),
        FieldDefinition::new("quantity", FieldType::Integer, "The quantity of the product contained in the order")
            .permission(Permission::App),
        FieldDefinition::new("request_id", FieldType::String, "The unique, optional app-created identifier passed into the JS function (255 character maximum)")
            .permission(Permission::App),
        FieldDefinition::new("application", FieldType::Object, "The application associated with this payment")
            .permission(Permission::App),
        FieldDefinition::new("actions", FieldType::Array, "The type, status, amount, currency, time_created and time_updated for a Payment.")
            .permission(Permission::App),
        FieldDefinition::new("items", FieldType::Object, "The items associated with the payment containing type, product and quantity")
            .permission(Permission::App),
        FieldDefinition::new("country", FieldType::String, "Buyer's ISO Country Code for tax purposes")
            .permission(Permission::App),
        FieldDefinition::new("created_time", FieldType::String, "The time the Payment was originally created")
            .permission(Permission::App),
        FieldDefinition::new("payout_foreign_exchange_rate", FieldType::Float, "Exchange rate used to calculate payout amount which is remitted in USD")
            .permission(Permission::App),
        FieldDefinition::new("disputes", FieldType::Object, "Contains the information for a dispute including the user_comment, which is the information the user passed to FB when disputing the order, along with the time_created, this field is only returned if this payment is disputed")
            .permission(Permission::App),
        FieldDefinition::new("test", FieldType::Boolean, "Optional parameter that shows up when a payment is made by a payment tester listed in the developer app")
            .permission(Permission::App),
    ],
    &[
        ConnectionDefinition::new("refunds", "Refunds a payment", Permission::App),
    ],
);

/// A payment record.
#[derive(Debug, Clone)]
pub struct Payment {
    record: EntityRecord,
}

impl Payment {
    /// An empty payment
    pub fn new() -> Self {
        Self::from_record(EntityRecord::new(&PAYMENT))
    }

    fn from_record(record: EntityRecord) -> Self {
        Self { record }
    }

    typed_accessors! {
        "id" => id, set_id: str;
        "user" => user, set_user: object;
        "product" => product, set_product: str;
        "quantity" => quantity, set_quantity: int;
        "request_id" => request_id, set_request_id: str;
        "application" => application, set_application: object;
        "actions" => actions, set_actions: array;
        "items" => items, set_items: object;
        "country" => country, set_country: str;
        "created_time" => created_time, set_created_time: str;
        "payout_foreign_exchange_rate" => payout_foreign_exchange_rate, set_payout_foreign_exchange_rate: float;
        "disputes" => disputes, set_disputes: object;
        "test" => test, set_test: bool;
    }
}

impl Default for Payment {
    fn default() -> Self {
        Self::new()
    }
}

entity_record!(Payment, PAYMENT, EntityType::Payment);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;

    #[test]
    fn everything_needs_the_app_token() {
        let names: Vec<_> = PAYMENT.fields().skip(1).map(|f| f.name()).collect();
        assert_eq!(
            PAYMENT.required_permission(names.iter().copied()).unwrap(),
            Permission::App
        );
        assert_eq!(PAYMENT.connection("refunds").unwrap().required_permission(), Permission::App);
    }

    #[test]
    fn typed_fields_coerce() {
        let mut payment = Payment::new();
        payment.set_quantity("3").unwrap();
        payment.set_payout_foreign_exchange_rate(1).unwrap();
        payment.set_test("true").unwrap();
        assert_eq!(payment.quantity(), Some(3));
        assert_eq!(payment.payout_foreign_exchange_rate(), Some(1.0));
        assert_eq!(payment.test(), Some(true));
        assert!(payment.set_quantity("three").is_err());
        assert_eq!(payment.record().name(), "Payment");
    }

    #[test]
    fn non_finite_rates_are_refused() {
        let mut payment = Payment::new();
        payment.set_payout_foreign_exchange_rate(0.92).unwrap();
        for bad in [f64::NAN, f64::INFINITY] {
            let err = payment.set_payout_foreign_exchange_rate(bad).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::InvalidType);
        }
        assert_eq!(payment.payout_foreign_exchange_rate(), Some(0.92));
        assert_eq!(
            payment.record().to_json(),
            serde_json::json!({"payout_foreign_exchange_rate": 0.92})
        );
    }
}

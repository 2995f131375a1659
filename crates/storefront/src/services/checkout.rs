//! Checkout: form validation and order confirmation.
//!
//! There is no payment processing. A valid form against a non-empty cart
//! produces an [`OrderConfirmation`] and empties the cart in the same locked
//! update, so a confirmation always lists exactly the lines that were cleared.

use bytehub_core::{CartLine, ContactEmail, ContactEmailError, OrderNumber, cart_subtotal};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use super::cart::CartService;
use crate::storage::{StorageError, keys};

/// Payment method recorded when the form leaves it blank.
pub const DEFAULT_PAYMENT: &str = "Cash on delivery";

/// Checkout validation failures and storage errors.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please fill in your {0}")]
    MissingField(&'static str),

    #[error("Please enter a valid email address: {0}")]
    InvalidEmail(#[from] ContactEmailError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CheckoutError {
    /// Whether the error is the customer's to fix (shown inline).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// Submitted checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub payment: String,
}

/// Validated customer details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: ContactEmail,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub payment: String,
}

/// A placed order.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub order_number: OrderNumber,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub customer: Customer,
}

fn required(value: &str, label: &'static str) -> Result<String, CheckoutError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CheckoutError::MissingField(label))
    } else {
        Ok(value.to_string())
    }
}

/// Validate the form against the cart contents.
///
/// # Errors
///
/// Returns the first problem found: empty cart, then required fields in form
/// order, then a malformed email.
pub fn validate(form: &CheckoutForm, cart: &[CartLine]) -> Result<Customer, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let name = required(&form.name, "name")?;
    let email = required(&form.email, "email")?;
    let phone = required(&form.phone, "phone")?;
    let address = required(&form.address, "address")?;
    let email = ContactEmail::parse(&email)?;

    let payment = match form.payment.trim() {
        "" => DEFAULT_PAYMENT.to_string(),
        payment => payment.to_string(),
    };

    Ok(Customer {
        name,
        email,
        phone,
        address,
        city: form.city.trim().to_string(),
        postcode: form.postcode.trim().to_string(),
        payment,
    })
}

/// A random 11-digit order number.
#[must_use]
pub fn new_order_number() -> OrderNumber {
    OrderNumber::new(rand::rng().random_range(10_000_000_000..=OrderNumber::MAX))
}

/// Validate and place the order, emptying the cart on success.
///
/// On any validation error the cart is left as it was.
///
/// # Errors
///
/// Returns a validation error, or a storage error if the cart cannot be
/// updated.
pub async fn place_order(
    cart: &CartService,
    form: &CheckoutForm,
) -> Result<OrderConfirmation, CheckoutError> {
    let (_, outcome) = cart
        .store()
        .update(keys::CART, |lines: &mut Vec<CartLine>| {
            let customer = validate(form, lines)?;
            Ok::<_, CheckoutError>((customer, std::mem::take(lines)))
        })
        .await?;
    let (customer, lines) = outcome?;

    let confirmation = OrderConfirmation {
        order_number: new_order_number(),
        placed_at: Utc::now(),
        subtotal: cart_subtotal(&lines),
        lines,
        customer,
    };
    tracing::info!(
        order_number = %confirmation.order_number,
        lines = confirmation.lines.len(),
        "Order placed"
    );
    Ok(confirmation)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytehub_core::{Product, ProductId};

    use super::*;
    use crate::storage::Storage;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Amina".to_string(),
            email: "amina@example.com".to_string(),
            phone: "0555 12 34 56".to_string(),
            address: "1 Rue Didouche".to_string(),
            city: "Algiers".to_string(),
            ..CheckoutForm::default()
        }
    }

    fn product() -> Product {
        Product {
            id: ProductId::new("shirt"),
            title: "Shirt".to_string(),
            img: "a.jpg".to_string(),
            price: Decimal::from(20),
            old_price: Some(Decimal::from(30)),
            category: "Clothing".to_string(),
            short_desc: String::new(),
            colors: None,
            images: None,
            permalink: None,
        }
    }

    async fn cart_with_shirt() -> CartService {
        let cart = CartService::new(Storage::in_memory().scoped("v"));
        cart.add_to_cart(&product(), 2, None).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected_and_untouched() {
        let cart = CartService::new(Storage::in_memory().scoped("v"));
        let err = place_order(&cart, &form()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(err.to_string(), "Your cart is empty");
        assert!(cart.read_cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_field_keeps_cart() {
        let cart = cart_with_shirt().await;
        let bad = CheckoutForm {
            phone: "   ".to_string(),
            ..form()
        };
        let err = place_order(&cart, &bad).await.unwrap_err();
        assert!(matches!(err, CheckoutError::MissingField("phone")));
        assert!(err.is_validation());
        assert_eq!(cart.read_cart().await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_email_keeps_cart() {
        let cart = cart_with_shirt().await;
        let bad = CheckoutForm {
            email: "not-an-email".to_string(),
            ..form()
        };
        assert!(matches!(
            place_order(&cart, &bad).await,
            Err(CheckoutError::InvalidEmail(_))
        ));
        assert_eq!(cart.read_cart().await[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_successful_order_clears_cart() {
        let cart = cart_with_shirt().await;
        let order = place_order(&cart, &form()).await.unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.subtotal, Decimal::from(40));
        assert_eq!(order.customer.payment, DEFAULT_PAYMENT);
        assert_eq!(order.customer.city, "Algiers");
        assert_eq!(order.order_number.to_string().len(), 11);
        assert_eq!(
            cart.store().get::<Vec<CartLine>>(keys::CART).await,
            Some(Vec::new())
        );
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cart() {
        use crate::storage::LocalStore;

        let dir = std::env::temp_dir().join(format!("bytehub-checkout-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir(&dir).unwrap();
        let cart = CartService::new(Storage::from(LocalStore::open(dir.join("store.json"))).scoped("v"));
        cart.add_to_cart(&product(), 2, None).await.unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
        assert!(cart.add_to_cart(&product(), 1, None).await.is_err());
        assert!(matches!(
            place_order(&cart, &form()).await,
            Err(CheckoutError::Storage(_))
        ));

        let lines = cart.read_cart().await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_first_missing_field_is_reported() {
        let lines = vec![CartLine::new(product(), 1, None)];
        let err = validate(&CheckoutForm::default(), &lines).unwrap_err();
        assert!(matches!(err, CheckoutError::MissingField("name")));
    }

    #[test]
    fn test_order_numbers_have_eleven_digits() {
        for _ in 0..100 {
            let n = new_order_number();
            assert!(n.as_u64() >= 10_000_000_000);
            assert_eq!(n.to_string().len(), 11);
        }
    }
}

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An invoice needs a counterpart; none was selected")]
    MissingCounterpart,

    #[error("Line '{reference}': quantity {quantity} out of range (1..=99999)")]
    InvalidQuantity { reference: String, quantity: u32 },

    #[error("Line '{reference}': unit price {unit_price} out of range (0..=999999999.99)")]
    InvalidUnitPrice {
        reference: String,
        unit_price: Decimal,
    },

    #[error("Line '{reference}': tax rate {tax_rate}% out of range (0..=100)")]
    InvalidTaxRate { reference: String, tax_rate: Decimal },

    #[error("Line '{reference}': amount {amount} exceeds the line ceiling of 999999999.99")]
    LineAmountCeiling { reference: String, amount: Decimal },

    #[error("Grand total {amount} exceeds the document ceiling of 9999999999.90")]
    TotalCeiling { amount: Decimal },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

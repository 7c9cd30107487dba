use coffee_common::Money;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sha2::Sha512;

use crate::PaystackApiError;

pub const KOBO_PER_NAIRA: u32 = 100;

/// Converts an amount in Naira into kobo, the unit Paystack charges in.
///
/// Amounts with a fraction of a kobo, and amounts that are not positive, are rejected.
pub fn to_subunit(amount: Money) -> Result<Decimal, PaystackApiError> {
    if !amount.is_positive() {
        return Err(PaystackApiError::InvalidCurrencyAmount(format!("{amount} is not a positive amount")));
    }
    amount.to_minor_units(KOBO_PER_NAIRA).map_err(|e| PaystackApiError::InvalidCurrencyAmount(e.to_string()))
}

/// The lowercase hex HMAC-SHA512 of `body`, keyed with the Paystack secret key.
pub fn calculate_signature(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match Hmac::<Sha512>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

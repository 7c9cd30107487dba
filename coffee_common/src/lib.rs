mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, NAIRA_CURRENCY_CODE};
pub use secret::Secret;

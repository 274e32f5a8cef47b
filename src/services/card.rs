use chrono::{Datelike, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Every card is issued with this balance.
pub const STARTING_BALANCE: Decimal = dec!(50.00);

/// Locally generated placeholder card credentials. Not from an issuer; the
/// number only has to look plausible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardCredentials {
    /// 16 digits, "4" prefix
    pub number: String,
    /// MM/YY, four years out
    pub expiry: String,
    /// 3 digits
    pub cvv: String,
}

impl CardCredentials {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();

        let mut number = String::with_capacity(16);
        number.push('4');
        for _ in 0..15 {
            number.push(char::from(b'0' + rng.gen_range(0..10u8)));
        }

        let month: u32 = rng.gen_range(1..=12);
        let year = Utc::now().year() + 4;
        let expiry = format!("{:02}/{:02}", month, year % 100);

        let cvv = rng.gen_range(100..1000u32).to_string();

        Self { number, expiry, cvv }
    }
}

/// Cards "arrive" a week after the order confirms.
pub fn delivery_date() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::days(7)
}

// 💱 Currency Entity - supported currencies and their symbols

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    /// ISO 4217 code
    pub code: &'static str,

    /// Symbol shown in the settings picker
    pub symbol: &'static str,

    pub name: &'static str,
}

pub const DEFAULT_CURRENCY: &str = "INR";

pub const CURRENCY_OPTIONS: &[CurrencyInfo] = &[
    CurrencyInfo { code: "INR", symbol: "₹", name: "Indian Rupee" },
    CurrencyInfo { code: "USD", symbol: "$", name: "US Dollar" },
    CurrencyInfo { code: "EUR", symbol: "€", name: "Euro" },
    CurrencyInfo { code: "GBP", symbol: "£", name: "British Pound" },
    CurrencyInfo { code: "JPY", symbol: "¥", name: "Japanese Yen" },
    CurrencyInfo { code: "CNY", symbol: "¥", name: "Chinese Yuan" },
];

pub fn find_currency(code: &str) -> Option<&'static CurrencyInfo> {
    CURRENCY_OPTIONS.iter().find(|c| c.code == code)
}

/// Picker symbol for a code; unknown codes get the rupee sign
pub fn currency_symbol(code: &str) -> &'static str {
    find_currency(code).map_or("₹", |c| c.symbol)
}

// Entity Models - static lookup tables and preference values

pub mod category;
pub mod currency;
pub mod theme;

pub use category::{
    category_display_name, category_label, find_category, is_known_category, CategoryInfo,
    EXPENSE_CATEGORIES, UNKNOWN_CATEGORY_NAME,
};
pub use currency::{currency_symbol, find_currency, CurrencyInfo, CURRENCY_OPTIONS, DEFAULT_CURRENCY};
pub use theme::Theme;

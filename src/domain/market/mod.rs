// Raw daily market history
pub mod history;

pub use history::{HistoricalPoint, known_prices, normalize_history};

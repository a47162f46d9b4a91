use serde::{Deserialize, Serialize};
use std::fmt;

/// ARIMA configuration: autoregressive lags (p), differencing degree (d),
/// moving-average lags (q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ModelOrder {
    /// Order used when no grid candidate fits.
    pub const DEFAULT: ModelOrder = ModelOrder { p: 1, d: 1, q: 1 };

    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Candidate grid p∈[0,2], d∈[0,1], q∈[0,2] in lexicographic order.
    pub fn grid() -> Vec<ModelOrder> {
        let mut orders = Vec::with_capacity(18);
        for p in 0..=2 {
            for d in 0..=1 {
                for q in 0..=2 {
                    orders.push(ModelOrder::new(p, d, q));
                }
            }
        }
        orders
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

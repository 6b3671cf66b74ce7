//! Elementary European option pricing.
//!
//! Self-contained: nothing here shares state with the risk engine.

pub mod european;

pub use european::{bs_call, bs_price, bs_put};

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }
}

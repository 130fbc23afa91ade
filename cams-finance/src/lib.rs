//! cams-finance: cash-flow return math for classified statement records —
//! NPV root finding, holding-horizon resolution, and the per-holding /
//! portfolio return engine.

pub mod age;
pub mod engine;
pub mod xirr;

pub use age::{resolve_horizon, Horizon, FULLY_REDEEMED_EPSILON};
pub use engine::{compute_returns, EngineError, PORTFOLIO_FOLIO, PORTFOLIO_FUND_NAME};
pub use xirr::{npv, solve_rate, CashFlow, ConvergenceError};

pub mod balance;
pub mod calculator;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod service;
pub mod types;

// re-export key types
pub use balance::{BalanceStore, MemoryBalanceStore};
pub use calculator::LoanDecision;
pub use config::LoanConfig;
pub use decimal::{Money, Rate};
pub use errors::{BalanceError, LoanError, Result};
pub use events::{EventLog, LoanEvent};
pub use ledger::{LoanAccount, LoanLedger};
pub use service::LoanService;
pub use types::{
    AcceptedLoan, DeclinedOffer, LoanPayment, LoanQuote, PendingOffer, PlayerId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

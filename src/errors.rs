use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("no pending loan offer to resolve")]
    NoPendingOffer,

    #[error("no outstanding loan balance")]
    NothingOutstanding,

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Money,
        requested: Money,
    },

    #[error("balance store failure: {0}")]
    Persistence(#[from] BalanceError),

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

/// errors surfaced by a balance store implementation
#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Money,
        requested: Money,
    },

    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LoanError>;

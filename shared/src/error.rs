//! Domain rule violations shared by the backend and the WASM bindings

use thiserror::Error;

use crate::models::OrderStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Requested {requested} units but only {available} available")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Cannot return {requested} units, only {returnable} left to return")]
    ReturnExceedsSale { requested: i32, returnable: i32 },

    #[error("{0}")]
    InvalidInput(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

//! Domain models for the POS back office

mod employee;
mod movement;
mod notification;
mod order;
mod product;
mod transaction;
mod user;

pub use employee::*;
pub use movement::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use transaction::*;
pub use user::*;

//! HTTP request handlers

pub mod attendance;
pub mod auth;
pub mod category;
pub mod company;
pub mod customer;
pub mod dashboard;
pub mod employee;
pub mod health;
pub mod invoice;
pub mod movement;
pub mod notification;
pub mod order;
pub mod payroll;
pub mod product;
pub mod realtime;
pub mod returns;
pub mod sale;
pub mod setting;
pub mod supplier;
pub mod vacation;

pub use attendance::*;
pub use auth::*;
pub use category::*;
pub use company::*;
pub use customer::*;
pub use dashboard::*;
pub use employee::*;
pub use health::*;
pub use invoice::*;
pub use movement::*;
pub use notification::*;
pub use order::*;
pub use payroll::*;
pub use product::*;
pub use realtime::*;
pub use returns::*;
pub use sale::*;
pub use setting::*;
pub use supplier::*;
pub use vacation::*;

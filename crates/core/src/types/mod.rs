//! Entity types persisted by Stockroom.

pub mod customer;
pub mod id;
pub mod money;
pub mod product;
pub mod sale;
pub mod user;

pub use customer::{Customer, LegacyCustomer};
pub use id::*;
pub use money::{format_money, line_total};
pub use product::Product;
pub use sale::Sale;
pub use user::{ADMIN_USERNAME, User, is_admin_username};

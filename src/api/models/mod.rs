pub mod common;
pub mod shop_items;

pub use common::*;
pub use shop_items::*;

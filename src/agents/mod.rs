//! Concrete routing domains
//!
//! Each domain is a closed agent enum with static responders. The canned
//! replies are pure data lookups; the routing engine only needs the ids,
//! keyword tables and descriptions.

pub mod food;
pub mod sports;

pub use food::FoodAgent;
pub use sports::SportsAgent;

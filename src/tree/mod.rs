pub mod actions;
pub mod node;
pub mod store;

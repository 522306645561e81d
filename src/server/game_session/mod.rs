pub mod room;
pub mod store;

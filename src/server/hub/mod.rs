/// Session hub: the synchronous core plus the actor that owns it.

pub mod engine;
pub mod server;

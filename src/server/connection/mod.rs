/// Connections: the registry of live sockets and the per-socket session actor.

pub mod registry;
pub mod session;

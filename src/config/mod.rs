/// Main configuration module.
/// 
/// Re-exports submodules for hub and server configuration.
pub mod hub;
pub mod server;

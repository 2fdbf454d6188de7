// node/src/lib.rs
pub mod config;
pub mod runtime;

pub use config::ObserverConfig;
pub use runtime::Observer;

//! Runtime adapters hosting a scheduler inside an async application.

pub mod hosted;

pub use hosted::{run_from_env, run_until, stop_async};

//! Background tasks running alongside the cache.

pub mod sweep;

pub use sweep::spawn_sweep_task;

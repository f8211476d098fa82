//! Redis adapters.

pub mod event_queue;

pub use event_queue::RedisEventQueue;

//! Request extractors and layers that sit in front of the handlers.

pub mod invoker;

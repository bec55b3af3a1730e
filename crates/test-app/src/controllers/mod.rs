//! Request handlers.

pub mod test;

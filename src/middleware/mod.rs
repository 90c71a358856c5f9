//! Middleware layer.
//!
//! Middleware here is a plain function from handler to handler: it takes
//! anything that implements [`Handler`](crate::Handler) and returns something
//! that does too, so the result can be registered on a
//! [`Router`](crate::Router) or wrapped again.
//!
//! - [`timing`]: report how long handlers take, always or only when slow.

pub mod timing;

pub use timing::{Callback, callback, slow, timed};

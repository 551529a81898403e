pub mod dispatch;
pub mod listener;

pub use dispatch::{InboundCall, InboundResponder};
pub use listener::InboundListener;

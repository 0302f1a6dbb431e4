//! Tracker categories
//!
//! One module per category, each enabled by its own settings flag.

pub mod dom;
pub mod hash;
pub mod history;
pub mod js_error;

pub use dom::DomCapture;
pub use hash::HashCapture;
pub use history::HistoryCapture;
pub use js_error::JsErrorCapture;

//! Key-value configuration store.
//!
//! - [`Value`] typed parameter values
//! - [`Definition`] parameter declaration (name, default, description)
//! - [`ConfigStore`] the synchronized store with dump helpers

mod store;
mod value;

pub use store::{ConfigStore, Definition};
pub use value::Value;

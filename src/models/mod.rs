//! Data models for the DevRev REST API.
//!
//! Each object type keeps a handful of typed fields for display and logic,
//! and passes everything else through untouched in a flattened `extra` map.

mod account;
mod article;
mod common;
mod conversation;
mod incident;
mod part;
mod search;
mod user;
mod work;

pub use account::*;
pub use article::*;
pub use common::*;
pub use conversation::*;
pub use incident::*;
pub use part::*;
pub use search::*;
pub use user::*;
pub use work::*;

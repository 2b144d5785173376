//! Data models for sicds.
//!
//! This module contains the core data structures used throughout the system.

mod attribute;
mod request;

pub use attribute::{Attribute, AttributeSet, Fingerprint};
pub use request::{CheckOutcome, RequestContext};

#![cfg_attr(not(test), no_std)]

//! Board-independent logic for the scrolling LED sign: message model, form
//! parsing, page templating, and the scroll run with its restart handoff.

pub mod cancel;
pub mod display;
pub mod message;
pub mod page;
pub mod request;
pub mod scroll;
pub mod store;

#[cfg(test)]
mod test_support;

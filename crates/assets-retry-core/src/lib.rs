//! Client-side asset retry engine.
//!
//! When a script, stylesheet or image of a page fails to load, or an
//! on-demand chunk rejects, the engine re-issues the load against the next
//! domain of a configured rule, up to the rule's attempt cap, and reports the
//! lifecycle through hooks.
//!
//! - [`document`] retries resources present in the initial document.
//! - [`chunk`] retries on-demand chunks loaded by the module system.
//! - [`session`] holds the state both share for one page.
//! - [`config`] and [`embed`] cover the build-time side: loading rules and
//!   embedding them into the page-side engine.

pub mod chunk;
pub mod config;
pub mod document;
pub mod domain;
pub mod embed;
pub mod logging;
pub mod retry;
pub mod rule;
pub mod session;
pub mod sim;
pub mod tracker;
pub mod url_model;

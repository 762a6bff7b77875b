//! Platform adapters
//!
//! Turn controller directives into visible effects:
//! - `web`: the browser page (wasm32 only)
//! - `headless`: an in-memory page for the native build and tests

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use headless::{HeadlessPage, PageView};

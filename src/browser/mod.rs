//! Browser automation module
//!
//! This module provides high-level browser control through ChromiumOxide:
//! lifecycle and the page pool, navigation waits, and the renderer that
//! drives one article page from navigation to serialized DOM.

pub mod controller;
pub mod navigation;
pub mod pool;
pub mod renderer;

pub use controller::{BrowserConfig, BrowserConfigBuilder, BrowserController, PageLease};
pub use navigation::PageNavigator;
pub use pool::{PagePool, PoolPermit};
pub use renderer::{
    run_step, within_deadline, BrowserRenderer, PageRenderer, RenderRequest, StepPolicy,
};

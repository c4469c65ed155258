//! Automation surface for the plan operator.
//!
//! [`AutomationSurface`] is the only capability the execution engine depends
//! on. [`ChromiumSurface`] implements it on top of the Chromium DevTools
//! Protocol; tests substitute their own recording stubs.

pub mod chromium;
pub mod config;
pub mod error;
pub mod surface;

pub use chromium::ChromiumSurface;
pub use config::{detect_chrome_executable, SurfaceConfig};
pub use error::SurfaceError;
pub use surface::{AutomationSurface, BoundingBox};

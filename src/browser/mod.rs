//! Full-browser retrieval

pub mod chromium;
pub mod driver;
pub mod setup;

pub use chromium::{ChromiumDriver, ChromiumLauncher, ChromiumOptions};
pub use driver::{BrowserDriver, BrowserLauncher, BrowserVisit, VisitOutcome};
pub use setup::{BrowserWrapper, LaunchOptions, find_browser_executable, launch_browser};

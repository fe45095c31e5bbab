//! Anti-automation handling: detection, bypass rounds and stealth

pub mod bypass;
pub mod detector;
pub mod stealth;

pub use bypass::{BypassOutcome, BypassPolicy, ChallengePage, run_bypass};
pub use detector::{BLOCK_STATUSES, BlockDetector, BlockVerdict, html_title};
pub use stealth::StealthProfile;

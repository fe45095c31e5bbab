//! Bounded bypass loop for challenged browser pages
//!
//! Each round waits, optionally wiggles the pointer, clicks the first known
//! challenge widget that is present, then re-checks the page. The loop ends as
//! soon as the page reads clean or the round budget is spent.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::detector::BlockDetector;

/// Live page operations a bypass round needs
#[async_trait]
pub trait ChallengePage: Send + Sync {
    /// Current title and markup
    async fn snapshot(&self) -> Result<(String, String)>;

    /// Move the pointer to viewport coordinates
    async fn move_pointer(&self, x: f64, y: f64) -> Result<()>;

    /// Click the first selector that matches, returning whether anything was clicked
    async fn click_first(&self, selectors: &[String]) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct BypassPolicy {
    pub attempts: u32,
    /// Base wait before each round; up to half of it is added as jitter
    pub round_wait: Duration,
    pub simulate_pointer: bool,
    pub widget_selectors: Vec<String>,
}

impl BypassPolicy {
    #[must_use]
    pub fn new(attempts: u32, widget_selectors: Vec<String>) -> Self {
        Self {
            attempts,
            round_wait: Duration::from_millis(2500),
            simulate_pointer: true,
            widget_selectors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BypassOutcome {
    Cleared { rounds: u32 },
    StillBlocked { rounds: u32, reason: String },
}

impl BypassOutcome {
    #[must_use]
    pub fn rounds(&self) -> u32 {
        match self {
            Self::Cleared { rounds } | Self::StillBlocked { rounds, .. } => *rounds,
        }
    }
}

fn jittered(base: Duration) -> Duration {
    let max_extra = u64::try_from(base.as_millis() / 2).unwrap_or(0);
    if max_extra == 0 {
        return base;
    }
    base + Duration::from_millis(rand::rng().random_range(0..=max_extra))
}

/// A short, slightly curved pointer path across the viewport
fn pointer_path() -> Vec<(f64, f64)> {
    let mut rng = rand::rng();
    let (mut x, mut y): (f64, f64) = (rng.random_range(80.0..400.0), rng.random_range(80.0..300.0));
    (0..rng.random_range(4..9))
        .map(|_| {
            x += rng.random_range(15.0..90.0);
            y += rng.random_range(-25.0..45.0);
            (x, y.max(10.0))
        })
        .collect()
}

async fn play_round(page: &dyn ChallengePage, policy: &BypassPolicy) {
    if policy.simulate_pointer {
        for (x, y) in pointer_path() {
            if let Err(e) = page.move_pointer(x, y).await {
                debug!("Pointer move failed: {e}");
                break;
            }
            let pause = Duration::from_millis(rand::rng().random_range(20..80));
            tokio::time::sleep(pause).await;
        }
    }

    if !policy.widget_selectors.is_empty() {
        match page.click_first(&policy.widget_selectors).await {
            Ok(true) => debug!("Clicked challenge widget"),
            Ok(false) => debug!("No challenge widget present"),
            Err(e) => debug!("Challenge widget click failed: {e}"),
        }
    }
}

/// Run up to `policy.attempts` bypass rounds on a challenged page
pub async fn run_bypass(
    page: &dyn ChallengePage,
    detector: &BlockDetector,
    policy: &BypassPolicy,
    initial_reason: &str,
) -> BypassOutcome {
    let mut reason = initial_reason.to_string();

    for round in 1..=policy.attempts {
        info!("Bypass round {round}/{}: {reason}", policy.attempts);
        tokio::time::sleep(jittered(policy.round_wait)).await;
        play_round(page, policy).await;
        tokio::time::sleep(jittered(policy.round_wait / 2)).await;

        match page.snapshot().await {
            Ok((title, html)) => match detector.inspect(Some(&title), &html) {
                verdict if !verdict.is_blocked() => {
                    info!("Challenge cleared after {round} round(s)");
                    return BypassOutcome::Cleared { rounds: round };
                }
                verdict => {
                    reason = verdict.reason().unwrap_or_default().to_string();
                }
            },
            Err(e) => {
                warn!("Could not re-read challenged page: {e:#}");
                reason = format!("page unreadable: {e}");
            }
        }
    }

    warn!(
        "Page still blocked after {} bypass round(s): {reason}",
        policy.attempts
    );
    BypassOutcome::StillBlocked {
        rounds: policy.attempts,
        reason,
    }
}

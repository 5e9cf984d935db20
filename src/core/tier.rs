//! Processor tiers offered by the Parallel Task API.
//!
//! A tier trades cost for depth: `lite` answers in seconds for a few dollars
//! per thousand queries, `ultra8x` spends up to half an hour and thousands of
//! dollars. The cost and time figures here are display data for approval
//! prompts and tool output, not billing logic.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cost/latency class of a research run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorTier {
    /// Fast, low-cost lookups. Never requires approval.
    Lite,
    /// Basic research.
    Base,
    /// Standard research.
    Core,
    /// Standard research, doubled compute.
    Core2x,
    /// Deep research.
    #[default]
    Pro,
    /// Exhaustive research.
    Ultra,
    /// Exhaustive research, 2x compute.
    Ultra2x,
    /// Exhaustive research, 4x compute.
    Ultra4x,
    /// Exhaustive research, 8x compute.
    Ultra8x,
}

impl ProcessorTier {
    /// All tiers, cheapest first.
    pub const ALL: [Self; 9] = [
        Self::Lite,
        Self::Base,
        Self::Core,
        Self::Core2x,
        Self::Pro,
        Self::Ultra,
        Self::Ultra2x,
        Self::Ultra4x,
        Self::Ultra8x,
    ];

    /// Tier used when none is requested or the requested one is unknown.
    pub const DEFAULT: Self = Self::Pro;

    /// Wire name, as accepted by the remote API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lite => "lite",
            Self::Base => "base",
            Self::Core => "core",
            Self::Core2x => "core2x",
            Self::Pro => "pro",
            Self::Ultra => "ultra",
            Self::Ultra2x => "ultra2x",
            Self::Ultra4x => "ultra4x",
            Self::Ultra8x => "ultra8x",
        }
    }

    /// Approximate API cost per 1,000 queries.
    #[must_use]
    pub const fn cost_per_1k(self) -> &'static str {
        match self {
            Self::Lite => "$5",
            Self::Base => "$10",
            Self::Core => "$30",
            Self::Core2x => "$60",
            Self::Pro => "$100",
            Self::Ultra => "$300",
            Self::Ultra2x => "$600",
            Self::Ultra4x => "$1,200",
            Self::Ultra8x => "$2,400",
        }
    }

    /// Expected completion time range.
    #[must_use]
    pub const fn expected_duration(self) -> &'static str {
        match self {
            Self::Lite => "5-60s",
            Self::Base => "15-100s",
            Self::Core | Self::Core2x => "1-5min",
            Self::Pro => "3-9min",
            Self::Ultra | Self::Ultra2x => "5-25min",
            Self::Ultra4x | Self::Ultra8x => "8-30min",
        }
    }

    /// Upper end of [`expected_duration`](Self::expected_duration).
    #[must_use]
    pub const fn max_expected_duration(self) -> Duration {
        let secs = match self {
            Self::Lite => 60,
            Self::Base => 100,
            Self::Core | Self::Core2x => 5 * 60,
            Self::Pro => 9 * 60,
            Self::Ultra | Self::Ultra2x => 25 * 60,
            Self::Ultra4x | Self::Ultra8x => 30 * 60,
        };
        Duration::from_secs(secs)
    }

    /// Worker deadline used when an approver accepts without choosing one:
    /// twice the expected upper bound, and never under 15 minutes.
    #[must_use]
    pub const fn default_deadline(self) -> Duration {
        let doubled = self.max_expected_duration().as_secs() * 2;
        let floor = 15 * 60;
        Duration::from_secs(if doubled > floor { doubled } else { floor })
    }

    /// Whether a caller must approve runs on this tier before submission.
    #[must_use]
    pub const fn requires_approval(self) -> bool {
        !matches!(self, Self::Lite)
    }

    /// Whether this tier polls on the short interval.
    #[must_use]
    pub const fn is_quick(self) -> bool {
        matches!(self, Self::Lite)
    }

    /// Resolves a requested tier name, substituting `default` when the
    /// name is absent or unknown. Unknown names are logged, not rejected.
    #[must_use]
    pub fn resolve(requested: Option<&str>, default: Self) -> Self {
        let Some(name) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
            return default;
        };

        name.parse().unwrap_or_else(|_| {
            tracing::warn!(
                requested = name,
                default = default.as_str(),
                "invalid processor tier, substituting default"
            );
            default
        })
    }
}

impl fmt::Display for ProcessorTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessorTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == lower)
            .ok_or_else(|| format!("unknown processor tier: {s}"))
    }
}

use serde::{Deserialize, Serialize};

/// Alert importance as reported by the detection appliance.
///
/// Ordering is `Low < Medium < High`, so a plain descending sort puts the
/// most severe alerts first. Records whose importance did not parse carry
/// `None` instead, and `None < Some(Low)` makes them sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Lenient parse of the appliance's importance strings. The upstream
    /// feed spells medium both "medium" and "mediun"; anything else is
    /// treated as unranked.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "mediun" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Gauge weight used by dashboard widgets: low 30, medium 60, high 100.
    pub fn weight(&self) -> u32 {
        match self {
            Self::Low => 30,
            Self::Medium => 60,
            Self::High => 100,
        }
    }
}

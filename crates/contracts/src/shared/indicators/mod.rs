use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Indicator identity
// ---------------------------------------------------------------------------

/// Unique indicator identifier, used as key on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndicatorId(pub String);

impl IndicatorId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How to format the numeric value on the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ValueFormat {
    Money { currency: String },
    Percent { decimals: u8 },
}

/// Visual status of the indicator (drives colour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorStatus {
    Good,
    Bad,
    Neutral,
    Warning,
}

/// How `change` compares the current value with the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Relative change, `(cur - prev) / |prev| * 100`.
    Percent,
    /// Absolute difference of two percentages (п.п.).
    PercentagePoints,
}

// ---------------------------------------------------------------------------
// Computed values
// ---------------------------------------------------------------------------

/// A single computed indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub id: IndicatorId,
    pub label: String,
    pub format: ValueFormat,
    /// Primary numeric value (`None` when data is unavailable).
    pub value: Option<f64>,
    /// Value for the previous comparable period.
    pub previous_value: Option<f64>,
    /// Change relative to previous period, see `change_kind`.
    pub change: Option<f64>,
    pub change_kind: ChangeKind,
    pub status: IndicatorStatus,
    /// Text shown instead of the placeholder when the reason for a missing
    /// value is known (e.g. COGS not filled in).
    pub hint: Option<String>,
}

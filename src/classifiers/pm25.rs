use serde::{Deserialize, Serialize};

/// EPA-style PM2.5 health category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pm25Category {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

/// Breakpoint table in µg/m³. Each upper bound is inclusive; anything above the
/// last entry is `Hazardous`.
pub const PM25_BREAKPOINTS: [(f64, Pm25Category); 5] = [
    (12.0, Pm25Category::Good),
    (35.4, Pm25Category::Moderate),
    (55.4, Pm25Category::UnhealthySensitive),
    (150.4, Pm25Category::Unhealthy),
    (250.4, Pm25Category::VeryUnhealthy),
];

/// Daily PM2.5 means above this value raise the unhealthy flag. Taken from the
/// upper bound of the "Unhealthy (Sensitive)" tier.
pub const UNHEALTHY_PM25_THRESHOLD: f64 = PM25_BREAKPOINTS[2].0;

impl Pm25Category {
    pub fn from_value(value: Option<f64>) -> Self {
        let v = match value {
            Some(v) if v.is_finite() => v,
            _ => return Pm25Category::Unknown,
        };

        PM25_BREAKPOINTS
            .iter()
            .find(|(upper, _)| v <= *upper)
            .map(|(_, category)| *category)
            .unwrap_or(Pm25Category::Hazardous)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pm25Category::Good => "Good",
            Pm25Category::Moderate => "Moderate",
            Pm25Category::UnhealthySensitive => "Unhealthy (Sensitive)",
            Pm25Category::Unhealthy => "Unhealthy",
            Pm25Category::VeryUnhealthy => "Very Unhealthy",
            Pm25Category::Hazardous => "Hazardous",
            Pm25Category::Unknown => "Unknown",
        }
    }

    /// Badge color used by dashboards.
    pub fn color(&self) -> &'static str {
        match self {
            Pm25Category::Good => "#2ca02c",
            Pm25Category::Moderate => "#ffbb78",
            Pm25Category::UnhealthySensitive => "#ff7f0e",
            Pm25Category::Unhealthy => "#d62728",
            Pm25Category::VeryUnhealthy => "#9467bd",
            Pm25Category::Hazardous => "#7f0000",
            Pm25Category::Unknown => "#999999",
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(
            self,
            Pm25Category::Unhealthy | Pm25Category::VeryUnhealthy | Pm25Category::Hazardous
        )
    }
}

impl std::fmt::Display for Pm25Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map a PM2.5 concentration to its category label.
pub fn classify_pm25(value: Option<f64>) -> &'static str {
    Pm25Category::from_value(value).label()
}

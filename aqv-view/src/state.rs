//! The navigation state machine.
//!
//! ```text
//!             drill_down(city)            open_month(m)
//!  National ─────────────────▶ RegionDrilldown ─────────────▶ MonthDetail
//!     ▲                            │    ▲                        │
//!     └────────── back ────────────┘    └───────── back ─────────┘
//!
//!  any mode ── enter_dynamic_rank ──▶ DynamicRank ── leave ──▶ prior mode
//! ```
//!
//! Transitions only change `mode`; city, month, pollutant and date index
//! survive every transition, which is what lets leaving `DynamicRank`
//! restore the prior view.

use aqv_core::pollutant::Pollutant;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationMode {
    National,
    RegionDrilldown,
    MonthDetail,
    DynamicRank,
}

impl NavigationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationMode::National => "national",
            NavigationMode::RegionDrilldown => "region-drilldown",
            NavigationMode::MonthDetail => "month-detail",
            NavigationMode::DynamicRank => "dynamic-rank",
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected transition. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// `action` is not available from mode `from`.
    NotAllowed {
        from: NavigationMode,
        action: &'static str,
    },
    /// Months are 1-12.
    MonthOutOfRange(u32),
    EmptyCity,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::NotAllowed { from, action } => {
                write!(f, "cannot {} from {} view", action, from)
            }
            TransitionError::MonthOutOfRange(m) => write!(f, "month {} is not in 1-12", m),
            TransitionError::EmptyCity => write!(f, "city name is empty"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Current navigation mode plus the selection every chart reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    mode: NavigationMode,
    /// Mode to restore when leaving `DynamicRank`.
    suspended: Option<NavigationMode>,
    city: String,
    month: Option<u32>,
    pollutant: Pollutant,
    date_index: usize,
}

impl ViewState {
    pub fn new(city: impl Into<String>, pollutant: Pollutant) -> Self {
        Self {
            mode: NavigationMode::National,
            suspended: None,
            city: city.into(),
            month: None,
            pollutant,
            date_index: 0,
        }
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Month (1-12) of the most recent month detail, if any.
    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn pollutant(&self) -> Pollutant {
        self.pollutant
    }

    pub fn date_index(&self) -> usize {
        self.date_index
    }

    /// Mode that `leave_dynamic_rank` returns to.
    pub fn suspended(&self) -> Option<NavigationMode> {
        self.suspended
    }

    fn not_allowed(&self, action: &'static str) -> TransitionError {
        TransitionError::NotAllowed {
            from: self.mode,
            action,
        }
    }

    /// Open the drill-down dashboard for `city`. Also switches city while
    /// already drilled down.
    pub fn drill_down(&mut self, city: &str) -> Result<(), TransitionError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(TransitionError::EmptyCity);
        }
        match self.mode {
            NavigationMode::National | NavigationMode::RegionDrilldown => {
                self.city = city.to_string();
                self.mode = NavigationMode::RegionDrilldown;
                Ok(())
            }
            _ => Err(self.not_allowed("drill down")),
        }
    }

    /// Open the single-month comparison for `month` (1-12).
    pub fn open_month(&mut self, month: u32) -> Result<(), TransitionError> {
        if !(1..=12).contains(&month) {
            return Err(TransitionError::MonthOutOfRange(month));
        }
        match self.mode {
            NavigationMode::RegionDrilldown | NavigationMode::MonthDetail => {
                self.month = Some(month);
                self.mode = NavigationMode::MonthDetail;
                Ok(())
            }
            _ => Err(self.not_allowed("open a month")),
        }
    }

    /// Go up one level. Returns the mode now shown.
    pub fn back(&mut self) -> Result<NavigationMode, TransitionError> {
        let target = self.back_target().ok_or_else(|| self.not_allowed("go back"))?;
        if self.mode == NavigationMode::DynamicRank {
            self.suspended = None;
        }
        self.mode = target;
        Ok(target)
    }

    /// Where the back control leads from the current mode.
    pub fn back_target(&self) -> Option<NavigationMode> {
        match self.mode {
            NavigationMode::National => None,
            NavigationMode::RegionDrilldown => Some(NavigationMode::National),
            NavigationMode::MonthDetail => Some(NavigationMode::RegionDrilldown),
            NavigationMode::DynamicRank => self.suspended,
        }
    }

    /// Caption of the back control, reflecting the current depth.
    pub fn back_label(&self) -> Option<&'static str> {
        match self.mode {
            NavigationMode::RegionDrilldown => Some("返回全国地图"),
            NavigationMode::MonthDetail => Some("返回年度概览"),
            _ => None,
        }
    }

    /// Switch to the dynamic ranking, suspending the current mode.
    pub fn enter_dynamic_rank(&mut self) -> Result<(), TransitionError> {
        if self.mode == NavigationMode::DynamicRank {
            return Err(self.not_allowed("enter dynamic rank"));
        }
        self.suspended = Some(self.mode);
        self.mode = NavigationMode::DynamicRank;
        Ok(())
    }

    /// Leave the dynamic ranking, restoring the suspended mode.
    pub fn leave_dynamic_rank(&mut self) -> Result<NavigationMode, TransitionError> {
        if self.mode != NavigationMode::DynamicRank {
            return Err(self.not_allowed("leave dynamic rank"));
        }
        let restored = self.suspended.take().unwrap_or(NavigationMode::National);
        self.mode = restored;
        Ok(restored)
    }

    /// Select the city shown in the radar and info panel. Mode is unchanged.
    pub fn select_city(&mut self, city: &str) -> Result<(), TransitionError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(TransitionError::EmptyCity);
        }
        self.city = city.to_string();
        Ok(())
    }

    pub fn set_pollutant(&mut self, pollutant: Pollutant) {
        self.pollutant = pollutant;
    }

    /// The caller clamps `index` to the dataset.
    pub fn set_date_index(&mut self, index: usize) {
        self.date_index = index;
    }
}

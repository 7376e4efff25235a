//! The dashboard application context.
//!
//! `Dashboard` owns the data store, the navigation state, both rank
//! animators and the observer list. Every public method changes state,
//! re-derives the visible [`ViewData`] and hands it to the subscribers.
//!
//! Time is passed in explicitly as a `Duration` since an arbitrary epoch
//! (`now`), so the owner decides whether it comes from a real clock, a
//! `tokio` interval or a test loop.

use crate::animator::RankAnimator;
use crate::config::{DashboardConfig, RankSettings, SPEED_OPTIONS_MS};
use crate::observer::{Subscribers, SubscriptionId, ViewEvent, ViewObserver};
use crate::state::{NavigationMode, TransitionError, ViewState};
use aqv_core::pollutant::Pollutant;
use aqv_core::region::Region;
use aqv_data::calendar::CalendarCell;
use aqv_data::normalize::{heat_legend_ticks, legend_entries, LegendEntry};
use aqv_data::ranking::{chart_title, format_month_label, RankOrder, RankSnapshot};
use aqv_db::models::{
    CityMapValue, DateValue, InfoPanel, MonthDetailData, RadarAxis, RaincloudData, RidgelineData,
};
use aqv_db::queries::DRILLDOWN_METRIC;
use aqv_db::DataStore;
use serde::Serialize;
use std::time::Duration;

/// Map, radar and info panel for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalView {
    pub pollutant: Pollutant,
    pub unit: &'static str,
    pub date_index: usize,
    pub date: Option<String>,
    pub legend: Vec<LegendEntry>,
    pub heat_ticks: [f64; 3],
    pub map: Vec<CityMapValue>,
    pub city_radar: Vec<RadarAxis>,
    pub national_radar: Vec<RadarAxis>,
    pub info: InfoPanel,
}

/// The single-city yearly dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrilldownView {
    pub title: String,
    pub back_label: Option<&'static str>,
    pub city: String,
    pub region: Region,
    pub pollutant: Pollutant,
    pub city_series: Vec<DateValue>,
    pub national_series: Vec<DateValue>,
    pub calendar: Vec<CalendarCell>,
    pub ridgeline: RidgelineData,
    pub raincloud: RaincloudData,
    pub mini_rank: RankView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDetailView {
    pub title: String,
    pub back_label: Option<&'static str>,
    pub detail: MonthDetailData,
}

/// One frame of a racing-bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankView {
    pub title: String,
    pub month_label: Option<String>,
    pub frame: Option<RankSnapshot>,
    pub index: usize,
    pub total: usize,
    pub playing: bool,
    pub interval_ms: u64,
}

/// Everything a renderer needs for the current mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ViewData {
    National(NationalView),
    RegionDrilldown(DrilldownView),
    MonthDetail(MonthDetailView),
    DynamicRank(RankView),
}

impl ViewData {
    pub fn mode(&self) -> NavigationMode {
        match self {
            ViewData::National(_) => NavigationMode::National,
            ViewData::RegionDrilldown(_) => NavigationMode::RegionDrilldown,
            ViewData::MonthDetail(_) => NavigationMode::MonthDetail,
            ViewData::DynamicRank(_) => NavigationMode::DynamicRank,
        }
    }
}

fn frame_view(animator: &RankAnimator, title: String, month_label: Option<String>) -> RankView {
    RankView {
        title,
        month_label,
        frame: animator.current_frame().cloned(),
        index: animator.index(),
        total: animator.len(),
        playing: animator.is_playing(),
        interval_ms: animator.interval().as_millis() as u64,
    }
}

pub struct Dashboard {
    store: DataStore,
    config: DashboardConfig,
    view: ViewState,
    rank: RankSettings,
    animator: RankAnimator,
    mini: RankAnimator,
    subscribers: Subscribers,
}

impl Dashboard {
    /// Create a dashboard with an empty store. Load data through
    /// [`Dashboard::store`].
    pub fn new(config: DashboardConfig) -> Self {
        let store = DataStore::new(config.year, config.registry_pollutant);
        let rank = config.rank;
        Self {
            store,
            view: ViewState::new(config.default_city.clone(), config.default_pollutant),
            animator: RankAnimator::new(rank.interval),
            mini: RankAnimator::new(Duration::from_millis(SPEED_OPTIONS_MS[1])),
            rank,
            config,
            subscribers: Subscribers::new(),
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewState {
        &self.view
    }

    pub fn rank_settings(&self) -> RankSettings {
        self.rank
    }

    pub fn animator(&self) -> &RankAnimator {
        &self.animator
    }

    pub fn mini_animator(&self) -> &RankAnimator {
        &self.mini
    }

    // ───────────────────── Observers ─────────────────────

    pub fn subscribe(&mut self, observer: Box<dyn ViewObserver>) -> SubscriptionId {
        self.subscribers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn emit(&mut self, event: ViewEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        let data = self.current_view();
        self.subscribers.notify(&event, &data);
    }

    // ───────────────────── Derivation ─────────────────────

    /// Derive the data of the current mode from the store.
    pub fn current_view(&self) -> ViewData {
        match self.view.mode() {
            NavigationMode::National => ViewData::National(self.national_view()),
            NavigationMode::RegionDrilldown => ViewData::RegionDrilldown(self.drilldown_view()),
            NavigationMode::MonthDetail => ViewData::MonthDetail(self.month_detail_view()),
            NavigationMode::DynamicRank => ViewData::DynamicRank(self.rank_view()),
        }
    }

    fn national_view(&self) -> NationalView {
        let pollutant = self.view.pollutant();
        let index = self.store.date_index().clamp(self.view.date_index());
        let city = self.view.city();
        NationalView {
            pollutant,
            unit: pollutant.unit(),
            date_index: index,
            date: self.store.query_date_string(pollutant, index),
            legend: legend_entries(pollutant),
            heat_ticks: heat_legend_ticks(pollutant),
            map: self.store.query_daily_map_data(pollutant, index),
            city_radar: self.store.query_city_radar(city, index),
            national_radar: self.store.query_national_radar(index),
            info: self.store.query_info_panel(city, pollutant, index),
        }
    }

    fn drilldown_view(&self) -> DrilldownView {
        let pollutant = self.view.pollutant();
        let city = self.view.city();
        let region = self.store.region_of(city);
        let mini_title = {
            let month = self.mini.current_frame().map(|f| f.label.as_str()).unwrap_or("");
            format!("{} {}排名 {}", region, pollutant, month).trim_end().to_string()
        };
        DrilldownView {
            title: format!("{} {}年深度分析", city, self.config.year),
            back_label: self.view.back_label(),
            city: city.to_string(),
            region,
            pollutant,
            city_series: self.store.query_city_year_series(city, pollutant, DRILLDOWN_METRIC),
            national_series: self.store.query_national_daily_mean(pollutant),
            calendar: self.store.query_calendar(city, pollutant),
            ridgeline: self.store.query_ridgeline(city, pollutant),
            raincloud: self.store.query_raincloud(city, pollutant),
            mini_rank: frame_view(&self.mini, mini_title, None),
        }
    }

    fn month_detail_view(&self) -> MonthDetailView {
        let city = self.view.city();
        let month = self.view.month().unwrap_or(1);
        MonthDetailView {
            title: format!("{} {}月详情", city, month),
            back_label: self.view.back_label(),
            detail: self.store.query_month_detail(city, self.view.pollutant(), month),
        }
    }

    fn rank_view(&self) -> RankView {
        let title = chart_title(self.rank.region, self.view.pollutant(), self.rank.order);
        let month_label = self
            .animator
            .current_frame()
            .map(|f| format_month_label(&f.label));
        frame_view(&self.animator, title, month_label)
    }

    fn rank_snapshots(&self) -> Vec<RankSnapshot> {
        self.store.query_rank_snapshots(
            self.view.pollutant(),
            self.rank.region,
            self.rank.order,
            self.rank.top_n,
        )
    }

    fn mini_snapshots(&self) -> Vec<RankSnapshot> {
        let region = self.store.region_of(self.view.city());
        self.store.query_rank_snapshots(
            self.view.pollutant(),
            region,
            RankOrder::Best,
            self.config.mini_rank_top_n,
        )
    }

    /// Rebuild the mini ranking from the current city and pollutant.
    fn refresh_mini(&mut self, now: Duration) {
        let snapshots = self.mini_snapshots();
        self.mini.reconfigure(now, snapshots);
    }

    // ───────────────────── Navigation ─────────────────────

    /// Both animators stop on every mode change and drop the play intent,
    /// so a pointer leaving a torn-down chart cannot restart them.
    fn halt_animations(&mut self) {
        self.animator.pause();
        self.mini.pause();
    }

    fn finish_transition(&mut self, from: NavigationMode) {
        let to = self.view.mode();
        log::debug!("[AQV] view: {} -> {}", from, to);
        self.emit(ViewEvent::ModeChanged { from, to });
    }

    /// Open the yearly dashboard of `city`.
    pub fn drill_down(&mut self, city: &str) -> Result<(), TransitionError> {
        let from = self.view.mode();
        self.view.drill_down(city)?;
        self.halt_animations();
        self.refresh_mini(Duration::ZERO);
        self.finish_transition(from);
        Ok(())
    }

    /// Open the comparison of `month` (1-12).
    pub fn open_month(&mut self, month: u32) -> Result<(), TransitionError> {
        let from = self.view.mode();
        self.view.open_month(month)?;
        self.halt_animations();
        self.finish_transition(from);
        Ok(())
    }

    pub fn back(&mut self) -> Result<NavigationMode, TransitionError> {
        let from = self.view.mode();
        let to = self.view.back()?;
        self.halt_animations();
        self.finish_transition(from);
        Ok(to)
    }

    /// Switch to the racing-bar ranking. It starts paused on the first month.
    pub fn enter_dynamic_rank(&mut self) -> Result<(), TransitionError> {
        let from = self.view.mode();
        self.view.enter_dynamic_rank()?;
        self.halt_animations();
        let snapshots = self.rank_snapshots();
        self.animator.reconfigure(Duration::ZERO, snapshots);
        self.finish_transition(from);
        Ok(())
    }

    pub fn leave_dynamic_rank(&mut self) -> Result<NavigationMode, TransitionError> {
        let from = self.view.mode();
        let to = self.view.leave_dynamic_rank()?;
        self.halt_animations();
        self.finish_transition(from);
        Ok(to)
    }

    // ───────────────────── Selection ─────────────────────

    /// Select `city`. A city in another region rebuilds the mini ranking.
    pub fn select_city(&mut self, now: Duration, city: &str) -> Result<(), TransitionError> {
        let region = self.store.region_of(self.view.city());
        self.view.select_city(city)?;
        if self.store.region_of(self.view.city()) != region {
            self.refresh_mini(now);
        }
        let city = self.view.city().to_string();
        self.emit(ViewEvent::CitySelected(city));
        Ok(())
    }

    /// Change the pollutant everywhere. Both rankings are recomputed
    /// without changing their play state, so returning to another mode
    /// never shows frames of the previous pollutant.
    pub fn set_pollutant(&mut self, now: Duration, pollutant: Pollutant) {
        self.view.set_pollutant(pollutant);
        let snapshots = self.rank_snapshots();
        self.animator.reconfigure(now, snapshots);
        self.refresh_mini(now);
        self.emit(ViewEvent::PollutantChanged(pollutant));
    }

    /// Select a day by row index, clamped to the loaded dataset. Returns
    /// the index actually selected.
    pub fn set_date_index(&mut self, index: usize) -> usize {
        let index = self.store.date_index().clamp(index);
        self.view.set_date_index(index);
        self.emit(ViewEvent::DateChanged(index));
        index
    }

    /// Select a day by calendar position.
    pub fn set_date(&mut self, month: u32, day: u32) -> usize {
        let index = self.store.date_index().index_from_date(month, day);
        self.set_date_index(index)
    }

    // ───────────────────── Dynamic ranking ─────────────────────

    fn reconfigure_rank(&mut self, now: Duration) {
        let snapshots = self.rank_snapshots();
        self.animator.reconfigure(now, snapshots);
        self.emit(ViewEvent::RankReconfigured);
    }

    pub fn rank_set_region(&mut self, now: Duration, region: Region) {
        self.rank.region = region;
        self.reconfigure_rank(now);
    }

    pub fn rank_set_order(&mut self, now: Duration, order: RankOrder) {
        self.rank.order = order;
        self.reconfigure_rank(now);
    }

    /// `0` shows every city.
    pub fn rank_set_top_n(&mut self, now: Duration, top_n: usize) {
        self.rank.top_n = top_n;
        self.reconfigure_rank(now);
    }

    pub fn rank_set_speed(&mut self, now: Duration, interval: Duration) {
        self.rank.interval = interval;
        self.animator.set_interval(now, interval);
        self.emit(ViewEvent::RankReconfigured);
    }

    pub fn rank_toggle(&mut self, now: Duration) {
        self.animator.toggle(now);
        let playing = self.animator.is_playing();
        self.emit(ViewEvent::PlaybackChanged { playing });
    }

    pub fn rank_reset(&mut self) {
        self.animator.reset();
        self.emit(ViewEvent::PlaybackChanged { playing: false });
    }

    pub fn rank_pointer_enter(&mut self) {
        self.animator.pointer_enter();
    }

    pub fn rank_pointer_leave(&mut self, now: Duration) {
        self.animator.pointer_leave(now);
    }

    // ───────────────────── Mini ranking ─────────────────────

    pub fn mini_toggle(&mut self, now: Duration) {
        self.mini.toggle(now);
        let playing = self.mini.is_playing();
        self.emit(ViewEvent::PlaybackChanged { playing });
    }

    pub fn mini_set_speed(&mut self, now: Duration, interval: Duration) {
        self.mini.set_interval(now, interval);
    }

    // ───────────────────── Timers ─────────────────────

    /// Advance whichever animator is due. Returns the number of frames
    /// that changed.
    pub fn poll(&mut self, now: Duration) -> usize {
        let mut advanced = 0;
        if let Some(index) = self.animator.poll(now) {
            advanced += 1;
            self.emit(ViewEvent::RankFrame(index));
        }
        if let Some(index) = self.mini.poll(now) {
            advanced += 1;
            self.emit(ViewEvent::MiniRankFrame(index));
        }
        advanced
    }
}

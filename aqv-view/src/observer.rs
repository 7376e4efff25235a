//! Change notification for renderers.
//!
//! A renderer implements [`ViewObserver`] and registers with
//! [`Subscribers::subscribe`]. Every state change is delivered as a
//! [`ViewEvent`] together with the freshly derived [`ViewData`], so an
//! observer never has to call back into the dashboard while it is borrowed.

use crate::dashboard::ViewData;
use crate::state::NavigationMode;
use aqv_core::pollutant::Pollutant;
use serde::Serialize;

/// What changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ViewEvent {
    ModeChanged {
        from: NavigationMode,
        to: NavigationMode,
    },
    PollutantChanged(Pollutant),
    DateChanged(usize),
    CitySelected(String),
    /// The rank animator advanced to `index`.
    RankFrame(usize),
    /// The drill-down mini ranking advanced to `index`.
    MiniRankFrame(usize),
    /// Region, order, top-N or speed of the ranking changed.
    RankReconfigured,
    /// Play, pause or reset of either ranking.
    PlaybackChanged { playing: bool },
}

pub trait ViewObserver {
    fn on_view_change(&mut self, event: &ViewEvent, data: &ViewData);
}

/// Handle returned by [`Subscribers::subscribe`].
pub type SubscriptionId = u32;

/// Registered observers in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: SubscriptionId,
    observers: Vec<(SubscriptionId, Box<dyn ViewObserver>)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn ViewObserver>) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, observer));
        log::debug!("[AQV] observer: subscribed #{}", id);
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        let removed = self.observers.len() != before;
        if removed {
            log::debug!("[AQV] observer: unsubscribed #{}", id);
        }
        removed
    }

    pub fn notify(&mut self, event: &ViewEvent, data: &ViewData) {
        for (_, observer) in self.observers.iter_mut() {
            observer.on_view_change(event, data);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("next_id", &self.next_id)
            .field("len", &self.observers.len())
            .finish()
    }
}

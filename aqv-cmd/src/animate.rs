//! Commands driving the dashboard context over time.
//!
//! `rank` plays the dynamic ranking against a `tokio` interval; `session`
//! replays a scripted list of navigation steps and prints every
//! notification the dashboard sends.

use aqv_core::pollutant::Pollutant;
use aqv_data::ranking::RankSnapshot;
use aqv_view::dashboard::{Dashboard, ViewData};
use aqv_view::observer::{ViewEvent, ViewObserver};
use log::info;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How often the event loop polls the animators.
const POLL_PERIOD: Duration = Duration::from_millis(50);

fn print_frame(title: &str, frame: &RankSnapshot) {
    println!("{} · {}", title, aqv_data::ranking::format_month_label(&frame.label));
    for entry in &frame.entries {
        println!("{:>3}. {:<8} {:>8.1}", entry.rank, entry.city, entry.value);
    }
}

/// Play the dynamic ranking for `frames` frames after the first.
pub async fn run_rank(mut dashboard: Dashboard, frames: usize) -> anyhow::Result<()> {
    dashboard.enter_dynamic_rank()?;
    let ViewData::DynamicRank(view) = dashboard.current_view() else {
        anyhow::bail!("dashboard did not enter the dynamic ranking");
    };
    let Some(first) = view.frame else {
        anyhow::bail!("no monthly data for {}", view.title);
    };
    print_frame(&view.title, &first);

    let start = tokio::time::Instant::now();
    dashboard.rank_toggle(Duration::ZERO);
    let mut ticker = tokio::time::interval(POLL_PERIOD);
    let mut shown = 0;
    while shown < frames {
        ticker.tick().await;
        if dashboard.poll(start.elapsed()) == 0 {
            continue;
        }
        if let Some(frame) = dashboard.animator().current_frame() {
            print_frame(&view.title, frame);
        }
        shown += 1;
    }
    dashboard.rank_reset();
    info!("[AQV] rank: played {} frames", shown);
    Ok(())
}

/// One scripted interaction of a `session`.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Drill(String),
    Month(u32),
    Back,
    Rank,
    Leave,
    City(String),
    Pollutant(Pollutant),
    Date(u32, u32),
    Play,
    /// Let `n` milliseconds pass.
    Wait(u64),
}

impl FromStr for Step {
    type Err = String;

    /// Steps read `name` or `name=arg`, e.g. `drill=沈阳`, `month=3`,
    /// `date=02-15`, `wait=2000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.trim().split_once('=') {
            Some((n, a)) => (n.trim(), Some(a.trim())),
            None => (s.trim(), None),
        };
        let need = |what: &str| arg.ok_or_else(|| format!("step '{}' needs {}", name, what));
        let number = |v: &str| v.parse::<u64>().map_err(|e| format!("bad number '{}': {}", v, e));
        let small = |v: &str| v.parse::<u32>().map_err(|e| format!("bad number '{}': {}", v, e));
        match name {
            "drill" => Ok(Step::Drill(need("a city")?.to_string())),
            "month" => Ok(Step::Month(small(need("a month")?)?)),
            "back" => Ok(Step::Back),
            "rank" => Ok(Step::Rank),
            "leave" => Ok(Step::Leave),
            "city" => Ok(Step::City(need("a city")?.to_string())),
            "pollutant" => Ok(Step::Pollutant(need("a pollutant")?.parse()?)),
            "date" => {
                let raw = need("MM-DD")?;
                let (m, d) = raw
                    .split_once('-')
                    .ok_or_else(|| format!("date '{}' is not MM-DD", raw))?;
                Ok(Step::Date(small(m)?, small(d)?))
            }
            "play" => Ok(Step::Play),
            "wait" => Ok(Step::Wait(number(need("milliseconds")?)?)),
            other => Err(format!("unknown step '{}'", other)),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Drill(c) => write!(f, "drill={}", c),
            Step::Month(m) => write!(f, "month={}", m),
            Step::Back => write!(f, "back"),
            Step::Rank => write!(f, "rank"),
            Step::Leave => write!(f, "leave"),
            Step::City(c) => write!(f, "city={}", c),
            Step::Pollutant(p) => write!(f, "pollutant={}", p),
            Step::Date(m, d) => write!(f, "date={:02}-{:02}", m, d),
            Step::Play => write!(f, "play"),
            Step::Wait(ms) => write!(f, "wait={}", ms),
        }
    }
}

/// Parse a comma separated step list.
pub fn parse_steps(script: &str) -> anyhow::Result<Vec<Step>> {
    script
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Step>().map_err(anyhow::Error::msg))
        .collect()
}

#[derive(Serialize)]
struct Notification<'a> {
    event: &'a ViewEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    view: Option<&'a ViewData>,
}

/// Prints every notification as one JSON line.
struct JsonPrinter {
    full: bool,
}

impl ViewObserver for JsonPrinter {
    fn on_view_change(&mut self, event: &ViewEvent, data: &ViewData) {
        let line = Notification {
            event,
            view: self.full.then_some(data),
        };
        match serde_json::to_string(&line) {
            Ok(json) => println!("{}", json),
            Err(e) => log::warn!("[AQV] session: cannot encode notification: {}", e),
        }
    }
}

/// Apply `step` at simulated time `now`. Returns the time after the step.
fn apply(dashboard: &mut Dashboard, step: &Step, now: Duration) -> anyhow::Result<Duration> {
    match step {
        Step::Drill(city) => dashboard.drill_down(city)?,
        Step::Month(m) => dashboard.open_month(*m)?,
        Step::Back => {
            dashboard.back()?;
        }
        Step::Rank => dashboard.enter_dynamic_rank()?,
        Step::Leave => {
            dashboard.leave_dynamic_rank()?;
        }
        Step::City(city) => dashboard.select_city(now, city)?,
        Step::Pollutant(p) => dashboard.set_pollutant(now, *p),
        Step::Date(m, d) => {
            dashboard.set_date(*m, *d);
        }
        Step::Play => match dashboard.state().mode() {
            aqv_view::state::NavigationMode::DynamicRank => dashboard.rank_toggle(now),
            _ => dashboard.mini_toggle(now),
        },
        Step::Wait(ms) => {
            let end = now + Duration::from_millis(*ms);
            let mut t = now;
            while t < end {
                t = (t + POLL_PERIOD).min(end);
                dashboard.poll(t);
            }
            return Ok(end);
        }
    }
    Ok(now)
}

/// Replay `steps` on simulated time. A rejected transition is reported
/// and the session continues.
pub fn run_session(mut dashboard: Dashboard, steps: &[Step], full: bool) -> anyhow::Result<()> {
    dashboard.subscribe(Box::new(JsonPrinter { full }));
    let mut now = Duration::ZERO;
    for step in steps {
        info!("[AQV] session: {}", step);
        match apply(&mut dashboard, step, now) {
            Ok(t) => now = t,
            Err(e) => log::warn!("[AQV] session: {} rejected: {}", step, e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqv_view::config::DashboardConfig;
    use aqv_view::state::NavigationMode;

    #[test]
    fn test_parse_steps() {
        let steps = parse_steps("drill=沈阳, month=3,back,date=02-15,pollutant=pm2.5,wait=500").unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Drill("沈阳".to_string()),
                Step::Month(3),
                Step::Back,
                Step::Date(2, 15),
                Step::Pollutant(Pollutant::Pm25),
                Step::Wait(500),
            ]
        );
        assert!(parse_steps("drill").is_err());
        assert!(parse_steps("fly=away").is_err());
        assert!(parse_steps("date=0215").is_err());
        // out of u32 range must not wrap onto a valid month
        assert!(parse_steps("month=4294967299").is_err());
        assert!(parse_steps("date=02-4294967311").is_err());
    }

    #[test]
    fn test_step_display_round_trips() {
        for s in ["drill=北京", "month=12", "date=03-01", "wait=10", "leave"] {
            assert_eq!(s.parse::<Step>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_apply_navigation_and_wait() {
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        dashboard
            .store()
            .load_dataset(
                Pollutant::Aqi,
                aqv_core::pollutant::Metric::Mean,
                "date,沈阳,大连\n2025-01-01,40,60\n2025-02-01,50,30\n",
            )
            .unwrap();
        let mut now = Duration::ZERO;
        for step in parse_steps("rank,play,wait=2000").unwrap() {
            now = apply(&mut dashboard, &step, now).unwrap();
        }
        assert_eq!(now, Duration::from_millis(2000));
        assert_eq!(dashboard.state().mode(), NavigationMode::DynamicRank);
        assert_eq!(dashboard.animator().index(), 1);

        assert!(apply(&mut dashboard, &Step::Month(2), now).is_err());
        apply(&mut dashboard, &Step::Leave, now).unwrap();
        assert_eq!(dashboard.state().mode(), NavigationMode::National);
    }
}

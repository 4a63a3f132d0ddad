//! Debounced save scheduling.
//!
//! [`SaveScheduler`] is a pure state machine over a [`Clock`]: the host asks
//! it for the next deadline, arms exactly one timer for it, and calls
//! [`SaveScheduler::poll`] when the timer fires. Every request pushes the save
//! back by the quiet period and cancels a pending indicator hide.

use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds since some fixed origin.
pub trait Clock {
	fn now_ms(&self) -> f64;
}

/// `Date.now()` in the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
	fn now_ms(&self) -> f64 {
		js_sys::Date::now()
	}
}

/// Manually advanced clock; clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
	pub fn advance(&self, ms: f64) {
		self.0.set(self.0.get() + ms);
	}
}

impl Clock for ManualClock {
	fn now_ms(&self) -> f64 {
		self.0.get()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct AutosaveConfig {
	/// How long mutations must stop before a save fires.
	pub quiet_period_ms: f64,
	/// Shortest time the saving indicator stays up.
	pub min_indicator_ms: f64,
}

impl Default for AutosaveConfig {
	fn default() -> Self {
		Self {
			quiet_period_ms: 1000.0,
			min_indicator_ms: 500.0,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveEvent {
	/// Show the indicator and start the persistence call.
	Fire,
	/// The indicator may go away.
	HideIndicator,
}

#[derive(Debug)]
pub struct SaveScheduler<C: Clock> {
	clock: C,
	config: AutosaveConfig,
	save_at: Option<f64>,
	hide_at: Option<f64>,
	/// Saves started but not yet completed. Saves may overlap.
	in_flight: u32,
	indicator_visible: bool,
}

impl<C: Clock> SaveScheduler<C> {
	pub fn new(clock: C, config: AutosaveConfig) -> Self {
		Self {
			clock,
			config,
			save_at: None,
			hide_at: None,
			in_flight: 0,
			indicator_visible: false,
		}
	}

	/// A mutation happened: (re)arm the save and drop any pending hide.
	pub fn request(&mut self) {
		self.save_at = Some(self.clock.now_ms() + self.config.quiet_period_ms);
		self.hide_at = None;
	}

	/// Advance to the current time. Fires at most one event per call.
	pub fn poll(&mut self) -> Option<SaveEvent> {
		let now = self.clock.now_ms();
		if self.save_at.is_some_and(|at| at <= now) {
			self.save_at = None;
			self.hide_at = Some(now + self.config.min_indicator_ms);
			self.in_flight += 1;
			self.indicator_visible = true;
			return Some(SaveEvent::Fire);
		}
		if self.indicator_visible
			&& self.in_flight == 0
			&& self.save_at.is_none()
			&& self.hide_at.is_some_and(|at| at <= now)
		{
			self.hide_at = None;
			self.indicator_visible = false;
			return Some(SaveEvent::HideIndicator);
		}
		None
	}

	/// One persistence call returned, successfully or not.
	pub fn complete(&mut self) -> Option<SaveEvent> {
		self.in_flight = self.in_flight.saturating_sub(1);
		self.poll()
	}

	/// Milliseconds until the next deadline worth waking up for.
	pub fn next_delay_ms(&self) -> Option<f64> {
		let hide_at = self.hide_at.filter(|_| self.in_flight == 0);
		let next = match (self.save_at, hide_at) {
			(Some(a), Some(b)) => a.min(b),
			(a, b) => a.or(b)?,
		};
		Some((next - self.clock.now_ms()).max(0.0))
	}

	pub fn is_pending(&self) -> bool {
		self.save_at.is_some()
	}

	pub fn is_indicator_visible(&self) -> bool {
		self.indicator_visible
	}
}

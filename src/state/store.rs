// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concurrent store of per-light state with change detection.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::RgbColor;

use super::{LightState, StateObserver};

/// One slug's record. `None` until the first update has been applied, so
/// readers never see a half-initialized entry.
type Slot = Arc<RwLock<Option<LightState>>>;

/// Process-wide store of light state, keyed by slug.
///
/// Each slug has its own lock. The map lock is only held long enough to
/// find or insert a slot, so updates to different slugs do not wait on each
/// other, while updates to the same slug are applied one at a time.
///
/// # Thread Safety
///
/// The store is `Send + Sync` and is meant to be shared behind an `Arc`
/// between the poller, the command resolver and any number of readers.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::state::StateStore;
///
/// let store = StateStore::new();
/// assert!(store.get("d1-wall").is_none());
///
/// store.update("d1-wall", "Wall", true, None);
/// let wall = store.get("d1-wall").unwrap();
/// assert!(wall.is_on());
/// assert_eq!(wall.name(), "Wall");
/// ```
#[derive(Default)]
pub struct StateStore {
    slots: RwLock<HashMap<String, Slot>>,
    observer: Option<Arc<dyn StateObserver>>,
}

impl StateStore {
    /// Creates an empty store without an observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the observer notified on every observable change.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StateObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns a copy of the latest record for `slug`, if one exists.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<LightState> {
        let slot = self.slots.read().get(slug).cloned()?;
        slot.read().clone()
    }

    /// Applies an update to the record for `slug`, creating it if needed.
    ///
    /// A new record starts in the zero state (off, no color) with `name` as
    /// its display name, then the update is applied to it. See
    /// [`LightState::apply`] for how each field is merged.
    ///
    /// If the power state or color differs from the previous record, the
    /// observer is called exactly once with the new record. Repeating the
    /// same update is silent.
    ///
    /// The observer runs after the record's lock is released. Two concurrent
    /// updates of the same slug therefore commit in one order but may notify
    /// in the other, so the last notification is not guaranteed to match
    /// [`get`](Self::get). Like a stale poll result, this is corrected by the
    /// next change of that light.
    ///
    /// Returns `true` if a change was detected.
    pub fn update(&self, slug: &str, name: &str, on: bool, color: Option<RgbColor>) -> bool {
        let slot = self.slot(slug);

        let changed = {
            let mut guard = slot.write();
            let mut next = guard
                .clone()
                .unwrap_or_else(|| LightState::new(slug, name));
            let changed = next.apply(name, on, color);
            *guard = Some(next.clone());
            changed.then_some(next)
        };

        let Some(state) = changed else {
            return false;
        };

        tracing::debug!(
            slug = %slug,
            on = state.is_on(),
            color = ?state.color(),
            "Light state changed"
        );

        if let Some(observer) = &self.observer {
            observer.on_state_changed(slug, &state);
        }
        true
    }

    /// Returns the number of known lights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.read().is_some())
            .count()
    }

    /// Returns `true` if no light has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of every record, in no particular order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LightState> {
        let slots: Vec<Slot> = self.slots.read().values().cloned().collect();
        slots.iter().filter_map(|slot| slot.read().clone()).collect()
    }

    /// Finds or inserts the slot for `slug`.
    fn slot(&self, slug: &str) -> Slot {
        if let Some(slot) = self.slots.read().get(slug) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().entry(slug.to_string()).or_default())
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("lights", &self.len())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, LightState)>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<(String, LightState)> {
            self.events.lock().clone()
        }

        fn count(&self) -> usize {
            self.events.lock().len()
        }
    }

    impl StateObserver for Recorder {
        fn on_state_changed(&self, slug: &str, state: &LightState) {
            self.events.lock().push((slug.to_string(), state.clone()));
        }
    }

    fn recorded_store() -> (StateStore, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let store = StateStore::new().with_observer(Arc::clone(&recorder) as Arc<dyn StateObserver>);
        (store, recorder)
    }

    #[test]
    fn get_missing_returns_none() {
        let store = StateStore::new();
        assert!(store.get("nope").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn first_update_creates_record() {
        let (store, recorder) = recorded_store();
        assert!(!store.update("d1-wall", "Wall", false, None));

        let state = store.get("d1-wall").unwrap();
        assert_eq!(state.slug(), "d1-wall");
        assert_eq!(state.name(), "Wall");
        assert!(!state.is_on());
        assert_eq!(state.color(), None);
        assert_eq!(store.len(), 1);
        // Off with no color equals the zero baseline
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn first_observation_on_notifies_once() {
        let (store, recorder) = recorded_store();
        assert!(store.update("d1-wall", "Wall", true, None));

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "d1-wall");
        assert!(events[0].1.is_on());
    }

    #[test]
    fn first_observation_with_color_notifies() {
        let (store, recorder) = recorded_store();
        store.update("d1-wall", "Wall", false, Some(RgbColor::new(1, 2, 3)));
        assert_eq!(recorder.count(), 1);
        assert_eq!(
            store.get("d1-wall").unwrap().color(),
            Some(RgbColor::new(1, 2, 3))
        );
    }

    #[test]
    fn identical_updates_notify_at_most_once() {
        let (store, recorder) = recorded_store();
        let color = Some(RgbColor::new(9, 9, 9));
        store.update("d1-wall", "Wall", true, color);
        store.update("d1-wall", "Wall", true, color);
        store.update("d1-wall", "Wall", true, color);
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn missing_color_keeps_cached_color() {
        let (store, recorder) = recorded_store();
        store.update("d1-wall", "Wall", true, Some(RgbColor::new(10, 20, 30)));
        store.update("d1-wall", "Wall", true, RgbColor::from_channels(&[1, 2]));

        assert_eq!(
            store.get("d1-wall").unwrap().color(),
            Some(RgbColor::new(10, 20, 30))
        );
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn empty_name_preserves_display_name() {
        let (store, _) = recorded_store();
        store.update("d1-wall", "Wall", false, None);
        store.update("d1-wall", "", true, None);
        assert_eq!(store.get("d1-wall").unwrap().name(), "Wall");
    }

    #[test]
    fn power_toggle_notifies_each_transition() {
        let (store, recorder) = recorded_store();
        store.update("d1-wall", "Wall", false, None);
        store.update("d1-wall", "Wall", true, None);
        store.update("d1-wall", "Wall", true, None);
        store.update("d1-wall", "Wall", false, None);

        let states: Vec<bool> = recorder.events().iter().map(|(_, s)| s.is_on()).collect();
        assert_eq!(states, vec![true, false]);
    }

    #[test]
    fn store_matches_fold_over_updates() {
        let (store, _) = recorded_store();
        let updates: [(&str, bool, Option<RgbColor>); 5] = [
            ("Wall", false, None),
            ("", true, Some(RgbColor::new(1, 1, 1))),
            ("Wall 2", false, None),
            ("", true, None),
            ("", true, Some(RgbColor::new(2, 2, 2))),
        ];

        let mut expected = LightState::new("d1-wall", "Wall");
        for (name, on, color) in updates {
            store.update("d1-wall", name, on, color);
            expected.apply(name, on, color);
        }

        assert_eq!(store.get("d1-wall").unwrap(), expected);
    }

    #[test]
    fn snapshot_lists_all_lights() {
        let store = StateStore::new();
        store.update("d1-a", "A", true, None);
        store.update("d1-b", "B", false, None);

        let mut slugs: Vec<String> = store
            .snapshot()
            .into_iter()
            .map(|s| s.slug().to_string())
            .collect();
        slugs.sort();
        assert_eq!(slugs, vec!["d1-a", "d1-b"]);
    }

    #[test]
    fn closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let store = StateStore::new().with_observer(Arc::new(move |slug: &str, _: &LightState| {
            sink.lock().push(slug.to_string());
        }));

        store.update("d1-wall", "Wall", true, None);
        assert_eq!(*seen.lock(), vec!["d1-wall".to_string()]);
    }

    #[test]
    fn concurrent_same_slug_updates_notify_once() {
        const THREADS: usize = 16;
        let (store, recorder) = recorded_store();
        let barrier = Barrier::new(THREADS);

        thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    barrier.wait();
                    store.update("d1-wall", "Wall", true, Some(RgbColor::new(5, 5, 5)));
                });
            }
        });

        assert_eq!(recorder.count(), 1);
        let state = store.get("d1-wall").unwrap();
        assert!(state.is_on());
        assert_eq!(state.color(), Some(RgbColor::new(5, 5, 5)));
    }

    #[test]
    fn concurrent_distinct_slugs_are_all_recorded() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50;
        let (store, recorder) = recorded_store();

        thread::scope(|scope| {
            for t in 0..THREADS {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        store.update(&format!("d{t}-light_{i}"), "Light", true, None);
                    }
                });
            }
        });

        assert_eq!(store.len(), THREADS * PER_THREAD);
        assert_eq!(recorder.count(), THREADS * PER_THREAD);
    }

    #[test]
    fn contended_toggles_notify_once_per_detected_change() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 100;
        let (store, recorder) = recorded_store();
        let detected = std::sync::atomic::AtomicUsize::new(0);

        thread::scope(|scope| {
            for t in 0..THREADS {
                let (store, detected) = (&store, &detected);
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        if store.update("d1-wall", "Wall", (t + i) % 2 == 0, None) {
                            detected.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        // Delivery order may differ from commit order, but no change is lost
        // or reported twice.
        assert_eq!(
            recorder.count(),
            detected.load(std::sync::atomic::Ordering::Relaxed)
        );
        let latest = store.get("d1-wall").unwrap();
        assert!(
            recorder
                .events()
                .iter()
                .any(|(_, state)| state.is_on() == latest.is_on())
                || recorder.count() == 0
        );
    }
}

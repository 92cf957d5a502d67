// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic polling of devices into the state store.
//!
//! On every tick the [`Poller`] spawns one independent task per device. Each
//! task fetches the device's overlay model listing, bounded by the polling
//! interval, and feeds every model into the [`StateStore`]. A slow or failing
//! device is logged and skipped; it never delays the others or stops the
//! loop.
//!
//! Fetch tasks are not tracked. A fetch still in flight when the poller is
//! stopped may complete and write to the store afterwards, and a slow fetch
//! from one tick may land after a newer one. Both are tolerated: the next
//! tick corrects the state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{ConfigError, Error, FetchError};
use crate::protocol::OverlayFetcher;
use crate::slug::slug;
use crate::state::StateStore;

/// Polls a fixed set of devices on a fixed interval.
///
/// The poller has two states: stopped (initially) and running. Starting a
/// running poller is an error; stopping a stopped poller does nothing.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use fpp_mqtt_bridge::poller::Poller;
/// use fpp_mqtt_bridge::protocol::HttpFetcher;
/// use fpp_mqtt_bridge::state::StateStore;
///
/// # async fn example() -> fpp_mqtt_bridge::Result<()> {
/// let store = Arc::new(StateStore::new());
/// let mut poller = Poller::new(Arc::new(HttpFetcher::new()?))
///     .with_devices(["fpp-garage", "fpp-porch"])
///     .with_interval(Duration::from_secs(2))
///     .with_store(Arc::clone(&store));
///
/// poller.start()?;
/// tokio::time::sleep(Duration::from_secs(10)).await;
/// poller.stop();
/// # Ok(())
/// # }
/// ```
pub struct Poller<F> {
    devices: Arc<[String]>,
    interval: Duration,
    store: Option<Arc<StateStore>>,
    fetcher: Arc<F>,
    running: Option<RunningLoop>,
}

struct RunningLoop {
    stop_tx: watch::Sender<bool>,
    // Detached on stop; the loop exits on its own.
    _handle: JoinHandle<()>,
}

impl<F: OverlayFetcher> Poller<F> {
    /// Shortest accepted polling interval.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Default polling interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    /// Creates a stopped poller with no devices and no store.
    #[must_use]
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            devices: Arc::from(Vec::new()),
            interval: Self::DEFAULT_INTERVAL,
            store: None,
            fetcher,
            running: None,
        }
    }

    /// Sets the devices to poll.
    #[must_use]
    pub fn with_devices<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devices = devices.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the polling interval. Also the timeout of each fetch.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Binds the store that receives polled state.
    #[must_use]
    pub fn with_store(mut self, store: Arc<StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Returns the configured devices.
    #[must_use]
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` while the polling loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Checks the device list and interval, ignoring the store.
    ///
    /// Lets a caller reject a bad schedule before the store and its
    /// observer exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyDeviceList` if no device is configured,
    /// then `ConfigError::IntervalTooShort` if the interval is below one
    /// second.
    pub fn check_schedule(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::EmptyDeviceList);
        }
        if self.interval < Self::MIN_INTERVAL {
            return Err(ConfigError::IntervalTooShort(self.interval));
        }
        Ok(())
    }

    /// Checks the configuration and returns the bound store.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, checked in this order:
    /// - `ConfigError::EmptyDeviceList` if no device is configured
    /// - `ConfigError::IntervalTooShort` if the interval is below one second
    /// - `ConfigError::MissingStateSink` if no store is bound
    pub fn validate(&self) -> Result<Arc<StateStore>, ConfigError> {
        self.check_schedule()?;
        self.store.clone().ok_or(ConfigError::MissingStateSink)
    }

    /// Starts the polling loop and returns immediately.
    ///
    /// The first tick happens one interval after starting. Must be called
    /// from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if [`validate`](Self::validate) fails, or
    /// `Error::AlreadyRunning` if the loop is already running.
    pub fn start(&mut self) -> Result<(), Error> {
        let store = self.validate()?;
        if self.running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        tracing::debug!(
            interval = ?self.interval,
            devices = self.devices.len(),
            "Starting poll loop"
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.devices),
            self.interval,
            store,
            Arc::clone(&self.fetcher),
            stop_rx,
        ));

        self.running = Some(RunningLoop {
            stop_tx,
            _handle: handle,
        });
        Ok(())
    }

    /// Signals the loop to stop after its current tick.
    ///
    /// Fetches already in flight are left to finish. Calling this on a
    /// stopped poller is a no-op.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            tracing::debug!("Poll loop is not running; ignoring stop");
            return;
        };
        tracing::debug!("Stopping poll loop");
        // The receiver may already be gone if the loop ended on its own.
        let _ = running.stop_tx.send(true);
    }
}

impl<F> std::fmt::Debug for Poller<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("devices", &self.devices)
            .field("interval", &self.interval)
            .field("has_store", &self.store.is_some())
            .field("running", &self.running.is_some())
            .finish_non_exhaustive()
    }
}

/// Fetches one device and applies its models to the store.
///
/// The fetch is abandoned after `timeout`. Polling never carries color, so
/// cached colors are left as they are. Returns the number of models read.
///
/// # Errors
///
/// Returns `FetchError::Timeout` if the device did not answer in time, or
/// whatever error the fetcher reported.
pub async fn poll_device<F: OverlayFetcher>(
    fetcher: &F,
    store: &StateStore,
    device: &str,
    timeout: Duration,
) -> Result<usize, FetchError> {
    let models = tokio::time::timeout(timeout, fetcher.fetch_models(device))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    for model in &models {
        store.update(&slug(device, &model.name), &model.name, model.is_on(), None);
    }

    Ok(models.len())
}

async fn run_loop<F: OverlayFetcher>(
    devices: Arc<[String]>,
    interval: Duration,
    store: Arc<StateStore>,
    fetcher: Arc<F>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Fires on stop() and when the poller is dropped.
            _ = stop_rx.changed() => {
                tracing::debug!("Exiting poll loop");
                return;
            }
            _ = ticker.tick() => {
                tracing::debug!("Querying controllers for information");
                for device in devices.iter() {
                    spawn_fetch(device.clone(), interval, Arc::clone(&store), Arc::clone(&fetcher));
                }
            }
        }
    }
}

fn spawn_fetch<F: OverlayFetcher>(
    device: String,
    timeout: Duration,
    store: Arc<StateStore>,
    fetcher: Arc<F>,
) {
    tokio::spawn(async move {
        match poll_device(fetcher.as_ref(), &store, &device, timeout).await {
            Ok(count) => tracing::debug!(device = %device, models = count, "Polled controller"),
            Err(e) => tracing::warn!(device = %device, error = %e, "Could not query the controller state"),
        }
    });
}

//! Fetch-on-demand coordination between a [`ForecastClient`] and whoever
//! displays the result.
//!
//! The coordinator is a single writer: requests are spawned onto the Tokio
//! runtime, but their completions are only applied when the owner calls
//! [`ForecastCoordinator::process_next`] (or [`ForecastCoordinator::run_until_idle`]).
//! Every state change and every notification therefore happens on the
//! owner's task, in the order completions arrive.
//!
//! Overlapping requests are not deduplicated or cancelled. Whichever
//! completion is applied last owns the forecast list.

use std::{fmt, sync::Arc};

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{client::ForecastClient, error::ForecastError, model::ForecastDay};

/// Handle returned by the `on_*` registration methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T) + Send>;

struct Observers<T: ?Sized> {
    entries: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T: ?Sized> Observers<T> {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn add(&mut self, id: SubscriptionId, callback: Callback<T>) {
        self.entries.push((id, callback));
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    fn notify(&mut self, value: &T) {
        for (_, callback) in &mut self.entries {
            callback(value);
        }
    }
}

struct Completion {
    city: String,
    result: Result<Vec<ForecastDay>, ForecastError>,
}

pub struct ForecastCoordinator {
    client: Arc<dyn ForecastClient>,
    forecast: Vec<ForecastDay>,
    is_loading: bool,
    in_flight: JoinSet<Completion>,
    next_subscription: u64,
    loading_changed: Observers<bool>,
    city_updated: Observers<str>,
    forecast_updated: Observers<[ForecastDay]>,
    error_occurred: Observers<str>,
}

impl ForecastCoordinator {
    pub fn new(client: Arc<dyn ForecastClient>) -> Self {
        Self {
            client,
            forecast: Vec::new(),
            is_loading: false,
            in_flight: JoinSet::new(),
            next_subscription: 0,
            loading_changed: Observers::new(),
            city_updated: Observers::new(),
            forecast_updated: Observers::new(),
            error_occurred: Observers::new(),
        }
    }

    /// Days from the last successful fetch; empty until one succeeds.
    pub fn forecast(&self) -> &[ForecastDay] {
        &self.forecast
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Number of requests whose completion has not been applied yet.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Start fetching `city`. Must be called from within a Tokio runtime.
    ///
    /// Loading subscribers hear `true` immediately; everything else is
    /// delivered once the completion is processed.
    pub fn request_forecast(&mut self, city: &str) {
        debug!(city, pending = self.in_flight.len(), "forecast requested");
        self.set_loading(true);

        let client = Arc::clone(&self.client);
        let city = city.to_string();
        self.in_flight.spawn(async move {
            let result = client.fetch(&city).await;
            Completion { city, result }
        });
    }

    /// Wait for the next in-flight request to finish and apply it.
    ///
    /// Returns `false` when nothing was in flight.
    pub async fn process_next(&mut self) -> bool {
        let Some(joined) = self.in_flight.join_next().await else {
            return false;
        };

        match joined {
            Ok(completion) => self.complete(completion),
            Err(e) => {
                // The city is lost with the task; still close out the loading cycle.
                error!(error = %e, "forecast task did not complete");
                self.set_loading(false);
                let err = ForecastError::NetworkFailure(e.to_string());
                self.error_occurred.notify(err.user_message());
            }
        }

        true
    }

    /// Apply completions until no request is in flight.
    pub async fn run_until_idle(&mut self) {
        while self.process_next().await {}
    }

    fn complete(&mut self, Completion { city, result }: Completion) {
        self.set_loading(false);
        // Updated even when the fetch failed.
        self.city_updated.notify(&capitalize_words(&city));

        match result {
            Ok(days) => {
                info!(city = %city, days = days.len(), "forecast updated");
                self.forecast = days;
                self.forecast_updated.notify(&self.forecast);
            }
            Err(err) => {
                warn!(city = %city, error = %err, "forecast request failed");
                self.error_occurred.notify(err.user_message());
            }
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.loading_changed.notify(&loading);
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    pub fn on_loading_changed<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(bool) + Send + 'static,
    {
        let id = self.next_id();
        self.loading_changed.add(id, Box::new(move |loading: &bool| callback(*loading)));
        id
    }

    /// Receives the capitalized city name after every completed request.
    pub fn on_city_updated<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&str) + Send + 'static,
    {
        let id = self.next_id();
        self.city_updated.add(id, Box::new(callback));
        id
    }

    pub fn on_forecast_updated<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&[ForecastDay]) + Send + 'static,
    {
        let id = self.next_id();
        self.forecast_updated.add(id, Box::new(callback));
        id
    }

    /// Receives a user-facing message for every failed request.
    pub fn on_error_occurred<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&str) + Send + 'static,
    {
        let id = self.next_id();
        self.error_occurred.add(id, Box::new(callback));
        id
    }

    /// Returns `false` if `id` was not subscribed to anything.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.loading_changed.remove(id)
            || self.city_updated.remove(id)
            || self.forecast_updated.remove(id)
            || self.error_occurred.remove(id)
    }
}

impl fmt::Debug for ForecastCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastCoordinator")
            .field("client", &self.client)
            .field("days", &self.forecast.len())
            .field("is_loading", &self.is_loading)
            .field("pending", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

/// "new york" → "New York", "PARIS" → "Paris". Any non-alphanumeric
/// character starts a new word.
pub fn capitalize_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}

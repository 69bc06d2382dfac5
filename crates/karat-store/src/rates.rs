//! # Exchange Rate Refresh
//!
//! Pulls fresh rates from a provider and merges them into the shared
//! currency context. A failed refresh never leaves the storefront without
//! rates: the previous table (initially the fallback table) stays in place.
//!
//! ## Refresh Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  refresh() ──► fetch_rates() ──ok──► apply_rates() ──► Updated          │
//! │                    │                                                    │
//! │                    │ RateSourceUnavailable                              │
//! │                    ▼                                                    │
//! │              sleep(backoff) ──► retry (up to max_retries)               │
//! │                    │                                                    │
//! │                    │ exhausted / InvalidRates                           │
//! │                    ▼                                                    │
//! │              KeptExisting (current rates untouched)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rate File Format
//! ```json
//! { "base": "USD", "rates": { "AUD": 1.52, "GBP": 0.79 } }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use karat_core::validation::validate_exchange_rate;
use karat_core::{ExchangeRates, BASE_CURRENCY};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::RateSettings;
use crate::error::{StoreError, StoreResult};
use crate::state::CurrencyState;

// =============================================================================
// Providers
// =============================================================================

/// Source of exchange rates relative to the base currency.
pub trait RateProvider: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Fetches a full rate table.
    ///
    /// Transient failures should be reported as
    /// [`StoreError::RateSourceUnavailable`] so the refresher retries them.
    fn fetch_rates(&self) -> impl Future<Output = StoreResult<ExchangeRates>> + Send;
}

/// Always returns the same table. Used for the built-in fallback rates and
/// in tests.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    rates: ExchangeRates,
}

impl StaticRateProvider {
    pub fn new(rates: ExchangeRates) -> Self {
        StaticRateProvider { rates }
    }
}

impl RateProvider for StaticRateProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_rates(&self) -> StoreResult<ExchangeRates> {
        Ok(self.rates.clone())
    }
}

/// Reads a JSON rate document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileRateProvider {
    path: PathBuf,
}

impl FileRateProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileRateProvider { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RateProvider for FileRateProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_rates(&self) -> StoreResult<ExchangeRates> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StoreError::RateSourceUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        parse_rates_document(&contents)
    }
}

#[derive(Debug, Deserialize)]
struct RatesDocument {
    base: String,
    rates: HashMap<String, f64>,
}

/// Parses and checks a `{ "base": .., "rates": {..} }` document.
pub fn parse_rates_document(contents: &str) -> StoreResult<ExchangeRates> {
    let doc: RatesDocument = serde_json::from_str(contents)?;

    if doc.base != BASE_CURRENCY {
        return Err(StoreError::InvalidRates(format!(
            "rates must be based on {BASE_CURRENCY}, got {}",
            doc.base
        )));
    }

    if doc.rates.is_empty() {
        return Err(StoreError::InvalidRates("rate table is empty".into()));
    }

    for (code, rate) in &doc.rates {
        validate_exchange_rate(code, *rate).map_err(|e| StoreError::InvalidRates(e.to_string()))?;
    }

    Ok(ExchangeRates::from_map(doc.rates))
}

// =============================================================================
// Refresher
// =============================================================================

/// Result of a refresh that did not propagate its error.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated {
        merged: usize,
        attempts: u32,
        fetched_at: DateTime<Utc>,
    },
    KeptExisting {
        attempts: u32,
        error: String,
    },
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RefreshOutcome::Updated { attempts, .. } | RefreshOutcome::KeptExisting { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Shortest period `spawn_periodic` will tick at.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Fetches rates with retry and applies them to a [`CurrencyState`].
#[derive(Debug, Clone)]
pub struct RateRefresher {
    settings: RateSettings,
}

impl RateRefresher {
    pub fn new(settings: RateSettings) -> Self {
        RateRefresher { settings }
    }

    pub fn settings(&self) -> &RateSettings {
        &self.settings
    }

    /// Fetches and applies rates, returning how many were merged.
    ///
    /// Only retryable errors are retried. The error returned after the last
    /// attempt is always [`StoreError::RateFetchFailed`].
    pub async fn try_refresh<P: RateProvider>(
        &self,
        provider: &P,
        state: &CurrencyState,
    ) -> StoreResult<usize> {
        let (rates, attempts) = self.fetch_with_retry(provider).await?;
        let merged = state.apply_rates(&rates);
        debug!(provider = provider.name(), merged, attempts, "Rate refresh succeeded");
        Ok(merged)
    }

    /// Like [`try_refresh`](Self::try_refresh) but never fails: on error the
    /// current rates are kept and the reason is reported in the outcome.
    pub async fn refresh<P: RateProvider>(&self, provider: &P, state: &CurrencyState) -> RefreshOutcome {
        match self.fetch_with_retry(provider).await {
            Ok((rates, attempts)) => {
                let merged = state.apply_rates(&rates);
                RefreshOutcome::Updated {
                    merged,
                    attempts,
                    fetched_at: Utc::now(),
                }
            }
            Err(StoreError::RateFetchFailed { attempts, last_error }) => {
                warn!(
                    provider = provider.name(),
                    attempts,
                    error = %last_error,
                    "Rate refresh failed, keeping existing rates"
                );
                RefreshOutcome::KeptExisting {
                    attempts,
                    error: last_error,
                }
            }
            Err(e) => {
                warn!(provider = provider.name(), ?e, "Rate refresh failed, keeping existing rates");
                RefreshOutcome::KeptExisting {
                    attempts: 1,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Refreshes immediately and then every `refresh_interval_secs`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_periodic<P>(self, provider: Arc<P>, state: CurrencyState) -> JoinHandle<()>
    where
        P: RateProvider + 'static,
    {
        tokio::spawn(async move {
            info!(
                provider = provider.name(),
                interval_secs = self.settings.refresh_interval_secs,
                "Rate refresher starting"
            );

            let period = self.settings.refresh_interval().max(MIN_REFRESH_INTERVAL);
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                self.refresh(provider.as_ref(), &state).await;
            }
        })
    }

    async fn fetch_with_retry<P: RateProvider>(&self, provider: &P) -> StoreResult<(ExchangeRates, u32)> {
        let mut backoff = self.create_backoff();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let err = match provider.fetch_rates().await {
                Ok(rates) => return Ok((rates, attempts)),
                Err(e) => e,
            };

            if !err.is_retryable() || attempts > self.settings.max_retries {
                return Err(StoreError::RateFetchFailed {
                    attempts,
                    last_error: err.to_string(),
                });
            }

            let delay = backoff.next_backoff().unwrap_or_else(|| self.settings.max_backoff());
            debug!(
                provider = provider.name(),
                attempt = attempts,
                ?delay,
                error = %err,
                "Rate fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Creates the exponential backoff configuration.
    ///
    /// The first delay is capped too, so `max_backoff_secs` bounds every wait.
    fn create_backoff(&self) -> ExponentialBackoff {
        let max_interval = self.settings.max_backoff();
        let initial_interval = self.settings.initial_backoff().min(max_interval);

        ExponentialBackoff {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with a transient error `failures` times, then succeeds.
    struct FlakyProvider {
        failures: u32,
        calls: AtomicU32,
        rates: ExchangeRates,
    }

    impl FlakyProvider {
        fn new(failures: u32) -> Self {
            FlakyProvider {
                failures,
                calls: AtomicU32::new(0),
                rates: [("AUD".to_string(), 1.61)].into_iter().collect(),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RateProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch_rates(&self) -> StoreResult<ExchangeRates> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(StoreError::RateSourceUnavailable("timeout".into()))
            } else {
                Ok(self.rates.clone())
            }
        }
    }

    struct BrokenProvider;

    impl RateProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch_rates(&self) -> StoreResult<ExchangeRates> {
            Err(StoreError::InvalidRates("garbage".into()))
        }
    }

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("karat-rates-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_retries_transient_failures() {
        let provider = FlakyProvider::new(2);
        let state = CurrencyState::default();
        let refresher = RateRefresher::new(RateSettings::default());

        let outcome = refresher.refresh(&provider, &state).await;

        assert!(outcome.is_updated());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(provider.calls(), 3);

        state.select("AUD").unwrap();
        assert_eq!(state.display(Some(100.0)), "A$161.00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_keeps_existing_rates_when_exhausted() {
        let provider = FlakyProvider::new(u32::MAX);
        let state = CurrencyState::default();
        let refresher = RateRefresher::new(RateSettings::default());

        let outcome = refresher.refresh(&provider, &state).await;

        assert_eq!(
            outcome,
            RefreshOutcome::KeptExisting {
                attempts: 4,
                error: "Exchange rate source unavailable: timeout".to_string(),
            }
        );
        assert_eq!(state.snapshot().rates().get("AUD"), Some(1.52));
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_refresh_does_not_retry_invalid_rates() {
        let state = CurrencyState::default();
        let refresher = RateRefresher::new(RateSettings::default());

        let err = refresher.try_refresh(&BrokenProvider, &state).await.unwrap_err();
        assert!(matches!(err, StoreError::RateFetchFailed { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let provider = FlakyProvider::new(2);
        let state = CurrencyState::default();
        let refresher = RateRefresher::new(RateSettings::default());

        let started = tokio::time::Instant::now();
        refresher.try_refresh(&provider, &state).await.unwrap();

        // 500ms then 1s
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_never_exceeds_max() {
        let provider = FlakyProvider::new(2);
        let state = CurrencyState::default();
        let settings = RateSettings {
            max_backoff_secs: 0,
            ..RateSettings::default()
        };

        let started = tokio::time::Instant::now();
        RateRefresher::new(settings).try_refresh(&provider, &state).await.unwrap();

        assert_eq!(provider.calls(), 3);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_periodic_with_zero_interval() {
        let state = CurrencyState::default();
        let rates: ExchangeRates = [("INR".to_string(), 84.5)].into_iter().collect();
        let provider = Arc::new(StaticRateProvider::new(rates));
        let settings = RateSettings {
            refresh_interval_secs: 0,
            ..RateSettings::default()
        };

        let handle = RateRefresher::new(settings).spawn_periodic(provider, state.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;

        // A zero period would have panicked inside the task.
        assert!(!handle.is_finished());
        handle.abort();
        assert_eq!(state.snapshot().rates().get("INR"), Some(84.5));
    }

    #[tokio::test]
    async fn test_file_provider() {
        let path = temp_file(r#"{ "base": "USD", "rates": { "GBP": 0.81, "INR": 84.0 } }"#);
        let rates = FileRateProvider::new(&path).fetch_rates().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rates.get("GBP"), Some(0.81));
        assert_eq!(rates.get("USD"), Some(1.0));
    }

    #[tokio::test]
    async fn test_file_provider_missing_file_is_retryable() {
        let provider = FileRateProvider::new("/nonexistent/karat/rates.json");
        let err = provider.fetch_rates().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_rates_document_rejects_bad_input() {
        assert!(matches!(
            parse_rates_document(r#"{ "base": "EUR", "rates": { "GBP": 0.85 } }"#),
            Err(StoreError::InvalidRates(_))
        ));
        assert!(matches!(
            parse_rates_document(r#"{ "base": "USD", "rates": {} }"#),
            Err(StoreError::InvalidRates(_))
        ));
        assert!(matches!(
            parse_rates_document(r#"{ "base": "USD", "rates": { "GBP": -1.0 } }"#),
            Err(StoreError::InvalidRates(_))
        ));
        assert!(matches!(parse_rates_document("not json"), Err(StoreError::InvalidRates(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_periodic_applies_rates() {
        let state = CurrencyState::default();
        let rates: ExchangeRates = [("CAD".to_string(), 1.40)].into_iter().collect();
        let provider = Arc::new(StaticRateProvider::new(rates));

        let handle = RateRefresher::new(RateSettings::default()).spawn_periodic(provider, state.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();

        assert_eq!(state.snapshot().rates().get("CAD"), Some(1.40));
    }
}

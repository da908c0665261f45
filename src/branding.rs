//! Time-bounded cache of the organization's branding.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::api::ReportApi;
use crate::config::CompanyInfo;

/// Source of the current time, swappable in tests
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A fetched company record and when it was fetched
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CachedCompany {
    pub company: CompanyInfo,
    pub fetched_at: DateTime<Utc>,
}

pub struct BrandingCache<C: Clock = SystemClock> {
    ttl: Duration,
    clock: C,
    entry: Mutex<Option<CachedCompany>>,
}

impl BrandingCache<SystemClock> {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> BrandingCache<C> {
    pub fn with_clock(ttl: std::time::Duration, clock: C) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(36_500)),
            clock,
            entry: Mutex::new(None),
        }
    }

    /// Cached company info if fresh, otherwise fetched; the fallback record on failure
    pub fn get_company_info<A: ReportApi + ?Sized>(&self, api: &A) -> CompanyInfo {
        let now = self.clock.now();
        if let Some(cached) = self.fresh_entry(now) {
            debug!("Using cached company info");
            return cached;
        }

        // Lock is not held across the request; concurrent misses may both fetch
        match api.company_info() {
            Ok(company) => {
                self.store(CachedCompany {
                    company: company.clone(),
                    fetched_at: now,
                });
                company
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch company info, using defaults");
                CompanyInfo::fallback()
            }
        }
    }

    /// Drop the cached entry so the next call re-fetches
    pub fn clear_cache(&self) {
        *self.lock() = None;
    }

    pub fn snapshot(&self) -> Option<CachedCompany> {
        self.lock().clone()
    }

    pub fn restore(&self, entry: Option<CachedCompany>) {
        *self.lock() = entry;
    }

    fn fresh_entry(&self, now: DateTime<Utc>) -> Option<CompanyInfo> {
        let guard = self.lock();
        let cached = guard.as_ref()?;
        let age = now.signed_duration_since(cached.fetched_at);
        (age >= Duration::zero() && age < self.ttl).then(|| cached.company.clone())
    }

    fn store(&self, entry: CachedCompany) {
        *self.lock() = Some(entry);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CachedCompany>> {
        // A poisoned lock still holds a whole entry; writes replace it atomically
        self.entry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReportError, Result};
    use crate::report::{CustomReportRequest, Filters, ReportPayload, ReportSummary, ReportType};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn advance(&self, seconds: i64) {
            self.0.set(self.0.get() + Duration::seconds(seconds));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    struct CountingApi {
        calls: Cell<usize>,
        fail: bool,
    }

    impl ReportApi for CountingApi {
        fn fetch_report(&self, _: ReportType, _: &Filters) -> Result<ReportPayload> {
            unreachable!()
        }
        fn create_custom_report(&self, _: &CustomReportRequest) -> Result<ReportPayload> {
            unreachable!()
        }
        fn list_reports(&self) -> Result<Vec<ReportSummary>> {
            unreachable!()
        }
        fn company_info(&self) -> Result<CompanyInfo> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ReportError::Api("offline".to_string()));
            }
            Ok(CompanyInfo {
                name: "Acme Rentals".to_string(),
                email: "hello@acme.test".to_string(),
                phone: "0711".to_string(),
                address: "Nairobi".to_string(),
                logo: None,
            })
        }
        fn fetch_bytes(&self, _: &str) -> Result<Vec<u8>> {
            unreachable!()
        }
    }

    fn setup(fail: bool) -> (BrandingCache<ManualClock>, ManualClock, CountingApi) {
        let clock = ManualClock(Rc::new(Cell::new(Utc::now())));
        let cache = BrandingCache::with_clock(std::time::Duration::from_secs(300), clock.clone());
        let api = CountingApi {
            calls: Cell::new(0),
            fail,
        };
        (cache, clock, api)
    }

    #[test]
    fn test_calls_within_ttl_fetch_once() {
        let (cache, clock, api) = setup(false);

        assert_eq!(cache.get_company_info(&api).name, "Acme Rentals");
        clock.advance(299);
        assert_eq!(cache.get_company_info(&api).name, "Acme Rentals");
        assert_eq!(api.calls.get(), 1);
    }

    #[test]
    fn test_expired_entry_is_refetched() {
        let (cache, clock, api) = setup(false);

        cache.get_company_info(&api);
        clock.advance(301);
        cache.get_company_info(&api);
        assert_eq!(api.calls.get(), 2);
    }

    #[test]
    fn test_failure_returns_fallback_and_is_not_cached() {
        let (cache, _clock, api) = setup(true);

        assert_eq!(cache.get_company_info(&api), CompanyInfo::fallback());
        assert!(cache.snapshot().is_none());
        cache.get_company_info(&api);
        assert_eq!(api.calls.get(), 2);
    }

    #[test]
    fn test_clear_cache_forces_refetch() {
        let (cache, _clock, api) = setup(false);

        cache.get_company_info(&api);
        cache.clear_cache();
        cache.get_company_info(&api);
        assert_eq!(api.calls.get(), 2);
    }

    #[test]
    fn test_restored_entry_is_served() {
        let (cache, clock, api) = setup(false);
        cache.restore(Some(CachedCompany {
            company: CompanyInfo::fallback(),
            fetched_at: clock.now(),
        }));

        assert_eq!(cache.get_company_info(&api), CompanyInfo::fallback());
        assert_eq!(api.calls.get(), 0);
    }
}

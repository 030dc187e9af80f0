//! Sync Scheduler
//!
//! Owns one recurring timer per active shop and a single global cleanup
//! timer. Each tick checks liveness, then runs the sync operation unless a
//! previous cycle for the same shop is still executing.
//!
//! Timer tasks hold a `Weak` reference to the scheduler, so dropping the
//! last handle stops them.

use chrono::{DateTime, Utc};
use kernel::shop::ShopDomain;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::cleanup::run_cleanup;
use crate::application::config::SchedulerConfig;
use crate::domain::entities::{SchedulerStats, ShopSession, SyncInfo};
use crate::domain::repository::{ActivityRepository, CleanupRepository, ShopSyncer};

struct SyncTimer {
    id: u64,
    handle: JoinHandle<()>,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl SyncTimer {
    fn info(&self, shop: &ShopDomain, is_running: bool) -> SyncInfo {
        SyncInfo {
            shop: shop.clone(),
            started_at: self.started_at,
            is_running,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

/// Marks the shop as mid-cycle until dropped, however the cycle ends
struct RunningGuard<'a> {
    running: &'a Mutex<HashSet<ShopDomain>>,
    shop: ShopDomain,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.shop);
    }
}

struct SchedulerInner<A, S, C> {
    activity: Arc<A>,
    syncer: Arc<S>,
    cleanup: Arc<C>,
    config: SchedulerConfig,
    timers: Mutex<HashMap<ShopDomain, SyncTimer>>,
    // Outlives timers: a cycle keeps its shop here after stop or replace
    running: Mutex<HashSet<ShopDomain>>,
    cleanup_timer: Mutex<Option<JoinHandle<()>>>,
    next_timer_id: AtomicU64,
}

impl<A, S, C> SchedulerInner<A, S, C> {
    fn lock_timers(&self) -> MutexGuard<'_, HashMap<ShopDomain, SyncTimer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_running(&self) -> MutexGuard<'_, HashSet<ShopDomain>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cleanup(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.cleanup_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the shop for one cycle; `None` if a cycle is already running
    fn try_begin_cycle(&self, shop: &ShopDomain) -> Option<RunningGuard<'_>> {
        self.lock_running().insert(shop.clone()).then(|| RunningGuard {
            running: &self.running,
            shop: shop.clone(),
        })
    }

    /// Remove the shop's timer; with `only_id`, only if it is still that timer
    fn remove_timer(&self, shop: &ShopDomain, only_id: Option<u64>) -> bool {
        let mut timers = self.lock_timers();
        match timers.get(shop) {
            Some(timer) if only_id.is_none_or(|id| id == timer.id) => {}
            _ => return false,
        }
        match timers.remove(shop) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }
}

impl<A, S, C> SchedulerInner<A, S, C>
where
    S: ShopSyncer,
{
    /// Let the syncer drop what it holds for shops without a timer
    fn release_unscheduled(&self) {
        let scheduled: Vec<ShopDomain> = self.lock_timers().keys().cloned().collect();
        let released = self.syncer.release_unscheduled(&scheduled);
        if released > 0 {
            tracing::debug!(released, "Released resources of unscheduled shops");
        }
    }
}

impl<A, S, C> Drop for SchedulerInner<A, S, C> {
    fn drop(&mut self) {
        let timers = self.timers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, timer) in timers.drain() {
            timer.handle.abort();
        }
        let cleanup = self
            .cleanup_timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = cleanup.take() {
            handle.abort();
        }
    }
}

pub struct SyncScheduler<A, S, C> {
    inner: Arc<SchedulerInner<A, S, C>>,
}

impl<A, S, C> Clone for SyncScheduler<A, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, S, C> SyncScheduler<A, S, C>
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
{
    pub fn new(activity: Arc<A>, syncer: Arc<S>, cleanup: Arc<C>, config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                activity,
                syncer,
                cleanup,
                config,
                timers: Mutex::new(HashMap::new()),
                running: Mutex::new(HashSet::new()),
                cleanup_timer: Mutex::new(None),
                next_timer_id: AtomicU64::new(1),
            }),
        }
    }

    /// (Re)register the shop's recurring sync and run one cycle now
    ///
    /// An existing timer for the shop is stopped and replaced. A cycle still
    /// running for the shop, from a replaced or stopped timer, makes the new
    /// timer's cycles skip until it finishes. Must be called from within a
    /// Tokio runtime.
    pub fn start_sync_for_shop(&self, session: ShopSession) -> SyncInfo {
        let shop = session.shop.clone();
        let id = self.inner.next_timer_id.fetch_add(1, Ordering::Relaxed);

        let info = {
            let mut timers = self.inner.lock_timers();

            if let Some(previous) = timers.remove(&shop) {
                previous.handle.abort();
                tracing::info!(shop = %shop, "Replacing existing sync timer");
            }

            let handle = tokio::spawn(tick_loop(Arc::downgrade(&self.inner), session.clone(), id));

            let timer = SyncTimer {
                id,
                handle,
                started_at: Utc::now(),
                started: Instant::now(),
            };
            let info = timer.info(&shop, self.inner.lock_running().contains(&shop));
            timers.insert(shop.clone(), timer);

            tokio::spawn(run_cycle(self.inner.clone(), session, id));
            info
        };

        tracing::info!(
            shop = %shop,
            interval_secs = self.inner.config.sync_interval.as_secs(),
            "Sync scheduled"
        );

        self.ensure_cleanup_timer();
        info
    }

    /// Cancel the shop's future ticks; a running cycle finishes normally
    pub fn stop_sync_for_shop(&self, shop: &ShopDomain) -> bool {
        let removed = self.inner.remove_timer(shop, None);
        if removed {
            tracing::info!(shop = %shop, "Sync stopped");
            self.inner.release_unscheduled();
        }
        removed
    }

    /// Whether a timer is registered for the shop
    pub fn is_shop_active(&self, shop: &ShopDomain) -> bool {
        self.inner.lock_timers().contains_key(shop)
    }

    pub fn active_shops_count(&self) -> usize {
        self.inner.lock_timers().len()
    }

    pub fn active_shops(&self) -> Vec<ShopDomain> {
        let mut shops: Vec<ShopDomain> = self.inner.lock_timers().keys().cloned().collect();
        shops.sort();
        shops
    }

    pub fn sync_info(&self, shop: &ShopDomain) -> Option<SyncInfo> {
        let timers = self.inner.lock_timers();
        let timer = timers.get(shop)?;
        Some(timer.info(shop, self.inner.lock_running().contains(shop)))
    }

    pub fn stats(&self) -> SchedulerStats {
        let mut shops: Vec<SyncInfo> = {
            let timers = self.inner.lock_timers();
            let running = self.inner.lock_running();
            timers
                .iter()
                .map(|(shop, timer)| timer.info(shop, running.contains(shop)))
                .collect()
        };
        shops.sort_by(|a, b| a.shop.cmp(&b.shop));

        SchedulerStats {
            active_shops: shops.len(),
            running_syncs: shops.iter().filter(|info| info.is_running).count(),
            cleanup_scheduled: self.inner.lock_cleanup().is_some(),
            sync_interval_secs: self.inner.config.sync_interval.as_secs(),
            inactivity_threshold_secs: self.inner.config.inactivity_threshold.as_secs(),
            shops,
        }
    }

    /// Cancel every shop timer and the cleanup timer
    pub fn stop_all(&self) {
        let stopped: Vec<SyncTimer> = self
            .inner
            .lock_timers()
            .drain()
            .map(|(_, timer)| timer)
            .collect();
        for timer in &stopped {
            timer.handle.abort();
        }

        let cleanup = self.inner.lock_cleanup().take();
        let cleanup_stopped = cleanup.is_some();
        if let Some(handle) = cleanup {
            handle.abort();
        }

        tracing::info!(
            shops = stopped.len(),
            cleanup = cleanup_stopped,
            "All sync timers stopped"
        );
        self.inner.release_unscheduled();
    }

    fn ensure_cleanup_timer(&self) {
        let mut cleanup = self.inner.lock_cleanup();
        if cleanup.is_some() {
            return;
        }

        tracing::info!(
            interval_secs = self.inner.config.cleanup_interval.as_secs(),
            "Starting cleanup timer"
        );
        *cleanup = Some(tokio::spawn(cleanup_loop(Arc::downgrade(&self.inner))));
    }
}

async fn tick_loop<A, S, C>(
    inner: Weak<SchedulerInner<A, S, C>>,
    session: ShopSession,
    id: u64,
) where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
{
    let Some(period) = inner.upgrade().map(|inner| inner.config.sync_period()) else {
        return;
    };

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        tokio::spawn(run_cycle(inner, session.clone(), id));
    }
}

async fn run_cycle<A, S, C>(inner: Arc<SchedulerInner<A, S, C>>, session: ShopSession, id: u64)
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
{
    let shop = &session.shop;

    {
        let Some(_guard) = inner.try_begin_cycle(shop) else {
            tracing::debug!(shop = %shop, "Previous sync still running, skipping tick");
            return;
        };
        sync_once(&inner, &session, id).await;
    }

    // stopped or torn down while this cycle ran
    if !inner.lock_timers().contains_key(shop) {
        inner.release_unscheduled();
    }
}

async fn sync_once<A, S, C>(inner: &SchedulerInner<A, S, C>, session: &ShopSession, id: u64)
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
{
    let shop = &session.shop;

    match inner
        .activity
        .is_shop_active(shop, inner.config.inactivity_threshold)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            if inner.remove_timer(shop, Some(id)) {
                tracing::info!(shop = %shop, "Shop inactive, sync stopped");
            }
            return;
        }
        Err(e) => {
            tracing::warn!(shop = %shop, error = %e, "Liveness check failed, skipping cycle");
            return;
        }
    }

    match inner.syncer.sync_shop(session).await {
        Ok(stats) => {
            tracing::info!(
                shop = %shop,
                resources = stats.total(),
                duration_ms = stats.duration_ms,
                "Sync cycle completed"
            );
        }
        Err(e) => {
            tracing::error!(shop = %shop, error = %e, "Sync cycle failed");
        }
    }
}

async fn cleanup_loop<A, S, C>(inner: Weak<SchedulerInner<A, S, C>>)
where
    A: ActivityRepository + Send + Sync + 'static,
    S: ShopSyncer + Send + Sync + 'static,
    C: CleanupRepository + Send + Sync + 'static,
{
    let Some(period) = inner.upgrade().map(|inner| inner.config.cleanup_period()) else {
        return;
    };

    // First tick completes immediately
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        run_cleanup(inner.cleanup.as_ref(), &inner.config, Utc::now()).await;
        inner.release_unscheduled();
    }
}

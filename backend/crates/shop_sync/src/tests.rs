//! Unit tests for the shop_sync crate
//!
//! Scheduler tests run on Tokio's paused clock; timers fire as virtual time
//! is advanced by `sleep`.

#[cfg(test)]
mod mocks {
    use crate::domain::entities::{CleanupCriteria, ShopSession, SyncStats};
    use crate::domain::repository::{ActivityRepository, CleanupRepository, ShopSyncer};
    use crate::error::{SyncError, SyncResult};
    use kernel::shop::ShopDomain;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    pub fn shop(name: &str) -> ShopDomain {
        ShopDomain::parse(&format!("{name}.myshopify.com")).unwrap()
    }

    pub fn session(name: &str) -> ShopSession {
        ShopSession::new(shop(name), format!("token-{name}"))
    }

    /// Let spawned tasks run without advancing the clock
    pub async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[derive(Default)]
    pub struct MockActivity {
        pub inactive: AtomicBool,
        pub failing: AtomicBool,
        pub checks: AtomicUsize,
        pub recorded: Mutex<Vec<ShopDomain>>,
    }

    impl ActivityRepository for MockActivity {
        async fn record_activity(&self, shop: &ShopDomain) -> SyncResult<()> {
            self.recorded.lock().unwrap().push(shop.clone());
            Ok(())
        }

        async fn is_shop_active(&self, _shop: &ShopDomain, _within: Duration) -> SyncResult<bool> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(SyncError::Internal("activity store down".into()));
            }
            Ok(!self.inactive.load(Ordering::SeqCst))
        }
    }

    #[derive(Default)]
    pub struct MockSyncer {
        pub duration: Duration,
        pub failing: bool,
        pub calls: AtomicUsize,
        pub completed: AtomicUsize,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
        pub releases: Mutex<Vec<Vec<ShopDomain>>>,
    }

    impl MockSyncer {
        pub fn slow(duration: Duration) -> Self {
            Self {
                duration,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn releases(&self) -> Vec<Vec<ShopDomain>> {
            self.releases.lock().unwrap().clone()
        }
    }

    impl ShopSyncer for MockSyncer {
        async fn sync_shop(&self, _session: &ShopSession) -> SyncResult<SyncStats> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.duration.is_zero() {
                tokio::time::sleep(self.duration).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);

            if self.failing {
                Err(SyncError::UnexpectedResponse("boom".into()))
            } else {
                Ok(SyncStats::default())
            }
        }

        fn release_unscheduled(&self, scheduled: &[ShopDomain]) -> usize {
            let mut scheduled = scheduled.to_vec();
            scheduled.sort();
            self.releases.lock().unwrap().push(scheduled);
            0
        }
    }

    #[derive(Default)]
    pub struct MockCleanup {
        pub failing_tasks: bool,
        pub failing_all: bool,
        pub calls: Mutex<Vec<CleanupCriteria>>,
    }

    impl MockCleanup {
        pub fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl CleanupRepository for MockCleanup {
        async fn delete_matching(&self, criteria: &CleanupCriteria) -> SyncResult<u64> {
            self.calls.lock().unwrap().push(*criteria);
            let fail = self.failing_all
                || (self.failing_tasks
                    && matches!(criteria, CleanupCriteria::BackgroundTasks { .. }));
            if fail {
                return Err(SyncError::Internal("delete failed".into()));
            }
            Ok(7)
        }
    }
}

#[cfg(test)]
mod scheduler_tests {
    use super::mocks::*;
    use crate::application::config::SchedulerConfig;
    use crate::application::scheduler::SyncScheduler;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time;

    type TestScheduler = SyncScheduler<MockActivity, MockSyncer, MockCleanup>;

    struct Harness {
        scheduler: TestScheduler,
        activity: Arc<MockActivity>,
        syncer: Arc<MockSyncer>,
        cleanup: Arc<MockCleanup>,
    }

    fn harness_with(syncer: MockSyncer, cleanup: MockCleanup, config: SchedulerConfig) -> Harness {
        let activity = Arc::new(MockActivity::default());
        let syncer = Arc::new(syncer);
        let cleanup = Arc::new(cleanup);
        let scheduler =
            SyncScheduler::new(activity.clone(), syncer.clone(), cleanup.clone(), config);
        Harness {
            scheduler,
            activity,
            syncer,
            cleanup,
        }
    }

    fn harness(syncer: MockSyncer) -> Harness {
        harness_with(syncer, MockCleanup::default(), SchedulerConfig::default())
    }

    const TICK: Duration = Duration::from_secs(40);

    fn just_after(d: Duration) -> Duration {
        d + Duration::from_millis(1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_immediately_then_on_each_tick() {
        let h = harness(MockSyncer::default());

        let info = h.scheduler.start_sync_for_shop(session("a"));
        assert_eq!(info.shop, shop("a"));
        settle().await;

        assert_eq!(h.syncer.calls(), 1);
        assert!(h.scheduler.is_shop_active(&shop("a")));

        time::sleep(just_after(TICK)).await;
        settle().await;
        assert_eq!(h.syncer.calls(), 2);

        time::sleep(TICK).await;
        settle().await;
        assert_eq!(h.syncer.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_timer() {
        let h = harness(MockSyncer::default());

        h.scheduler.start_sync_for_shop(session("shop-a"));
        h.scheduler.start_sync_for_shop(session("shop-a"));
        settle().await;

        assert_eq!(h.scheduler.active_shops_count(), 1);
        let before = h.syncer.calls();

        // a live first timer would fire alongside the second one
        time::sleep(just_after(TICK)).await;
        settle().await;
        assert_eq!(h.syncer.calls(), before + 1);

        assert!(h.scheduler.stop_sync_for_shop(&shop("shop-a")));
        assert!(!h.scheduler.is_shop_active(&shop("shop-a")));

        let after_stop = h.syncer.calls();
        time::sleep(TICK * 5).await;
        settle().await;
        assert_eq!(h.syncer.calls(), after_stop);
        assert_eq!(h.scheduler.active_shops_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_while_running_does_not_overlap() {
        let h = harness(MockSyncer::slow(Duration::from_secs(100)));

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;
        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;

        assert_eq!(h.syncer.calls(), 1);
        assert!(h.scheduler.sync_info(&shop("a")).unwrap().is_running);
        assert_eq!(h.syncer.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_then_start_while_running_does_not_overlap() {
        let h = harness(MockSyncer::slow(Duration::from_secs(100)));

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;
        assert!(h.scheduler.stop_sync_for_shop(&shop("a")));
        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;

        assert_eq!(h.syncer.calls(), 1);
        assert!(h.scheduler.sync_info(&shop("a")).unwrap().is_running);

        // the stopped timer's cycle ends at 100 s; the 120 s tick runs again
        time::sleep(Duration::from_secs(121)).await;
        settle().await;
        assert_eq!(h.syncer.calls(), 2);
        assert_eq!(h.syncer.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_descheduled_shops_are_released() {
        let h = harness(MockSyncer::default());

        h.scheduler.start_sync_for_shop(session("a"));
        h.scheduler.start_sync_for_shop(session("b"));
        settle().await;

        h.scheduler.stop_sync_for_shop(&shop("a"));
        assert_eq!(h.syncer.releases().last(), Some(&vec![shop("b")]));

        h.activity.inactive.store(true, Ordering::SeqCst);
        time::sleep(just_after(TICK)).await;
        settle().await;
        assert!(!h.scheduler.is_shop_active(&shop("b")));
        assert_eq!(h.syncer.releases().last(), Some(&vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_sync_skips_overlapping_ticks() {
        let h = harness(MockSyncer::slow(Duration::from_secs(100)));

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;

        // ticks at 40 s and 80 s land while the first cycle is running
        time::sleep(Duration::from_secs(95)).await;
        settle().await;
        assert_eq!(h.syncer.calls(), 1);
        assert_eq!(h.scheduler.stats().running_syncs, 1);

        // first cycle ends at 100 s; the 120 s tick starts the next one
        time::sleep(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(h.syncer.calls(), 2);
        assert_eq!(h.syncer.completed.load(Ordering::SeqCst), 1);
        assert_eq!(h.syncer.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_shop_is_descheduled_on_next_tick() {
        let h = harness(MockSyncer::default());

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;
        assert_eq!(h.syncer.calls(), 1);

        h.activity.inactive.store(true, Ordering::SeqCst);
        time::sleep(just_after(TICK)).await;
        settle().await;

        assert!(!h.scheduler.is_shop_active(&shop("a")));
        assert_eq!(h.syncer.calls(), 1);

        let checks = h.activity.checks.load(Ordering::SeqCst);
        time::sleep(TICK * 3).await;
        settle().await;
        assert_eq!(h.activity.checks.load(Ordering::SeqCst), checks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_failure_keeps_timer() {
        let h = harness(MockSyncer::failing());

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;
        time::sleep(just_after(TICK)).await;
        settle().await;

        assert_eq!(h.syncer.calls(), 2);
        assert!(h.scheduler.is_shop_active(&shop("a")));
        assert!(!h.scheduler.sync_info(&shop("a")).unwrap().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_liveness_error_skips_cycle_but_keeps_timer() {
        let h = harness(MockSyncer::default());
        h.activity.failing.store(true, Ordering::SeqCst);

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;

        assert_eq!(h.syncer.calls(), 0);
        assert!(h.scheduler.is_shop_active(&shop("a")));

        h.activity.failing.store(false, Ordering::SeqCst);
        time::sleep(just_after(TICK)).await;
        settle().await;
        assert_eq!(h.syncer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_does_not_interrupt_running_cycle() {
        let h = harness(MockSyncer::slow(Duration::from_secs(10)));

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;
        assert!(h.scheduler.stop_sync_for_shop(&shop("a")));
        assert!(!h.scheduler.stop_sync_for_shop(&shop("a")));

        time::sleep(Duration::from_secs(11)).await;
        settle().await;
        assert_eq!(h.syncer.completed.load(Ordering::SeqCst), 1);
        assert_eq!(h.syncer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_runs_once_immediately_then_hourly() {
        let config = SchedulerConfig::default().with_sync_interval(Duration::from_secs(600));
        let h = harness_with(MockSyncer::default(), MockCleanup::default(), config);

        assert!(!h.scheduler.stats().cleanup_scheduled);
        h.scheduler.start_sync_for_shop(session("a"));
        h.scheduler.start_sync_for_shop(session("b"));
        settle().await;

        // tasks + request logs, one run
        assert_eq!(h.cleanup.calls(), 2);
        assert!(h.scheduler.stats().cleanup_scheduled);

        time::sleep(just_after(Duration::from_secs(3600))).await;
        settle().await;
        assert_eq!(h.cleanup.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_failure_keeps_timer() {
        let cleanup = MockCleanup {
            failing_all: true,
            ..MockCleanup::default()
        };
        let config = SchedulerConfig::default().with_sync_interval(Duration::from_secs(600));
        let h = harness_with(MockSyncer::default(), cleanup, config);

        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;
        time::sleep(just_after(Duration::from_secs(3600))).await;
        settle().await;

        assert_eq!(h.cleanup.calls(), 4);
        assert!(h.scheduler.stats().cleanup_scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all() {
        let h = harness(MockSyncer::default());

        // safe with nothing scheduled
        h.scheduler.stop_all();
        assert_eq!(h.scheduler.active_shops_count(), 0);

        h.scheduler.start_sync_for_shop(session("a"));
        h.scheduler.start_sync_for_shop(session("b"));
        settle().await;
        let syncs = h.syncer.calls();
        let cleanups = h.cleanup.calls();

        h.scheduler.stop_all();
        let stats = h.scheduler.stats();
        assert_eq!(stats.active_shops, 0);
        assert!(!stats.cleanup_scheduled);

        time::sleep(Duration::from_secs(7200)).await;
        settle().await;
        assert_eq!(h.syncer.calls(), syncs);
        assert_eq!(h.cleanup.calls(), cleanups);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_and_active_shops() {
        let h = harness(MockSyncer::default());

        h.scheduler.start_sync_for_shop(session("b"));
        h.scheduler.start_sync_for_shop(session("a"));
        settle().await;
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(h.scheduler.active_shops(), vec![shop("a"), shop("b")]);

        let stats = h.scheduler.stats();
        assert_eq!(stats.active_shops, 2);
        assert_eq!(stats.running_syncs, 0);
        assert_eq!(stats.sync_interval_secs, 40);
        assert_eq!(stats.inactivity_threshold_secs, 300);
        assert_eq!(stats.shops[0].shop, shop("a"));
        assert_eq!(stats.shops[0].uptime_secs, 5);

        assert!(h.scheduler.sync_info(&shop("c")).is_none());
    }
}

#[cfg(test)]
mod cleanup_tests {
    use super::mocks::*;
    use crate::application::cleanup::run_cleanup;
    use crate::application::config::SchedulerConfig;
    use crate::domain::entities::CleanupCriteria;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[tokio::test]
    async fn test_cutoffs_follow_retention() {
        let repo = MockCleanup::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();

        let report = run_cleanup(&repo, &SchedulerConfig::default(), now).await;

        assert!(report.is_complete());
        assert_eq!(report.tasks_deleted, Some(7));
        let calls = repo.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                CleanupCriteria::BackgroundTasks {
                    terminal_before: now - TimeDelta::days(3),
                    now,
                },
                CleanupCriteria::RequestLogs {
                    processed_before: now - TimeDelta::hours(24),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let repo = MockCleanup {
            failing_tasks: true,
            ..MockCleanup::default()
        };

        let report = run_cleanup(&repo, &SchedulerConfig::default(), Utc::now()).await;

        assert_eq!(report.tasks_deleted, None);
        assert_eq!(report.request_logs_deleted, Some(7));
        assert!(!report.is_complete());
        assert_eq!(repo.calls(), 2);
    }
}

#[cfg(test)]
mod content_sync_tests {
    use super::mocks::*;
    use crate::application::content_sync::ContentSyncService;
    use crate::domain::entities::{ResourceKind, ShopResource};
    use crate::domain::repository::{ResourceRepository, ShopSyncer};
    use crate::error::{SyncError, SyncResult};
    use gateway::{
        AccessToken, GatewayConfig, GatewayError, GatewayRegistry, GraphqlOperation,
        GraphqlTransport, RawResponse, TransportError, TransportFactory,
    };
    use kernel::shop::ShopDomain;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Mode {
        Paged,
        BlogsDenied,
        Throttled,
    }

    struct CatalogTransport {
        mode: Mode,
        requests: Arc<Mutex<Vec<GraphqlOperation>>>,
    }

    fn root_of(query: &str) -> &'static str {
        ["products", "collections", "pages", "blogs"]
            .into_iter()
            .find(|field| query.contains(&format!("{field}(first")))
            .unwrap()
    }

    fn page(root: &str, ids: &[&str], next: Option<&str>) -> RawResponse {
        let nodes: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "title": format!("Title {id}"),
                    "handle": id.to_lowercase(),
                    "updatedAt": "2026-01-02T03:04:05Z"
                })
            })
            .collect();
        let body = json!({
            "data": {
                root: {
                    "nodes": nodes,
                    "pageInfo": { "hasNextPage": next.is_some(), "endCursor": next }
                }
            }
        });
        RawResponse::new(200, body.to_string())
    }

    impl GraphqlTransport for CatalogTransport {
        async fn execute(
            &self,
            operation: &GraphqlOperation,
        ) -> Result<RawResponse, TransportError> {
            self.requests.lock().unwrap().push(operation.clone());

            if matches!(self.mode, Mode::Throttled) {
                return Err(TransportError::Status {
                    status: 429,
                    body: "Too Many Requests".into(),
                });
            }

            let after = operation
                .variables
                .as_ref()
                .and_then(|v| v["after"].as_str().map(str::to_string));

            Ok(match (root_of(&operation.query), after.as_deref()) {
                ("products", None) => page("products", &["P1", "P2"], Some("c1")),
                ("products", Some("c1")) => page("products", &["P3"], None),
                ("collections", _) => page("collections", &["C1"], None),
                ("pages", _) => page("pages", &[], None),
                ("blogs", _) if matches!(self.mode, Mode::BlogsDenied) => RawResponse::new(
                    200,
                    r#"{"errors":[{"message":"Access denied for blogs field."}]}"#,
                ),
                ("blogs", _) => page("blogs", &["B1"], None),
                (root, cursor) => panic!("unexpected request {root} {cursor:?}"),
            })
        }
    }

    struct CatalogFactory {
        mode: Mode,
        requests: Arc<Mutex<Vec<GraphqlOperation>>>,
    }

    impl TransportFactory for CatalogFactory {
        type Transport = CatalogTransport;

        fn build(&self, _shop: &ShopDomain, _access_token: AccessToken) -> CatalogTransport {
            CatalogTransport {
                mode: self.mode,
                requests: self.requests.clone(),
            }
        }
    }

    #[derive(Default)]
    struct MemoryResources {
        batches: Mutex<Vec<Vec<ShopResource>>>,
    }

    impl ResourceRepository for MemoryResources {
        async fn upsert_resources(
            &self,
            _shop: &ShopDomain,
            resources: &[ShopResource],
        ) -> SyncResult<u64> {
            self.batches.lock().unwrap().push(resources.to_vec());
            Ok(resources.len() as u64)
        }
    }

    struct Fixture {
        service: ContentSyncService<CatalogFactory, MemoryResources>,
        registry: Arc<GatewayRegistry<CatalogFactory>>,
        requests: Arc<Mutex<Vec<GraphqlOperation>>>,
        resources: Arc<MemoryResources>,
    }

    fn fixture(mode: Mode, config: GatewayConfig) -> Fixture {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(GatewayRegistry::new(
            CatalogFactory {
                mode,
                requests: requests.clone(),
            },
            config,
        ));
        let resources = Arc::new(MemoryResources::default());
        Fixture {
            service: ContentSyncService::new(registry.clone(), resources.clone()),
            registry,
            requests,
            resources,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_pages_through_every_kind() {
        let f = fixture(Mode::Paged, GatewayConfig::default());

        let stats = tokio_test::assert_ok!(f.service.sync_shop(&session("a")).await);

        assert_eq!(stats.products, 3);
        assert_eq!(stats.collections, 1);
        assert_eq!(stats.pages, 0);
        assert_eq!(stats.blogs, 1);
        assert_eq!(stats.total(), 5);

        let requests = f.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 5);
        let first_vars = requests[0].variables.as_ref().unwrap();
        assert_eq!(first_vars["first"], 50);
        assert!(first_vars["after"].is_null());
        assert_eq!(requests[1].variables.as_ref().unwrap()["after"], "c1");

        // empty kinds are not written
        let batches = f.resources.batches.lock().unwrap().clone();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0][2].gid, "P3");
        assert_eq!(batches[0][0].kind, ResourceKind::Product);
        assert_eq!(batches[0][0].handle.as_deref(), Some("p1"));
        assert!(batches[0][0].updated_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_evicts_gateway_once_quiet() {
        let f = fixture(Mode::Paged, GatewayConfig::default());
        f.service.sync_shop(&session("a")).await.unwrap();
        assert_eq!(f.registry.shops(), vec![shop("a")]);

        // requests of the last window still count against the shop
        assert_eq!(f.service.release_unscheduled(&[]), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(f.service.release_unscheduled(&[shop("a")]), 0);
        assert_eq!(f.service.release_unscheduled(&[]), 1);
        assert!(f.registry.shops().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_graphql_errors_fail_the_cycle() {
        let f = fixture(Mode::BlogsDenied, GatewayConfig::default());

        let err = tokio_test::assert_err!(f.service.sync_shop(&session("a")).await);

        assert!(matches!(err, SyncError::UnexpectedResponse(ref m) if m.contains("Access denied")));
        // kinds before the failure were already stored
        assert_eq!(f.resources.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_gateway_retries_surface() {
        let config = GatewayConfig::default().with_retry(1, Duration::from_millis(100));
        let f = fixture(Mode::Throttled, config);

        let err = f.service.sync_shop(&session("a")).await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::Gateway(GatewayError::RateLimitExceeded { attempts: 2 })
        ));
        assert_eq!(f.requests.lock().unwrap().len(), 2);
        assert!(f.resources.batches.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod router_tests {
    use super::mocks::*;
    use crate::application::config::SchedulerConfig;
    use crate::application::scheduler::SyncScheduler;
    use crate::presentation::router::sync_router;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gateway::{
        AccessToken, GatewayConfig, GatewayRegistry, GraphqlOperation, GraphqlTransport,
        RawResponse, TransportError, TransportFactory,
    };
    use kernel::shop::ShopDomain;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct NoopTransport;

    impl GraphqlTransport for NoopTransport {
        async fn execute(
            &self,
            _operation: &GraphqlOperation,
        ) -> Result<RawResponse, TransportError> {
            Ok(RawResponse::new(200, r#"{"data":{}}"#))
        }
    }

    struct NoopFactory;

    impl TransportFactory for NoopFactory {
        type Transport = NoopTransport;

        fn build(&self, _shop: &ShopDomain, _access_token: AccessToken) -> NoopTransport {
            NoopTransport
        }
    }

    struct App {
        router: Router,
        activity: Arc<MockActivity>,
        scheduler: SyncScheduler<MockActivity, MockSyncer, MockCleanup>,
        gateways: Arc<GatewayRegistry<NoopFactory>>,
    }

    fn app() -> App {
        let activity = Arc::new(MockActivity::default());
        let scheduler = SyncScheduler::new(
            activity.clone(),
            Arc::new(MockSyncer::default()),
            Arc::new(MockCleanup::default()),
            SchedulerConfig::default(),
        );
        let gateways = Arc::new(GatewayRegistry::new(NoopFactory, GatewayConfig::default()));
        App {
            router: sync_router(scheduler.clone(), activity.clone(), gateways.clone()),
            activity,
            scheduler,
            gateways,
        }
    }

    fn activity_request(shop: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/shops/{shop}/activity"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_activity_schedules_shop() {
        let app = app();

        let response = app
            .router
            .oneshot(activity_request(
                "demo.myshopify.com",
                r#"{"accessToken":"shpat_1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["shop"], "demo.myshopify.com");
        assert!(app.scheduler.is_shop_active(&shop("demo")));
        assert_eq!(app.activity.recorded.lock().unwrap().clone(), vec![shop("demo")]);

        app.scheduler.stop_all();
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(activity_request("not_a_shop", r#"{"accessToken":"t"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .router
            .oneshot(activity_request("demo.myshopify.com", r#"{"accessToken":"  "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!app.scheduler.is_shop_active(&shop("demo")));
    }

    #[tokio::test]
    async fn test_unknown_shop_is_not_found() {
        let app = app();

        for (method, uri) in [
            ("GET", "/shops/ghost.myshopify.com"),
            ("GET", "/shops/ghost.myshopify.com/queue"),
            ("DELETE", "/shops/ghost.myshopify.com"),
        ] {
            let response = app.router.clone().oneshot(request(method, uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_info_queue_and_stop() {
        let app = app();
        app.scheduler.start_sync_for_shop(session("demo"));
        app.gateways.gateway_for(&shop("demo"), "token-demo");

        let response = app
            .router
            .clone()
            .oneshot(request("GET", "/shops/demo.myshopify.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["shop"], "demo.myshopify.com");

        let response = app
            .router
            .clone()
            .oneshot(request("GET", "/shops/demo.myshopify.com/queue"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["queueLength"], 0);

        let response = app
            .router
            .clone()
            .oneshot(request("DELETE", "/shops/demo.myshopify.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!app.scheduler.is_shop_active(&shop("demo")));
        assert!(app.gateways.get(&shop("demo")).is_none());

        app.scheduler.stop_all();
    }

    #[tokio::test]
    async fn test_stats() {
        let app = app();
        app.scheduler.start_sync_for_shop(session("demo"));

        let response = app.router.oneshot(request("GET", "/stats")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["activeShops"], 1);
        assert_eq!(body["syncIntervalSecs"], 40);
        assert_eq!(body["cleanupScheduled"], true);

        app.scheduler.stop_all();
    }
}

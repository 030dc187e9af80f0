//! Domain Entities
//!
//! Values exchanged between the scheduler, the sync operation and the stores.

use chrono::{DateTime, Utc};
use kernel::shop::ShopDomain;
use serde::Serialize;
use std::fmt;

/// Registration context for one shop
#[derive(Clone)]
pub struct ShopSession {
    pub shop: ShopDomain,
    pub access_token: String,
}

impl ShopSession {
    pub fn new(shop: ShopDomain, access_token: impl Into<String>) -> Self {
        Self {
            shop,
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopSession")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Content types pulled from the Admin API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Product,
    Collection,
    Page,
    Blog,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Product,
        ResourceKind::Collection,
        ResourceKind::Page,
        ResourceKind::Blog,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Product => "product",
            ResourceKind::Collection => "collection",
            ResourceKind::Page => "page",
            ResourceKind::Blog => "blog",
        }
    }

    /// Root connection field in the Admin GraphQL schema
    pub const fn root_field(&self) -> &'static str {
        match self {
            ResourceKind::Product => "products",
            ResourceKind::Collection => "collections",
            ResourceKind::Page => "pages",
            ResourceKind::Blog => "blogs",
        }
    }
}

/// One synced content item
#[derive(Debug, Clone, PartialEq)]
pub struct ShopResource {
    pub shop: ShopDomain,
    pub kind: ResourceKind,
    /// Shopify global ID, e.g. `gid://shopify/Product/1`
    pub gid: String,
    pub handle: Option<String>,
    pub title: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of one sync cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub products: usize,
    pub collections: usize,
    pub pages: usize,
    pub blogs: usize,
    pub duration_ms: u64,
}

impl SyncStats {
    pub fn record(&mut self, kind: ResourceKind, count: usize) {
        match kind {
            ResourceKind::Product => self.products += count,
            ResourceKind::Collection => self.collections += count,
            ResourceKind::Page => self.pages += count,
            ResourceKind::Blog => self.blogs += count,
        }
    }

    pub fn total(&self) -> usize {
        self.products + self.collections + self.pages + self.blogs
    }
}

/// Scheduling snapshot for one shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    pub shop: ShopDomain,
    pub started_at: DateTime<Utc>,
    pub is_running: bool,
    pub uptime_secs: u64,
}

/// Scheduler-wide snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub active_shops: usize,
    pub running_syncs: usize,
    pub cleanup_scheduled: bool,
    pub sync_interval_secs: u64,
    pub inactivity_threshold_secs: u64,
    pub shops: Vec<SyncInfo>,
}

/// Task statuses that will never change again
pub const TERMINAL_TASK_STATUSES: [&str; 3] = ["completed", "failed", "cancelled"];

/// Rows the cleanup loop removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupCriteria {
    /// Terminal tasks last updated before `terminal_before`, plus any task
    /// whose explicit expiry is before `now`
    BackgroundTasks {
        terminal_before: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    /// Processed request-log entries created before `processed_before`
    RequestLogs { processed_before: DateTime<Utc> },
}

/// Outcome of one cleanup run; `None` means that store failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub tasks_deleted: Option<u64>,
    pub request_logs_deleted: Option<u64>,
}

impl CleanupReport {
    pub fn is_complete(&self) -> bool {
        self.tasks_deleted.is_some() && self.request_logs_deleted.is_some()
    }
}

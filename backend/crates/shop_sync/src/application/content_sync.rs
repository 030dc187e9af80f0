//! Content Sync Use Case
//!
//! Pulls products, collections, pages and blogs for one shop through that
//! shop's rate-limited gateway and writes them to the resource store.

use chrono::{DateTime, Utc};
use gateway::{GatewayRegistry, GraphqlOperation, RawResponse, TransportFactory};
use kernel::shop::ShopDomain;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;

use crate::domain::entities::{ResourceKind, ShopResource, ShopSession, SyncStats};
use crate::domain::repository::{ResourceRepository, ShopSyncer};
use crate::error::{SyncError, SyncResult};

/// Connection page size requested per query
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Node {
    id: String,
    handle: Option<String>,
    title: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    nodes: Vec<Node>,
    page_info: PageInfo,
}

/// Cursor-paginated listing query for a resource kind
pub fn list_query(kind: ResourceKind) -> String {
    format!(
        "query List($first: Int!, $after: String) {{ {field}(first: $first, after: $after) {{ nodes {{ id title handle updatedAt }} pageInfo {{ hasNextPage endCursor }} }} }}",
        field = kind.root_field()
    )
}

fn parse_connection(kind: ResourceKind, response: &RawResponse) -> SyncResult<Connection> {
    let Some(data) = response.data() else {
        let messages: Vec<String> = response.errors().into_iter().map(|e| e.message).collect();
        return Err(SyncError::UnexpectedResponse(if messages.is_empty() {
            format!("{} listing returned no data", kind.as_str())
        } else {
            messages.join("; ")
        }));
    };

    let connection = data
        .get(kind.root_field())
        .cloned()
        .ok_or_else(|| {
            SyncError::UnexpectedResponse(format!("missing `{}` in response", kind.root_field()))
        })?;

    serde_json::from_value(connection)
        .map_err(|e| SyncError::UnexpectedResponse(format!("{} listing: {}", kind.as_str(), e)))
}

pub struct ContentSyncService<F: TransportFactory, R> {
    gateways: Arc<GatewayRegistry<F>>,
    resources: Arc<R>,
    page_size: u32,
}

impl<F: TransportFactory, R> ContentSyncService<F, R> {
    pub fn new(gateways: Arc<GatewayRegistry<F>>, resources: Arc<R>) -> Self {
        Self {
            gateways,
            resources,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

impl<F, R> ContentSyncService<F, R>
where
    F: TransportFactory,
    R: ResourceRepository + Send + Sync,
{
    async fn fetch_all(
        &self,
        session: &ShopSession,
        kind: ResourceKind,
    ) -> SyncResult<Vec<ShopResource>> {
        let gateway = self
            .gateways
            .gateway_for(&session.shop, &session.access_token);
        let query = list_query(kind);
        let mut resources = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let operation = GraphqlOperation::new(query.clone())
                .with_variables(json!({ "first": self.page_size, "after": after }));
            let response = gateway.submit(operation).await?;
            let connection = parse_connection(kind, &response)?;

            resources.extend(
                connection
                    .nodes
                    .into_iter()
                    .map(|node| to_resource(&session.shop, kind, node)),
            );

            match connection.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(cursor),
                } => after = Some(cursor),
                _ => break,
            }
        }

        Ok(resources)
    }
}

fn to_resource(shop: &ShopDomain, kind: ResourceKind, node: Node) -> ShopResource {
    ShopResource {
        shop: shop.clone(),
        kind,
        gid: node.id,
        handle: node.handle,
        title: node.title,
        updated_at: node.updated_at,
    }
}

impl<F, R> ShopSyncer for ContentSyncService<F, R>
where
    F: TransportFactory,
    R: ResourceRepository + Send + Sync,
{
    async fn sync_shop(&self, session: &ShopSession) -> SyncResult<SyncStats> {
        let started = Instant::now();
        let mut stats = SyncStats::default();

        for kind in ResourceKind::ALL {
            let resources = self.fetch_all(session, kind).await?;
            if !resources.is_empty() {
                self.resources
                    .upsert_resources(&session.shop, &resources)
                    .await?;
            }
            stats.record(kind, resources.len());
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(
            shop = %session.shop,
            products = stats.products,
            collections = stats.collections,
            pages = stats.pages,
            blogs = stats.blogs,
            "Content pulled"
        );

        Ok(stats)
    }

    fn release_unscheduled(&self, scheduled: &[ShopDomain]) -> usize {
        self.gateways.retain_idle(|shop| scheduled.contains(shop))
    }
}

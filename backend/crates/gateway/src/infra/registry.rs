//! Per-shop gateway registry
//!
//! Rate limits are scoped per shop upstream, so each shop has exactly one
//! [`RequestGateway`]. A changed access token is rotated inside the existing
//! transport. Entries are only dropped once their gateway is idle, so a
//! replacement never shares the shop's budget with a gateway still draining.

use kernel::shop::ShopDomain;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::application::config::GatewayConfig;
use crate::application::gateway::{QueueStatus, RequestGateway};
use crate::domain::transport::{AccessToken, TransportFactory};

struct Entry<T> {
    access_token: AccessToken,
    gateway: RequestGateway<T>,
}

pub struct GatewayRegistry<F: TransportFactory> {
    factory: F,
    config: GatewayConfig,
    gateways: Mutex<HashMap<ShopDomain, Entry<F::Transport>>>,
}

impl<F: TransportFactory> GatewayRegistry<F> {
    pub fn new(factory: F, config: GatewayConfig) -> Self {
        Self {
            factory,
            config,
            gateways: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ShopDomain, Entry<F::Transport>>> {
        self.gateways.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gateway for the shop, created on first use
    pub fn gateway_for(
        &self,
        shop: &ShopDomain,
        access_token: &str,
    ) -> RequestGateway<F::Transport> {
        let mut gateways = self.lock();

        if let Some(entry) = gateways.get(shop) {
            if entry.access_token.rotate(access_token) {
                tracing::info!(shop = %shop, "Access token rotated");
            }
            return entry.gateway.clone();
        }

        let access_token = AccessToken::new(access_token);
        let transport = self.factory.build(shop, access_token.clone());
        let gateway = RequestGateway::new(shop.as_str(), transport, self.config);
        gateways.insert(
            shop.clone(),
            Entry {
                access_token,
                gateway: gateway.clone(),
            },
        );
        gateway
    }

    pub fn get(&self, shop: &ShopDomain) -> Option<RequestGateway<F::Transport>> {
        self.lock().get(shop).map(|entry| entry.gateway.clone())
    }

    pub fn queue_status(&self, shop: &ShopDomain) -> Option<QueueStatus> {
        self.lock().get(shop).map(|entry| entry.gateway.queue_status())
    }

    /// Forget the shop's gateway if it is idle; a busy one is kept and reused
    pub fn remove_idle(&self, shop: &ShopDomain) -> bool {
        let mut gateways = self.lock();
        match gateways.get(shop) {
            Some(entry) if entry.gateway.is_idle() => {
                gateways.remove(shop);
                true
            }
            Some(_) => {
                tracing::debug!(shop = %shop, "Gateway still busy, keeping it");
                false
            }
            None => false,
        }
    }

    /// Drop idle gateways of shops for which `keep` is false; returns how many
    pub fn retain_idle(&self, keep: impl Fn(&ShopDomain) -> bool) -> usize {
        let mut gateways = self.lock();
        let before = gateways.len();
        gateways.retain(|shop, entry| keep(shop) || !entry.gateway.is_idle());
        let evicted = before - gateways.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = gateways.len(), "Idle gateways evicted");
        }
        evicted
    }

    pub fn shops(&self) -> Vec<ShopDomain> {
        let mut shops: Vec<ShopDomain> = self.lock().keys().cloned().collect();
        shops.sort();
        shops
    }
}

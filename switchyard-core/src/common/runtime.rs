/*
 * Copyright (c) 2026. Switchyard contributors
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::common::config::CONFIG;
use crate::common::SwitchyardConfig;
use crate::message::RoutingError;
use crate::routing::{
    Address, AddressManager, InProcessStubFactory, MessageRouter, MulticastReceiverRegistry,
    RoutingTable, StubFactoryRegistry, TransportKind,
};
use crate::rpc::RequestReplyManager;
use crate::traits::ParentRouterProxy;

/// The entry point: launches a fully wired routing runtime in one of the
/// three deployment topologies.
///
/// A standalone runtime owns its routing decisions outright; a child runtime
/// attaches to a parent at launch; a library runtime launches detached and
/// attaches later via [`SwitchyardRuntime::connect_to_parent`], queuing
/// registrations in the meantime.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchyardApp;

impl SwitchyardApp {
    /// Launches a standalone runtime with the process-wide configuration,
    /// loaded from the environment once on first use.
    pub fn launch() -> SwitchyardRuntime {
        Self::launch_with_config(CONFIG.clone())
    }

    pub fn launch_with_config(config: SwitchyardConfig) -> SwitchyardRuntime {
        SwitchyardRuntime::build(config)
    }

    /// Launches a runtime attached to a parent router from the start.
    pub async fn launch_child(
        config: SwitchyardConfig,
        parent: Arc<dyn ParentRouterProxy>,
    ) -> Result<SwitchyardRuntime, RoutingError> {
        let runtime = SwitchyardRuntime::build(config);
        runtime.connect_to_parent(parent).await?;
        Ok(runtime)
    }

    /// Launches a detached runtime that expects a parent to attach later.
    /// Identical wiring to [`launch_with_config`]; the name documents intent.
    ///
    /// [`launch_with_config`]: SwitchyardApp::launch_with_config
    pub fn launch_library(config: SwitchyardConfig) -> SwitchyardRuntime {
        SwitchyardRuntime::build(config)
    }
}

/// A running routing core: the router, the request/reply manager, and the
/// directories they share, plus the background tasks keeping them healthy.
///
/// Cheaply cloneable; all clones refer to the same runtime.
#[derive(Clone)]
pub struct SwitchyardRuntime {
    config: Arc<SwitchyardConfig>,
    routing_table: Arc<RoutingTable>,
    multicast_registry: Arc<MulticastReceiverRegistry>,
    address_manager: Arc<AddressManager>,
    stub_factories: Arc<StubFactoryRegistry>,
    in_process_factory: Arc<InProcessStubFactory>,
    router: Arc<MessageRouter>,
    request_reply: Arc<RequestReplyManager>,
    cancellation_token: CancellationToken,
    tracker: TaskTracker,
}

impl SwitchyardRuntime {
    fn build(config: SwitchyardConfig) -> Self {
        let cancellation_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let routing_table = Arc::new(RoutingTable::new(
            config.routing.routing_table_grace_period_ms,
        ));
        let multicast_registry = Arc::new(MulticastReceiverRegistry::new());
        let address_manager = Arc::new(AddressManager::new(
            routing_table.clone(),
            multicast_registry.clone(),
        ));

        let stub_factories = Arc::new(StubFactoryRegistry::new());
        let in_process_factory = Arc::new(InProcessStubFactory::new());
        stub_factories.register(TransportKind::InProcess, in_process_factory.clone());

        let channel_id = Uuid::new_v4().to_string();
        let mut inbound = in_process_factory.bind(
            channel_id.clone(),
            config.limits.inbound_channel_capacity,
        );
        let local_address = Address::InProcess { channel_id };

        let router = MessageRouter::new(
            local_address,
            routing_table.clone(),
            multicast_registry.clone(),
            address_manager.clone(),
            stub_factories.clone(),
            &config,
            cancellation_token.child_token(),
        );
        let request_reply =
            RequestReplyManager::new(router.clone(), cancellation_token.child_token());

        // Loopback: messages sent to our own in-process address arrive here
        // and re-enter the router as inbound messages.
        let loopback_router = router.clone();
        let loopback_token = cancellation_token.clone();
        tracker.spawn(async move {
            loop {
                tokio::select! {
                    _ = loopback_token.cancelled() => break,
                    message = inbound.recv() => {
                        let Some(message) = message else { break };
                        loopback_router.on_message_arrived(message).await;
                    }
                }
            }
            trace!("loopback task stopped");
        });

        // Periodic sweep of expired routing entries.
        let sweep_table = routing_table.clone();
        let sweep_token = cancellation_token.clone();
        let sweep_interval = config.cleanup_interval();
        tracker.spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = sweep_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let purged = sweep_table.purge_expired();
                        if purged > 0 {
                            debug!(purged, "routing table sweep");
                        }
                    }
                }
            }
        });

        SwitchyardRuntime {
            config: Arc::new(config),
            routing_table,
            multicast_registry,
            address_manager,
            stub_factories,
            in_process_factory,
            router,
            request_reply,
            cancellation_token,
            tracker,
        }
    }

    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    pub fn request_reply(&self) -> &Arc<RequestReplyManager> {
        &self.request_reply
    }

    pub fn routing_table(&self) -> &Arc<RoutingTable> {
        &self.routing_table
    }

    pub fn multicast_registry(&self) -> &Arc<MulticastReceiverRegistry> {
        &self.multicast_registry
    }

    pub fn address_manager(&self) -> &Arc<AddressManager> {
        &self.address_manager
    }

    pub fn stub_factories(&self) -> &Arc<StubFactoryRegistry> {
        &self.stub_factories
    }

    pub fn in_process_factory(&self) -> &Arc<InProcessStubFactory> {
        &self.in_process_factory
    }

    pub fn local_address(&self) -> &Address {
        self.router.local_address()
    }

    /// Attaches a parent router; queued registrations are replayed in order.
    pub async fn connect_to_parent(
        &self,
        parent: Arc<dyn ParentRouterProxy>,
    ) -> Result<(), RoutingError> {
        self.router.connect_to_parent(parent).await
    }

    /// Shuts the whole runtime down within the configured deadline: the
    /// request/reply manager first so no new calls start, then the router,
    /// then the background tasks.
    pub async fn shutdown_all(&self) -> anyhow::Result<()> {
        let deadline = Duration::from_millis(self.config.timeouts.shutdown_timeout_ms);
        timeout(deadline, async {
            self.request_reply.shutdown().await;
            self.router.shutdown().await;
            self.cancellation_token.cancel();
            self.tracker.close();
            self.tracker.wait().await;
        })
        .await
        .map_err(|_| anyhow!("shutdown did not complete within {deadline:?}"))?;
        Ok(())
    }
}

impl std::fmt::Debug for SwitchyardRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchyardRuntime")
            .field("local_address", self.router.local_address())
            .field("routing_entries", &self.routing_table.len())
            .finish_non_exhaustive()
    }
}

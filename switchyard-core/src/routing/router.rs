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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tokio_util::time::DelayQueue;
use tracing::{debug, error, instrument, trace, warn};

use crate::common::{MulticastId, ParticipantId, RouteFailureHandler, SwitchyardConfig};
use crate::message::{DelayableMessage, ImmutableMessage, MessageKind, RoutingError};
use crate::routing::{
    Address, AddressManager, MulticastReceiverRegistry, RoutingTable, StubFactoryRegistry,
};
use crate::traits::{MessageListener, ParentRouterProxy};

/// A registration deferred because no parent router is attached yet; replayed
/// in submission order once one is.
#[derive(Debug, Clone)]
enum ParentOp {
    AddNextHop {
        participant_id: ParticipantId,
        address: Address,
        is_globally_visible: bool,
    },
    AddMulticastReceiver {
        multicast_id: MulticastId,
        subscriber: ParticipantId,
        provider: ParticipantId,
    },
    RemoveMulticastReceiver {
        multicast_id: MulticastId,
        subscriber: ParticipantId,
        provider: ParticipantId,
    },
}

/// A message waiting in the scheduler's delay queue.
struct ScheduledSend {
    item: DelayableMessage,
    not_before: Instant,
}

/// The delivery engine: resolves destinations, schedules sends on a
/// delay-ordered queue, retries retryable transport failures with backoff up
/// to the message TTL, and reports every terminal failure exactly once.
///
/// One `MessageRouter` serves all three deployment topologies. A standalone
/// (root) router has no parent and treats unresolved destinations as
/// terminal; attaching a [`ParentRouterProxy`] via [`connect_to_parent`]
/// turns it into the child/library variant, which defers unknown
/// destinations to the parent and mirrors registrations to it.
///
/// [`connect_to_parent`]: MessageRouter::connect_to_parent
pub struct MessageRouter {
    local_address: Address,
    routing_table: Arc<RoutingTable>,
    multicast_registry: Arc<MulticastReceiverRegistry>,
    address_manager: Arc<AddressManager>,
    stub_factories: Arc<StubFactoryRegistry>,
    scheduler_tx: mpsc::UnboundedSender<ScheduledSend>,
    dispatch_permits: Arc<Semaphore>,
    retry_interval: Duration,
    failure_handler: RwLock<RouteFailureHandler>,
    listeners: DashMap<ParticipantId, Arc<dyn MessageListener>>,
    default_listener: RwLock<Option<Arc<dyn MessageListener>>>,
    parent: RwLock<Option<Arc<dyn ParentRouterProxy>>>,
    queued_parent_ops: Mutex<Vec<ParentOp>>,
    running: AtomicBool,
    cancellation_token: CancellationToken,
    tracker: TaskTracker,
}

impl MessageRouter {
    pub fn new(
        local_address: Address,
        routing_table: Arc<RoutingTable>,
        multicast_registry: Arc<MulticastReceiverRegistry>,
        address_manager: Arc<AddressManager>,
        stub_factories: Arc<StubFactoryRegistry>,
        config: &SwitchyardConfig,
        cancellation_token: CancellationToken,
    ) -> Arc<Self> {
        let (scheduler_tx, scheduler_rx) = mpsc::unbounded_channel();
        let default_failure_handler: RouteFailureHandler = Arc::new(|message, cause| {
            error!(message = %message, %cause, "message delivery failed");
        });
        let router = Arc::new(MessageRouter {
            local_address,
            routing_table,
            multicast_registry,
            address_manager,
            stub_factories,
            scheduler_tx,
            dispatch_permits: Arc::new(Semaphore::new(config.routing.max_parallel_sends)),
            retry_interval: config.send_retry_interval(),
            failure_handler: RwLock::new(default_failure_handler),
            listeners: DashMap::new(),
            default_listener: RwLock::new(None),
            parent: RwLock::new(None),
            queued_parent_ops: Mutex::new(Vec::new()),
            running: AtomicBool::new(true),
            cancellation_token,
            tracker: TaskTracker::new(),
        });
        router.clone().spawn_scheduler(scheduler_rx);
        router
    }

    /// The in-process address other components use to reach this router.
    pub fn local_address(&self) -> &Address {
        &self.local_address
    }

    /// The address replies to requests sent through this router should go
    /// to: the parent's reply-to address when one is attached, otherwise our
    /// own.
    pub fn reply_to_address(&self) -> Address {
        match self.parent.read().as_ref() {
            Some(parent) => parent.reply_to_address(),
            None => self.local_address.clone(),
        }
    }

    pub fn set_failure_handler(&self, handler: RouteFailureHandler) {
        *self.failure_handler.write() = handler;
    }

    pub fn register_message_listener(
        &self,
        participant_id: ParticipantId,
        listener: Arc<dyn MessageListener>,
    ) {
        self.listeners.insert(participant_id, listener);
    }

    pub fn remove_message_listener(&self, participant_id: &ParticipantId) {
        self.listeners.remove(participant_id);
    }

    /// Installs the listener receiving every message without a
    /// participant-specific one; the request/reply manager registers itself
    /// here.
    pub fn set_default_listener(&self, listener: Arc<dyn MessageListener>) {
        *self.default_listener.write() = Some(listener);
    }

    /// Submits a message for delivery.
    ///
    /// Fails fast with [`RoutingError::MessageExpired`] when the TTL has
    /// already elapsed, and with [`RoutingError::UnresolvableDestination`]
    /// when no route is known. A parent router, if attached, gets a chance
    /// to resolve the recipient first; on success the parent's own address
    /// is cached so later submissions do not re-query it.
    #[instrument(skip(self, message), fields(message = %message))]
    pub async fn route(&self, message: ImmutableMessage) -> Result<(), RoutingError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(RoutingError::Shutdown);
        }
        if message.is_expired() {
            return Err(RoutingError::MessageExpired {
                message_id: message.id(),
                expiry_ms: message.expiry().millis(),
            });
        }

        let message = Arc::new(message);
        let mut addresses = self.address_manager.get_addresses(&message);
        if addresses.is_empty() {
            // A multicast without subscribers is quiet, not an error.
            if message.kind() == MessageKind::Multicast {
                trace!(message = %message, "multicast has no receivers");
                return Ok(());
            }
            addresses.insert(self.resolve_via_parent(&message).await?);
        }

        let now = Instant::now();
        for address in addresses {
            self.enqueue(
                DelayableMessage::new(message.clone(), address, 0),
                now,
            )?;
        }
        Ok(())
    }

    /// Asks the attached parent whether it knows the recipient; on success
    /// the parent's transport address is cached in the routing table.
    async fn resolve_via_parent(
        &self,
        message: &Arc<ImmutableMessage>,
    ) -> Result<Address, RoutingError> {
        let recipient = message.recipient().clone();
        // Clone the proxy out so no guard is held across the remote call.
        let Some(parent) = self.parent.read().clone() else {
            return Err(RoutingError::UnresolvableDestination(recipient));
        };
        if parent.resolve_next_hop(&recipient).await? {
            let address = parent.address();
            self.routing_table
                .put(recipient, address.clone(), true, None, false, true);
            debug!(address = %address, "cached parent route for recipient");
            Ok(address)
        } else {
            Err(RoutingError::UnresolvableDestination(recipient))
        }
    }

    fn enqueue(&self, item: DelayableMessage, not_before: Instant) -> Result<(), RoutingError> {
        self.scheduler_tx
            .send(ScheduledSend { item, not_before })
            .map_err(|_| RoutingError::Shutdown)
    }

    /// Registers a route for a participant. Globally visible hops are
    /// mirrored to the parent router (or queued until one attaches).
    pub async fn add_next_hop(
        &self,
        participant_id: &ParticipantId,
        address: Address,
        is_globally_visible: bool,
    ) -> Result<(), RoutingError> {
        self.routing_table.put(
            participant_id.clone(),
            address.clone(),
            is_globally_visible,
            None,
            false,
            true,
        );
        if is_globally_visible {
            self.parent_op(ParentOp::AddNextHop {
                participant_id: participant_id.clone(),
                address,
                is_globally_visible,
            })
            .await?;
        }
        Ok(())
    }

    pub async fn remove_next_hop(&self, participant_id: &ParticipantId) {
        self.routing_table.remove(participant_id);
    }

    /// Registers a multicast receiver locally and mirrors it to the parent.
    pub async fn add_multicast_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) -> Result<(), RoutingError> {
        self.multicast_registry
            .add_receiver(multicast_id, subscriber, provider);
        self.parent_op(ParentOp::AddMulticastReceiver {
            multicast_id: multicast_id.clone(),
            subscriber: subscriber.clone(),
            provider: provider.clone(),
        })
        .await
    }

    pub async fn remove_multicast_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) -> Result<(), RoutingError> {
        self.multicast_registry
            .remove_receiver(multicast_id, subscriber, provider);
        self.parent_op(ParentOp::RemoveMulticastReceiver {
            multicast_id: multicast_id.clone(),
            subscriber: subscriber.clone(),
            provider: provider.clone(),
        })
        .await
    }

    /// Attaches a parent router, turning this router into the child/library
    /// variant, and replays every registration queued while detached in
    /// submission order.
    pub async fn connect_to_parent(
        &self,
        parent: Arc<dyn ParentRouterProxy>,
    ) -> Result<(), RoutingError> {
        *self.parent.write() = Some(parent.clone());
        let queued: Vec<ParentOp> = self.queued_parent_ops.lock().drain(..).collect();
        for op in queued {
            Self::apply_parent_op(parent.as_ref(), op).await?;
        }
        Ok(())
    }

    pub fn has_parent(&self) -> bool {
        self.parent.read().is_some()
    }

    async fn parent_op(&self, op: ParentOp) -> Result<(), RoutingError> {
        // The parent is read while holding the queue lock: an op racing
        // `connect_to_parent` either lands in the queue before the drain or
        // sees the attached parent, never neither.
        let parent = {
            let mut queued = self.queued_parent_ops.lock();
            match self.parent.read().clone() {
                Some(parent) => parent,
                None => {
                    queued.push(op);
                    return Ok(());
                }
            }
        };
        Self::apply_parent_op(parent.as_ref(), op).await
    }

    async fn apply_parent_op(
        parent: &dyn ParentRouterProxy,
        op: ParentOp,
    ) -> Result<(), RoutingError> {
        match op {
            ParentOp::AddNextHop {
                participant_id,
                address,
                is_globally_visible,
            } => {
                parent
                    .add_next_hop(&participant_id, &address, is_globally_visible)
                    .await
            }
            ParentOp::AddMulticastReceiver {
                multicast_id,
                subscriber,
                provider,
            } => {
                parent
                    .add_multicast_receiver(&multicast_id, &subscriber, &provider)
                    .await
            }
            ParentOp::RemoveMulticastReceiver {
                multicast_id,
                subscriber,
                provider,
            } => {
                parent
                    .remove_multicast_receiver(&multicast_id, &subscriber, &provider)
                    .await
            }
        }
    }

    /// Transport receive callback: delivers an inbound message to the
    /// registered listener for its recipient, falling back to the default
    /// listener. Multicasts fan out to every subscribed listener.
    pub async fn on_message_arrived(&self, message: Arc<ImmutableMessage>) {
        if message.is_expired() {
            debug!(message = %message, "inbound message already expired, dropped");
            return;
        }
        match message.kind() {
            MessageKind::Multicast => {
                let Some(multicast_id) = message.multicast_id() else {
                    warn!(message = %message, "multicast message without multicast id");
                    return;
                };
                for subscriber in self.multicast_registry.receivers(&multicast_id) {
                    let listener = self.listeners.get(&subscriber).map(|l| l.value().clone());
                    if let Some(listener) = listener {
                        listener.on_message_arrived(message.clone()).await;
                    }
                }
            }
            _ => {
                let listener = self
                    .listeners
                    .get(message.recipient())
                    .map(|l| l.value().clone())
                    .or_else(|| self.default_listener.read().clone());
                match listener {
                    Some(listener) => listener.on_message_arrived(message).await,
                    None => warn!(message = %message, "no listener for inbound message"),
                }
            }
        }
    }

    /// Transport receive error callback.
    pub fn on_error(&self, message: Arc<ImmutableMessage>, cause: RoutingError) {
        warn!(message = %message, %cause, "transport reported inbound error");
    }

    /// Stops accepting messages, cancels the scheduler, and waits for
    /// in-flight dispatch tasks to finish.
    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.cancellation_token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn report_failure(&self, message: Arc<ImmutableMessage>, cause: RoutingError) {
        let handler = self.failure_handler.read().clone();
        handler(message, cause);
    }

    /// The scheduler task: owns the delay queue, admits messages once their
    /// not-before time has passed, and hands them to permit-gated dispatch
    /// tasks.
    fn spawn_scheduler(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<ScheduledSend>) {
        let tracker = self.tracker.clone();
        tracker.spawn(async move {
            let mut queue: DelayQueue<DelayableMessage> = DelayQueue::new();
            loop {
                tokio::select! {
                    _ = self.cancellation_token.cancelled() => {
                        trace!("scheduler cancelled");
                        break;
                    }
                    scheduled = rx.recv() => {
                        let Some(ScheduledSend { item, not_before }) = scheduled else { break; };
                        queue.insert_at(item, not_before);
                    }
                    Some(expired) = queue.next(), if !queue.is_empty() => {
                        self.clone().spawn_dispatch(expired.into_inner());
                    }
                }
            }
        });
    }

    fn spawn_dispatch(self: Arc<Self>, item: DelayableMessage) {
        let permits = self.dispatch_permits.clone();
        let tracker = self.tracker.clone();
        tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            self.dispatch(item).await;
        });
    }

    /// One delivery attempt. Retryable transport failures re-enqueue the
    /// message with the retry interval; everything else is terminal and
    /// reported through the failure handler. Never panics or errors across
    /// the worker boundary.
    async fn dispatch(&self, item: DelayableMessage) {
        let message = item.message.clone();
        if message.is_expired() {
            self.report_failure(
                message.clone(),
                RoutingError::MessageExpired {
                    message_id: message.id(),
                    expiry_ms: message.expiry().millis(),
                },
            );
            return;
        }

        let Some(stub) = self.stub_factories.create(&item.address) else {
            self.report_failure(message, RoutingError::NoStubForAddress(item.address));
            return;
        };

        match stub.send(message.clone()).await {
            Ok(()) => {
                trace!(message = %message, address = %item.address, retries = item.retries, "delivered");
            }
            Err(cause) if cause.is_retryable() => {
                if message.is_expired() {
                    self.report_failure(
                        message.clone(),
                        RoutingError::MessageExpired {
                            message_id: message.id(),
                            expiry_ms: message.expiry().millis(),
                        },
                    );
                    return;
                }
                debug!(
                    message = %message,
                    address = %item.address,
                    retries = item.retries,
                    %cause,
                    "retryable send failure, rescheduling"
                );
                let retry = DelayableMessage::new(message.clone(), item.address, item.retries + 1);
                if self
                    .enqueue(retry, Instant::now() + self.retry_interval)
                    .is_err()
                {
                    self.report_failure(message, RoutingError::Shutdown);
                }
            }
            Err(cause) => {
                self.report_failure(message, cause);
            }
        }
    }
}

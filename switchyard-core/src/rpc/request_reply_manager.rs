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

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, instrument, trace, warn};

use crate::common::ParticipantId;
use crate::message::{
    ContentWithExpiry, ExpiryDate, ImmutableMessage, MessageBuilder, MessageKind, OneWayRequest,
    Reply, Request, RoutingError, REPLY_TO_HEADER,
};
use crate::routing::{Address, MessageRouter};
use crate::rpc::{Directory, DirectoryListener, Invocable, ProviderContainer, ReplyCaller};
use crate::traits::MessageListener;

/// A request parked because its provider has not registered yet.
#[derive(Debug, Clone)]
struct QueuedRequest {
    caller: ParticipantId,
    request: Request,
}

// Queues are locked only under the owning map entry and never across an
// await, so a drained or fully expired queue can be removed from the map
// without stranding a concurrent push.
type RequestQueue = Mutex<VecDeque<ContentWithExpiry<QueuedRequest>>>;
type OneWayQueue = Mutex<VecDeque<ContentWithExpiry<OneWayRequest>>>;

/// Forwards provider registrations into the drain channel so requests queued
/// before registration are processed promptly.
struct DrainOnRegistration {
    tx: mpsc::UnboundedSender<ParticipantId>,
}

impl DirectoryListener<ProviderContainer> for DrainOnRegistration {
    fn entry_added(&self, id: &str, _value: &ProviderContainer) {
        // Send failure means the drain loop already stopped; nothing to do.
        let _ = self.tx.send(ParticipantId::from(id));
    }

    fn entry_removed(&self, _id: &str) {}
}

/// Correlates requests with replies and dispatches inbound requests to
/// registered providers.
///
/// Outbound: every request gets a [`ReplyCaller`] keyed by its
/// request-reply id, and the blocked caller is resolved by exactly one of
/// reply arrival, TTL expiry, or shutdown. Inbound: requests for a provider
/// that has not registered yet are queued per participant until registration
/// or expiry, whichever comes first.
pub struct RequestReplyManager {
    router: Arc<MessageRouter>,
    reply_callers: Arc<Directory<ReplyCaller>>,
    providers: Arc<Directory<ProviderContainer>>,
    pending_requests: Arc<DashMap<ParticipantId, RequestQueue>>,
    pending_one_ways: Arc<DashMap<ParticipantId, OneWayQueue>>,
    drain_tx: mpsc::UnboundedSender<ParticipantId>,
    running: AtomicBool,
    shutdown_token: CancellationToken,
    tracker: TaskTracker,
}

impl RequestReplyManager {
    /// Creates the manager and installs it as the router's default listener.
    pub fn new(router: Arc<MessageRouter>, shutdown_token: CancellationToken) -> Arc<Self> {
        let (drain_tx, mut drain_rx) = mpsc::unbounded_channel();
        let manager = Arc::new(RequestReplyManager {
            router: router.clone(),
            reply_callers: Arc::new(Directory::new()),
            providers: Arc::new(Directory::new()),
            pending_requests: Arc::new(DashMap::new()),
            pending_one_ways: Arc::new(DashMap::new()),
            drain_tx: drain_tx.clone(),
            running: AtomicBool::new(true),
            shutdown_token,
            tracker: TaskTracker::new(),
        });

        manager
            .providers
            .add_listener(Arc::new(DrainOnRegistration { tx: drain_tx }));

        let drainer = manager.clone();
        manager.tracker.spawn(async move {
            loop {
                tokio::select! {
                    _ = drainer.shutdown_token.cancelled() => break,
                    provider_id = drain_rx.recv() => {
                        let Some(provider_id) = provider_id else { break };
                        drainer.drain_pending(&provider_id).await;
                    }
                }
            }
        });

        router.set_default_listener(manager.clone());
        manager
    }

    /// Registers a provider under its participant id. Requests queued for
    /// this id are drained immediately afterwards, oldest first.
    pub fn register_provider(
        &self,
        participant_id: &ParticipantId,
        interface_name: impl Into<String>,
        invocable: Arc<dyn Invocable>,
    ) {
        self.providers.add(
            participant_id.as_str(),
            ProviderContainer::new(interface_name, invocable),
        );
    }

    pub fn remove_provider(&self, participant_id: &ParticipantId) {
        self.providers.remove(participant_id.as_str());
    }

    pub fn has_provider(&self, participant_id: &ParticipantId) -> bool {
        self.providers.contains(participant_id.as_str())
    }

    /// Sends a request and blocks the caller until the correlated reply
    /// arrives, the TTL elapses, or shutdown begins.
    ///
    /// A remote-reported invocation failure surfaces as
    /// [`RoutingError::Invocation`]; a reply arriving after the TTL is logged
    /// and dropped, never delivered.
    #[instrument(skip(self, request), fields(method = %request.method_name))]
    pub async fn send_request(
        &self,
        from: &ParticipantId,
        to: &ParticipantId,
        request: Request,
        ttl: Duration,
    ) -> Result<Reply, RoutingError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(RoutingError::Shutdown);
        }

        let request_reply_id = request.request_reply_id.clone();
        let expiry = ExpiryDate::from_relative_ttl(ttl);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.reply_callers
            .add(request_reply_id.clone(), ReplyCaller::new(reply_tx, expiry));

        // The reply comes back addressed to the caller; route it to us.
        self.router
            .add_next_hop(from, self.router.local_address().clone(), false)
            .await?;

        let message = MessageBuilder::request()
            .sender(from.clone())
            .recipient(to.clone())
            .expiry(expiry)
            .header(
                REPLY_TO_HEADER,
                serde_json::to_string(&self.router.reply_to_address())?,
            )
            .payload(serde_json::to_vec(&request)?)
            .build()?;

        if let Err(cause) = self.router.route(message).await {
            self.reply_callers.remove(&request_reply_id);
            return Err(cause);
        }

        tokio::select! {
            _ = self.shutdown_token.cancelled() => {
                self.reply_callers.remove(&request_reply_id);
                Err(RoutingError::Shutdown)
            }
            outcome = timeout(ttl, reply_rx) => match outcome {
                Ok(Ok(reply)) => match reply.error {
                    Some(remote_error) => Err(RoutingError::Invocation(anyhow!(remote_error))),
                    None => Ok(reply),
                },
                // Sender dropped without a reply: only shutdown does that.
                Ok(Err(_)) => Err(RoutingError::Shutdown),
                Err(_) => {
                    self.reply_callers.remove(&request_reply_id);
                    Err(RoutingError::RequestTimeout {
                        request_reply_id,
                        timeout_ms: ttl.as_millis() as u64,
                    })
                }
            }
        }
    }

    /// Sends a fire-and-forget invocation to each destination. Individual
    /// routing failures are logged and dropped; the call itself only fails
    /// when the manager is shut down or the message cannot be built.
    pub async fn send_one_way_request(
        &self,
        from: &ParticipantId,
        destinations: &[ParticipantId],
        request: OneWayRequest,
        ttl: Duration,
    ) -> Result<(), RoutingError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(RoutingError::Shutdown);
        }
        let payload = serde_json::to_vec(&request)?;
        for destination in destinations {
            let message = MessageBuilder::one_way()
                .sender(from.clone())
                .recipient(destination.clone())
                .ttl(ttl)
                .payload(payload.clone())
                .build()?;
            if let Err(cause) = self.router.route(message).await {
                warn!(destination = %destination, %cause, "one-way request dropped");
            }
        }
        Ok(())
    }

    /// Dispatches an inbound request to its provider, or parks it until the
    /// provider registers.
    async fn handle_request(
        &self,
        caller: ParticipantId,
        provider_id: ParticipantId,
        request: Request,
        expiry: ExpiryDate,
    ) {
        if expiry.is_expired() {
            debug!(provider_id = %provider_id, "request expired before dispatch, dropped");
            return;
        }
        if let Some(container) = self.providers.get(provider_id.as_str()) {
            self.invoke_and_reply(&container, &provider_id, &caller, request, expiry)
                .await;
            return;
        }

        self.pending_requests
            .entry(provider_id.clone())
            .or_default()
            .lock()
            .push_back(ContentWithExpiry::new(QueuedRequest { caller, request }, expiry));
        trace!(provider_id = %provider_id, "request queued until provider registers");
        self.arm_queue_cleanup(provider_id.clone(), expiry);

        // The provider may have registered between the lookup and the push;
        // trigger a drain so that request is not stranded.
        if self.providers.contains(provider_id.as_str()) {
            let _ = self.drain_tx.send(provider_id);
        }
    }

    async fn handle_one_way(
        &self,
        provider_id: ParticipantId,
        request: OneWayRequest,
        expiry: ExpiryDate,
    ) {
        if expiry.is_expired() {
            debug!(provider_id = %provider_id, "one-way expired before dispatch, dropped");
            return;
        }
        if let Some(container) = self.providers.get(provider_id.as_str()) {
            if let Err(cause) = container
                .invocable
                .invoke(&request.method_name, &request.params)
                .await
            {
                warn!(provider_id = %provider_id, method = %request.method_name, %cause,
                    "one-way invocation failed");
            }
            return;
        }

        self.pending_one_ways
            .entry(provider_id.clone())
            .or_default()
            .lock()
            .push_back(ContentWithExpiry::new(request, expiry));
        self.arm_queue_cleanup(provider_id.clone(), expiry);
        if self.providers.contains(provider_id.as_str()) {
            let _ = self.drain_tx.send(provider_id);
        }
    }

    /// Schedules a prune of the provider's queues once this expiry elapses;
    /// a queue left empty is dropped from the map entirely.
    fn arm_queue_cleanup(&self, provider_id: ParticipantId, expiry: ExpiryDate) {
        let Some(delay) = expiry.relative_from_now() else {
            return;
        };
        let requests = self.pending_requests.clone();
        let one_ways = self.pending_one_ways.clone();
        let token = self.shutdown_token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    requests.remove_if(&provider_id, |_, queue| {
                        let mut queue = queue.lock();
                        queue.retain(|item| !item.expiry.is_expired());
                        queue.is_empty()
                    });
                    one_ways.remove_if(&provider_id, |_, queue| {
                        let mut queue = queue.lock();
                        queue.retain(|item| !item.expiry.is_expired());
                        queue.is_empty()
                    });
                }
            }
        });
    }

    /// Processes everything queued for a freshly registered provider, oldest
    /// first, taking the queue out of the map. Entries that expired while
    /// waiting are skipped without a reply; anything queued concurrently
    /// lands in a fresh map entry and triggers another drain.
    async fn drain_pending(&self, provider_id: &ParticipantId) {
        let Some(container) = self.providers.get(provider_id.as_str()) else {
            return;
        };

        if let Some((_, queue)) = self.pending_requests.remove(provider_id) {
            for item in queue.into_inner() {
                if item.expiry.is_expired() {
                    trace!(provider_id = %provider_id, "queued request expired, skipped");
                    continue;
                }
                let QueuedRequest { caller, request } = item.content;
                self.invoke_and_reply(&container, provider_id, &caller, request, item.expiry)
                    .await;
            }
        }

        if let Some((_, queue)) = self.pending_one_ways.remove(provider_id) {
            for item in queue.into_inner() {
                if item.expiry.is_expired() {
                    continue;
                }
                if let Err(cause) = container
                    .invocable
                    .invoke(&item.content.method_name, &item.content.params)
                    .await
                {
                    warn!(provider_id = %provider_id, %cause, "queued one-way invocation failed");
                }
            }
        }
    }

    /// Invokes the provider and routes the reply back, reusing the request's
    /// expiry so a stale reply cannot outlive its request.
    async fn invoke_and_reply(
        &self,
        container: &ProviderContainer,
        provider_id: &ParticipantId,
        caller: &ParticipantId,
        request: Request,
        expiry: ExpiryDate,
    ) {
        let reply = match container
            .invocable
            .invoke(&request.method_name, &request.params)
            .await
        {
            Ok(values) => Reply::success(request.request_reply_id, values),
            Err(cause) => {
                debug!(method = %request.method_name, %cause, "provider invocation failed");
                Reply::failure(request.request_reply_id, cause.to_string())
            }
        };
        self.send_reply(provider_id, caller, reply, expiry).await;
    }

    async fn send_reply(
        &self,
        from: &ParticipantId,
        to: &ParticipantId,
        reply: Reply,
        expiry: ExpiryDate,
    ) {
        let payload = match serde_json::to_vec(&reply) {
            Ok(payload) => payload,
            Err(cause) => {
                warn!(%cause, "reply payload not encodable, dropped");
                return;
            }
        };
        let message = MessageBuilder::reply()
            .sender(from.clone())
            .recipient(to.clone())
            .expiry(expiry)
            .payload(payload);
        match message.build() {
            Ok(message) => {
                if let Err(cause) = self.router.route(message).await {
                    warn!(recipient = %to, %cause, "reply could not be routed, dropped");
                }
            }
            Err(cause) => warn!(%cause, "reply not buildable, dropped"),
        }
    }

    fn handle_reply(&self, reply: Reply) {
        match self.reply_callers.remove(&reply.request_reply_id) {
            Some(caller) => {
                if !caller.resolve(reply) {
                    debug!("reply arrived after the caller gave up, dropped");
                }
            }
            None => debug!(
                request_reply_id = %reply.request_reply_id,
                "late or unknown reply, dropped"
            ),
        }
    }

    /// Stops accepting calls and waits for in-flight invocations; pending
    /// callers are resolved with [`RoutingError::Shutdown`].
    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown_token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[async_trait]
impl MessageListener for RequestReplyManager {
    async fn on_message_arrived(&self, message: Arc<ImmutableMessage>) {
        if message.is_expired() {
            debug!(message = %message, "inbound message expired, dropped");
            return;
        }
        match message.kind() {
            MessageKind::Request => {
                let request: Request = match serde_json::from_slice(message.payload()) {
                    Ok(request) => request,
                    Err(cause) => {
                        warn!(message = %message, %cause, "unparseable request payload");
                        return;
                    }
                };
                // Remember where replies to this sender should go before
                // dispatching, so the reply can be routed.
                if let Some(raw) = message.header(REPLY_TO_HEADER) {
                    match serde_json::from_str::<Address>(raw) {
                        Ok(address) => {
                            if let Err(cause) =
                                self.router.add_next_hop(message.sender(), address, false).await
                            {
                                warn!(message = %message, %cause, "reply-to route not registered");
                            }
                        }
                        Err(cause) => {
                            warn!(message = %message, %cause, "unparseable reply-to header")
                        }
                    }
                }
                self.handle_request(
                    message.sender().clone(),
                    message.recipient().clone(),
                    request,
                    message.expiry(),
                )
                .await;
            }
            MessageKind::OneWay | MessageKind::SubscriptionStop => {
                match serde_json::from_slice::<OneWayRequest>(message.payload()) {
                    Ok(request) => {
                        self.handle_one_way(message.recipient().clone(), request, message.expiry())
                            .await;
                    }
                    Err(cause) => warn!(message = %message, %cause, "unparseable one-way payload"),
                }
            }
            MessageKind::Reply => match serde_json::from_slice::<Reply>(message.payload()) {
                Ok(reply) => self.handle_reply(reply),
                Err(cause) => warn!(message = %message, %cause, "unparseable reply payload"),
            },
            MessageKind::Multicast => {
                debug!(message = %message, "multicast delivered to default listener, ignored");
            }
        }
    }

    fn on_error(&self, message: Arc<ImmutableMessage>, cause: RoutingError) {
        warn!(message = %message, %cause, "transport reported inbound error");
    }
}

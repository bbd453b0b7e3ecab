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

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use dashmap::DashMap;
use tokio::sync::Notify;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use switchyard::prelude::*;

// Ensures tracing initialization happens only once across all tests.
static INIT: Once = Once::new();

/// Initializes the global tracing subscriber for tests, writing to
/// `logs/switchyard_tests.txt` so test output stays readable.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        std::fs::create_dir_all("logs").expect("could not create logs dir");
        let file_appender =
            RollingFileAppender::new(Rotation::NEVER, "logs", "switchyard_tests.txt");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leak the guard so the non-blocking writer survives until process exit.
        Box::leak(Box::new(guard));

        let filter = EnvFilter::new("info")
            .add_directive("switchyard_core=trace".parse().unwrap())
            .add_directive("switchyard=debug".parse().unwrap());

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::NONE)
            .with_writer(non_blocking)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// A transport double that records every delivery and can be scripted to
/// fail: either a fixed sequence of errors, or every attempt.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Arc<ImmutableMessage>>>,
    scripted_failures: Mutex<VecDeque<RoutingError>>,
    always_retryable: AtomicBool,
    attempts: AtomicUsize,
    notify: Notify,
}

impl RecordingTransport {
    pub fn fail_next(&self, error: RoutingError) {
        self.scripted_failures.lock().unwrap().push_back(error);
    }

    /// Every subsequent attempt fails with a retryable error.
    pub fn always_fail_retryable(&self) {
        self.always_retryable.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Arc<ImmutableMessage>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Blocks until at least `count` deliveries succeeded. Wrap in a timeout.
    pub async fn wait_for_sends(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.sent.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Blocks until at least `count` attempts were made, successful or not.
    pub async fn wait_for_attempts(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.attempts() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl TransportStub for RecordingTransport {
    async fn send(&self, message: Arc<ImmutableMessage>) -> Result<(), RoutingError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let outcome = if self.always_retryable.load(Ordering::SeqCst) {
            Err(RoutingError::TransportRetryable("scripted failure".into()))
        } else if let Some(error) = self.scripted_failures.lock().unwrap().pop_front() {
            Err(error)
        } else {
            self.sent.lock().unwrap().push(message);
            Ok(())
        };
        self.notify.notify_waiters();
        outcome
    }
}

/// Hands out the shared [`RecordingTransport`] for every MQTT address.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    pub transport: Arc<RecordingTransport>,
}

impl MessagingStubFactory for RecordingFactory {
    fn create(&self, address: &Address) -> Option<Arc<dyn TransportStub>> {
        match address {
            Address::Mqtt { .. } => Some(self.transport.clone()),
            _ => None,
        }
    }
}

/// Installs a recording transport on a runtime and returns it.
pub fn install_recording_transport(runtime: &SwitchyardRuntime) -> Arc<RecordingTransport> {
    let factory = Arc::new(RecordingFactory::default());
    let transport = factory.transport.clone();
    runtime
        .stub_factories()
        .register(TransportKind::Mqtt, factory);
    transport
}

pub fn mqtt_address(topic: &str) -> Address {
    Address::Mqtt {
        broker_uri: "tcp://broker.test:1883".into(),
        topic: topic.into(),
    }
}

/// A parent-router double: answers resolution from a scripted set of known
/// participants and records every mirrored registration.
#[derive(Debug)]
pub struct FakeParent {
    address: Address,
    known: DashMap<ParticipantId, ()>,
    added_hops: Mutex<Vec<(ParticipantId, Address, bool)>>,
    added_receivers: Mutex<Vec<(MulticastId, ParticipantId, ParticipantId)>>,
    removed_receivers: Mutex<Vec<(MulticastId, ParticipantId, ParticipantId)>>,
}

impl FakeParent {
    pub fn new(address: Address) -> Self {
        FakeParent {
            address,
            known: DashMap::new(),
            added_hops: Mutex::new(Vec::new()),
            added_receivers: Mutex::new(Vec::new()),
            removed_receivers: Mutex::new(Vec::new()),
        }
    }

    pub fn knows(&self, participant_id: &ParticipantId) {
        self.known.insert(participant_id.clone(), ());
    }

    pub fn added_hops(&self) -> Vec<(ParticipantId, Address, bool)> {
        self.added_hops.lock().unwrap().clone()
    }

    pub fn added_receivers(&self) -> Vec<(MulticastId, ParticipantId, ParticipantId)> {
        self.added_receivers.lock().unwrap().clone()
    }

    pub fn removed_receivers(&self) -> Vec<(MulticastId, ParticipantId, ParticipantId)> {
        self.removed_receivers.lock().unwrap().clone()
    }
}

#[async_trait]
impl ParentRouterProxy for FakeParent {
    async fn resolve_next_hop(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<bool, RoutingError> {
        Ok(self.known.contains_key(participant_id))
    }

    async fn add_next_hop(
        &self,
        participant_id: &ParticipantId,
        address: &Address,
        is_globally_visible: bool,
    ) -> Result<(), RoutingError> {
        self.added_hops.lock().unwrap().push((
            participant_id.clone(),
            address.clone(),
            is_globally_visible,
        ));
        Ok(())
    }

    async fn add_multicast_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) -> Result<(), RoutingError> {
        self.added_receivers.lock().unwrap().push((
            multicast_id.clone(),
            subscriber.clone(),
            provider.clone(),
        ));
        Ok(())
    }

    async fn remove_multicast_receiver(
        &self,
        multicast_id: &MulticastId,
        subscriber: &ParticipantId,
        provider: &ParticipantId,
    ) -> Result<(), RoutingError> {
        self.removed_receivers.lock().unwrap().push((
            multicast_id.clone(),
            subscriber.clone(),
            provider.clone(),
        ));
        Ok(())
    }

    fn reply_to_address(&self) -> Address {
        self.address.clone()
    }

    fn address(&self) -> Address {
        self.address.clone()
    }
}

/// A listener double recording everything delivered to it.
#[derive(Debug, Default)]
pub struct RecordingListener {
    received: Mutex<Vec<Arc<ImmutableMessage>>>,
    notify: Notify,
}

impl RecordingListener {
    pub fn received(&self) -> Vec<Arc<ImmutableMessage>> {
        self.received.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.received.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl MessageListener for RecordingListener {
    async fn on_message_arrived(&self, message: Arc<ImmutableMessage>) {
        self.received.lock().unwrap().push(message);
        self.notify.notify_waiters();
    }

    fn on_error(&self, _message: Arc<ImmutableMessage>, _cause: RoutingError) {}
}

/// A failure-handler hook capturing reported delivery failures.
#[derive(Debug, Default)]
pub struct FailureProbe {
    failures: Mutex<Vec<(Arc<ImmutableMessage>, RoutingError)>>,
    notify: Arc<Notify>,
}

impl FailureProbe {
    pub fn install(runtime: &SwitchyardRuntime) -> Arc<Self> {
        let probe = Arc::new(FailureProbe::default());
        let hook = probe.clone();
        runtime
            .router()
            .set_failure_handler(Arc::new(move |message, cause| {
                hook.failures.lock().unwrap().push((message, cause));
                hook.notify.notify_waiters();
            }));
        probe
    }

    // RoutingError is not Clone, so failures are inspected in place.
    pub fn with_failures<R>(
        &self,
        f: impl FnOnce(&[(Arc<ImmutableMessage>, RoutingError)]) -> R,
    ) -> R {
        f(&self.failures.lock().unwrap())
    }

    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.failures.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

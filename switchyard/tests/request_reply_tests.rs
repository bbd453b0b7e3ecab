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
use serde_json::json;
use tokio::time::timeout;

use switchyard::prelude::*;

use crate::setup::initialize_tracing;

mod setup;

/// An adder provider: `add` sums its integer parameters, `fail` always
/// reports a remote error.
fn calculator() -> Arc<DispatchTable> {
    Arc::new(
        DispatchTable::new()
            .on("add", |params| async move {
                let sum: i64 = params.iter().filter_map(|v| v.as_i64()).sum();
                Ok(vec![json!(sum)])
            })
            .on("fail", |_params| async move {
                Err(RoutingError::Invocation(anyhow!("division by zero")))
            }),
    )
}

/// Wires a provider participant into the runtime: routable at the local
/// in-process address and registered with the request/reply manager.
async fn register_calculator(
    runtime: &SwitchyardRuntime,
    participant_id: &ParticipantId,
) -> anyhow::Result<()> {
    runtime
        .router()
        .add_next_hop(participant_id, runtime.local_address().clone(), false)
        .await?;
    runtime
        .request_reply()
        .register_provider(participant_id, "demo/Calculator", calculator());
    Ok(())
}

/// A request to a registered provider returns the correlated reply.
#[tokio::test(flavor = "multi_thread")]
async fn request_reply_round_trip() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    register_calculator(&runtime, &"calc".into()).await?;

    let request = Request::new("add", vec![json!(19), json!(23)], vec!["Integer".into(); 2]);
    let reply = runtime
        .request_reply()
        .send_request(
            &"client".into(),
            &"calc".into(),
            request,
            Duration::from_secs(2),
        )
        .await?;
    assert_eq!(reply.values, vec![json!(42)]);
    assert!(reply.error.is_none());

    runtime.shutdown_all().await?;
    Ok(())
}

/// A remote-reported provider failure surfaces to the caller as an
/// invocation error, not a timeout.
#[tokio::test(flavor = "multi_thread")]
async fn remote_failure_surfaces_as_invocation_error() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    register_calculator(&runtime, &"calc".into()).await?;

    let request = Request::new("fail", vec![], vec![]);
    let err = runtime
        .request_reply()
        .send_request(
            &"client".into(),
            &"calc".into(),
            request,
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::Invocation(_)));
    assert!(err.to_string().contains("division by zero"));

    runtime.shutdown_all().await?;
    Ok(())
}

/// Calling a method the provider does not implement reports an invocation
/// error carrying the method name.
#[tokio::test(flavor = "multi_thread")]
async fn unknown_method_is_reported() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    register_calculator(&runtime, &"calc".into()).await?;

    let request = Request::new("subtract", vec![], vec![]);
    let err = runtime
        .request_reply()
        .send_request(
            &"client".into(),
            &"calc".into(),
            request,
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("subtract"));

    runtime.shutdown_all().await?;
    Ok(())
}

/// Without a provider, a request times out with its TTL instead of hanging.
#[tokio::test(flavor = "multi_thread")]
async fn request_times_out_when_no_provider_answers() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    // Routable destination, but nobody registered to answer.
    runtime
        .router()
        .add_next_hop(&"calc".into(), runtime.local_address().clone(), false)
        .await?;

    let request = Request::new("add", vec![json!(1)], vec!["Integer".into()]);
    let err = runtime
        .request_reply()
        .send_request(
            &"client".into(),
            &"calc".into(),
            request,
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::RequestTimeout { .. }));

    runtime.shutdown_all().await?;
    Ok(())
}

/// A request arriving before its provider registers is parked and answered
/// once registration happens.
#[tokio::test(flavor = "multi_thread")]
async fn queued_request_is_answered_after_registration() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    runtime
        .router()
        .add_next_hop(&"calc".into(), runtime.local_address().clone(), false)
        .await?;

    let manager = runtime.request_reply().clone();
    let in_flight = tokio::spawn(async move {
        let request = Request::new("add", vec![json!(5), json!(6)], vec!["Integer".into(); 2]);
        manager
            .send_request(
                &"client".into(),
                &"calc".into(),
                request,
                Duration::from_secs(3),
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    runtime
        .request_reply()
        .register_provider(&"calc".into(), "demo/Calculator", calculator());

    let reply = in_flight.await??;
    assert_eq!(reply.values, vec![json!(11)]);

    runtime.shutdown_all().await?;
    Ok(())
}

/// One-ways queued for an unregistered provider drain oldest first once it
/// registers, each delivered exactly once.
#[tokio::test(flavor = "multi_thread")]
async fn queued_one_ways_drain_in_fifo_order() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    runtime
        .router()
        .add_next_hop(&"sink".into(), runtime.local_address().clone(), false)
        .await?;

    for label in ["first", "second"] {
        let request = OneWayRequest::new("notify", vec![json!(label)], vec!["String".into()]);
        runtime
            .request_reply()
            .send_one_way_request(
                &"client".into(),
                &["sink".into()],
                request,
                Duration::from_secs(5),
            )
            .await?;
    }
    tokio::time::sleep(Duration::from_millis(150)).await;

    let (called_tx, mut called_rx) = tokio::sync::mpsc::unbounded_channel();
    let provider = Arc::new(DispatchTable::new().on("notify", move |params| {
        let called_tx = called_tx.clone();
        async move {
            let _ = called_tx.send(params);
            Ok(vec![])
        }
    }));
    runtime
        .request_reply()
        .register_provider(&"sink".into(), "demo/Sink", provider);

    let first = timeout(Duration::from_secs(2), called_rx.recv())
        .await?
        .expect("first queued one-way was not delivered");
    let second = timeout(Duration::from_secs(2), called_rx.recv())
        .await?
        .expect("second queued one-way was not delivered");
    assert_eq!(first, vec![json!("first")]);
    assert_eq!(second, vec![json!("second")]);
    assert!(called_rx.try_recv().is_err());

    runtime.shutdown_all().await?;
    Ok(())
}

/// One-ways racing the provider registration are each delivered exactly
/// once, whether they catch the provider directly or go through the queue.
#[tokio::test(flavor = "multi_thread")]
async fn one_ways_racing_registration_are_delivered_exactly_once() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    runtime
        .router()
        .add_next_hop(&"sink".into(), runtime.local_address().clone(), false)
        .await?;

    let mut senders = Vec::new();
    for n in 0..20 {
        let manager = runtime.request_reply().clone();
        senders.push(tokio::spawn(async move {
            let request = OneWayRequest::new("notify", vec![json!(n)], vec!["Integer".into()]);
            manager
                .send_one_way_request(
                    &"client".into(),
                    &["sink".into()],
                    request,
                    Duration::from_secs(5),
                )
                .await
        }));
    }

    let (called_tx, mut called_rx) = tokio::sync::mpsc::unbounded_channel();
    let provider = Arc::new(DispatchTable::new().on("notify", move |params| {
        let called_tx = called_tx.clone();
        async move {
            let _ = called_tx.send(params);
            Ok(vec![])
        }
    }));
    runtime
        .request_reply()
        .register_provider(&"sink".into(), "demo/Sink", provider);

    for sender in senders {
        sender.await??;
    }

    let mut delivered = Vec::new();
    for _ in 0..20 {
        let params = timeout(Duration::from_secs(2), called_rx.recv())
            .await?
            .expect("a racing one-way was dropped");
        delivered.push(params[0].as_i64().expect("integer parameter"));
    }
    delivered.sort_unstable();
    delivered.dedup();
    assert_eq!(delivered.len(), 20);
    // Settle, then confirm nothing was delivered twice.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(called_rx.try_recv().is_err());

    runtime.shutdown_all().await?;
    Ok(())
}

/// A request that expires while queued is never handed to the provider; a
/// fresh request sent after registration still gets its reply.
#[tokio::test(flavor = "multi_thread")]
async fn expired_queued_request_is_skipped_on_drain() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    runtime
        .router()
        .add_next_hop(&"calc".into(), runtime.local_address().clone(), false)
        .await?;

    let request = Request::new("add", vec![json!(1)], vec!["Integer".into()]);
    let err = runtime
        .request_reply()
        .send_request(
            &"client".into(),
            &"calc".into(),
            request,
            Duration::from_millis(150),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::RequestTimeout { .. }));
    // Let the queued copy expire before the provider shows up.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let invocations = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = invocations.clone();
    let provider = Arc::new(DispatchTable::new().on("add", move |params| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        async move {
            let sum: i64 = params.iter().filter_map(|v| v.as_i64()).sum();
            Ok(vec![json!(sum)])
        }
    }));
    runtime
        .request_reply()
        .register_provider(&"calc".into(), "demo/Calculator", provider);

    let fresh = Request::new("add", vec![json!(20), json!(22)], vec!["Integer".into(); 2]);
    let reply = runtime
        .request_reply()
        .send_request(
            &"client".into(),
            &"calc".into(),
            fresh,
            Duration::from_secs(2),
        )
        .await?;
    assert_eq!(reply.values, vec![json!(42)]);
    assert_eq!(invocations.load(std::sync::atomic::Ordering::SeqCst), 1);

    runtime.shutdown_all().await?;
    Ok(())
}

/// A one-way request invokes the provider without producing a reply.
#[tokio::test(flavor = "multi_thread")]
async fn one_way_request_invokes_provider() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    let (called_tx, mut called_rx) = tokio::sync::mpsc::unbounded_channel();

    let provider = Arc::new(DispatchTable::new().on("notify", move |params| {
        let called_tx = called_tx.clone();
        async move {
            let _ = called_tx.send(params);
            Ok(vec![])
        }
    }));
    runtime
        .router()
        .add_next_hop(&"sink".into(), runtime.local_address().clone(), false)
        .await?;
    runtime
        .request_reply()
        .register_provider(&"sink".into(), "demo/Sink", provider);

    let request = OneWayRequest::new("notify", vec![json!("ping")], vec!["String".into()]);
    runtime
        .request_reply()
        .send_one_way_request(
            &"client".into(),
            &["sink".into()],
            request,
            Duration::from_secs(2),
        )
        .await?;

    let params = timeout(Duration::from_secs(2), called_rx.recv())
        .await?
        .expect("provider was not invoked");
    assert_eq!(params, vec![json!("ping")]);

    runtime.shutdown_all().await?;
    Ok(())
}

/// Shutdown rejects new requests instead of letting them hang.
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_rejects_new_requests() -> anyhow::Result<()> {
    initialize_tracing();
    let runtime = SwitchyardApp::launch_with_config(SwitchyardConfig::default());
    runtime.shutdown_all().await?;

    let request = Request::new("add", vec![], vec![]);
    let err = runtime
        .request_reply()
        .send_request(
            &"client".into(),
            &"calc".into(),
            request,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::Shutdown));
    Ok(())
}

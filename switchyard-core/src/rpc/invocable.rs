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

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;

use crate::message::RoutingError;

/// The invocation seam between the request/reply manager and provider code.
///
/// A provider is anything that can turn a method name and parameter list into
/// output values; the manager never interprets either.
#[async_trait]
pub trait Invocable: Send + Sync {
    async fn invoke(&self, method_name: &str, params: &[Value]) -> Result<Vec<Value>, RoutingError>;
}

/// Future type returned by registered method handlers.
type MethodFuture = Pin<Box<dyn Future<Output = Result<Vec<Value>, RoutingError>> + Send>>;

/// Type-erased method handler stored in the dispatch table.
type MethodHandler = Box<dyn Fn(Vec<Value>) -> MethodFuture + Send + Sync>;

/// A method-name-keyed [`Invocable`] built from async closures.
///
/// ```ignore
/// let provider = DispatchTable::new()
///     .on("add", |params| async move { /* ... */ Ok(vec![]) });
/// ```
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<String, MethodHandler>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a method name, replacing any previous one.
    pub fn on<F, Fut>(mut self, method_name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Value>, RoutingError>> + Send + 'static,
    {
        self.handlers.insert(
            method_name.into(),
            Box::new(move |params| Box::pin(handler(params))),
        );
        self
    }
}

#[async_trait]
impl Invocable for DispatchTable {
    async fn invoke(&self, method_name: &str, params: &[Value]) -> Result<Vec<Value>, RoutingError> {
        match self.handlers.get(method_name) {
            Some(handler) => handler(params.to_vec()).await,
            None => Err(RoutingError::Invocation(anyhow!(
                "no such method: {method_name}"
            ))),
        }
    }
}

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

use derive_new::new;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::message::ExpiryDate;

/// An RPC request: method name, parameter values, and their type descriptors.
///
/// The `request_reply_id` correlation key is generated by the caller and
/// echoed by the callee's [`Reply`]; requests awaiting a reply are tracked
/// only by this id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub request_reply_id: String,
    pub method_name: String,
    pub params: Vec<Value>,
    pub param_datatypes: Vec<String>,
}

impl Request {
    pub fn new(
        method_name: impl Into<String>,
        params: Vec<Value>,
        param_datatypes: Vec<String>,
    ) -> Self {
        Request {
            request_reply_id: Uuid::new_v4().to_string(),
            method_name: method_name.into(),
            params,
            param_datatypes,
        }
    }
}

/// A fire-and-forget invocation; no correlation id, no reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneWayRequest {
    pub method_name: String,
    pub params: Vec<Value>,
    pub param_datatypes: Vec<String>,
}

impl OneWayRequest {
    pub fn new(
        method_name: impl Into<String>,
        params: Vec<Value>,
        param_datatypes: Vec<String>,
    ) -> Self {
        OneWayRequest {
            method_name: method_name.into(),
            params,
            param_datatypes,
        }
    }
}

/// The reply correlated to a [`Request`] by its `request_reply_id`.
///
/// Carries either output values or a remote-reported error string; the
/// request/reply manager converts the latter into an invocation error for
/// the blocked caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub request_reply_id: String,
    pub values: Vec<Value>,
    pub error: Option<String>,
}

impl Reply {
    pub fn success(request_reply_id: String, values: Vec<Value>) -> Self {
        Reply {
            request_reply_id,
            values,
            error: None,
        }
    }

    pub fn failure(request_reply_id: String, error: impl Into<String>) -> Self {
        Reply {
            request_reply_id,
            values: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Pairs a queued item with its expiry, for the not-yet-registered-provider
/// queues: expiry while queued must never invoke the provider.
#[derive(new, Debug, Clone)]
pub struct ContentWithExpiry<T> {
    pub content: T,
    pub expiry: ExpiryDate,
}

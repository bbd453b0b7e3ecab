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

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tracing::trace;

use crate::message::{ExpiryDate, Reply};
use crate::rpc::Invocable;

/// Observes additions to and removals from a [`Directory`].
///
/// Called after the entry is visible (or gone), so a listener reacting to
/// `entry_added` can already look the entry up.
pub trait DirectoryListener<V>: Send + Sync {
    fn entry_added(&self, id: &str, value: &V);
    fn entry_removed(&self, id: &str);
}

/// A concurrent id-keyed directory with change notification.
///
/// Backs both the reply-caller directory (keyed by request-reply id) and the
/// provider directory (keyed by participant id).
pub struct Directory<V> {
    entries: DashMap<String, V>,
    listeners: RwLock<Vec<Arc<dyn DirectoryListener<V>>>>,
}

impl<V> Default for Directory<V> {
    fn default() -> Self {
        Directory {
            entries: DashMap::new(),
            listeners: RwLock::new(Vec::new()),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Directory<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn DirectoryListener<V>>) {
        self.listeners.write().push(listener);
    }

    /// Inserts (or replaces) an entry and notifies listeners afterwards.
    pub fn add(&self, id: impl Into<String>, value: V) {
        let id = id.into();
        self.entries.insert(id.clone(), value.clone());
        trace!(id = %id, "directory entry added");
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.entry_added(&id, &value);
        }
    }

    pub fn get(&self, id: &str) -> Option<V> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<V> {
        let removed = self.entries.remove(id).map(|(_, value)| value);
        if removed.is_some() {
            trace!(id = %id, "directory entry removed");
            let listeners = self.listeners.read().clone();
            for listener in listeners {
                listener.entry_removed(id);
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The waiting half of an in-flight request: resolves the blocked caller
/// exactly once when the correlated reply arrives.
///
/// Cloneable so the directory can hand out copies; the underlying oneshot
/// sender is consumed by whichever copy resolves first.
#[derive(Clone)]
pub struct ReplyCaller {
    slot: Arc<Mutex<Option<oneshot::Sender<Reply>>>>,
    expiry: ExpiryDate,
}

impl ReplyCaller {
    pub fn new(sender: oneshot::Sender<Reply>, expiry: ExpiryDate) -> Self {
        ReplyCaller {
            slot: Arc::new(Mutex::new(Some(sender))),
            expiry,
        }
    }

    /// Delivers the reply to the waiting caller. Returns `false` when the
    /// caller already gave up (timed out) or the reply was already delivered.
    pub fn resolve(&self, reply: Reply) -> bool {
        match self.slot.lock().take() {
            Some(sender) => sender.send(reply).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for ReplyCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyCaller")
            .field("expiry", &self.expiry)
            .field("resolved", &self.slot.lock().is_none())
            .finish()
    }
}

/// A registered provider: the interface it implements and the invocation
/// target requests are dispatched to.
#[derive(Clone)]
pub struct ProviderContainer {
    pub interface_name: String,
    pub invocable: Arc<dyn Invocable>,
}

impl ProviderContainer {
    pub fn new(interface_name: impl Into<String>, invocable: Arc<dyn Invocable>) -> Self {
        ProviderContainer {
            interface_name: interface_name.into(),
            invocable,
        }
    }
}

impl fmt::Debug for ProviderContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContainer")
            .field("interface_name", &self.interface_name)
            .finish_non_exhaustive()
    }
}

//! Control-bus service: maps bus methods onto the registry and fans
//! shortcut events out to connected clients.
//!
//! Locking strategy: the registry sits behind a short-lived sync mutex.
//! Every method call locks, mutates, and releases before any `.await`;
//! nothing inside the registry blocks.

use std::{
    result::Result as StdResult,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use hotkeyd_protocol::{
    ActionRef, AvailabilityReq, RegisterReq, SetShortcutReq, ShortcutEvent, codec,
    rpc::{Method, Notification},
};
use hotkeyd_registry::Registry;
use keyspec::KeySequence;
use mrpc::{Connection as MrpcConnection, RpcError, RpcSender, ServiceError, Value};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc::UnboundedReceiver};
use tracing::{debug, info, trace, warn};

/// IPC service handling registry operations for bus clients.
#[derive(Clone)]
pub(crate) struct RegistryService {
    registry: Arc<Mutex<Registry>>,
    /// Connected clients; they all receive shortcut events.
    clients: Arc<AsyncMutex<Vec<RpcSender>>>,
    /// When set to true, the outer server loop exits.
    shutdown: Arc<AtomicBool>,
    forwarder_running: Arc<AtomicBool>,
}

impl RegistryService {
    pub(crate) fn new(registry: Arc<Mutex<Registry>>, shutdown: Arc<AtomicBool>) -> Self {
        RegistryService {
            registry,
            clients: Arc::new(AsyncMutex::new(Vec::new())),
            shutdown,
            forwarder_running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn service_err(name: &str, message: impl Into<String>) -> RpcError {
        let message: String = message.into();
        RpcError::Service(ServiceError {
            name: name.to_string(),
            value: Value::String(message.into()),
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(params: &[Value]) -> StdResult<T, RpcError> {
        let value = params
            .first()
            .ok_or_else(|| Self::service_err("missing_params", "expected one payload"))?;
        codec::from_value(value).map_err(|e| Self::service_err("invalid_params", e.to_string()))
    }

    fn parse_keys(keys: &[String]) -> StdResult<Vec<KeySequence>, RpcError> {
        keys.iter()
            .map(|token| {
                KeySequence::parse(token)
                    .map_err(|e| Self::service_err("invalid_keys", format!("{}: {}", token, e)))
            })
            .collect()
    }

    /// Drains the registry's event mailbox into client notifications.
    /// Release events queue behind their press, so ordering is preserved.
    pub(crate) fn start_event_forwarder(&self, mut events: UnboundedReceiver<ShortcutEvent>) {
        if self.forwarder_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let service = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if service.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                service
                    .broadcast(Notification::ShortcutEvent.as_str(), &event)
                    .await;
            }
        });
    }

    async fn broadcast(&self, channel: &str, event: &ShortcutEvent) {
        let value = match codec::to_value(event) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "failed to encode shortcut event");
                return;
            }
        };
        let snapshot = { self.clients.lock().await.clone() };
        let mut survivors = Vec::with_capacity(snapshot.len());
        for client in snapshot {
            match client
                .send_notification(channel, std::slice::from_ref(&value))
                .await
            {
                Ok(()) => survivors.push(client),
                Err(e) => warn!(error = ?e, "dropping disconnected client"),
            }
        }
        *self.clients.lock().await = survivors;
    }
}

#[async_trait]
impl MrpcConnection for RegistryService {
    async fn connected(&self, client: RpcSender) -> StdResult<(), RpcError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(Self::service_err("shutting_down", "daemon is shutting down"));
        }
        debug!("client connected");
        self.clients.lock().await.push(client);
        Ok(())
    }

    async fn handle_request(
        &self,
        _client: RpcSender,
        method: &str,
        params: Vec<Value>,
    ) -> StdResult<Value, RpcError> {
        trace!(method, params = params.len(), "handling request");

        let Some(method) = Method::try_from_str(method) else {
            // "shutdown" is not part of the registry contract proper; accept
            // it as the daemon control verb.
            if method == "shutdown" {
                info!("shutdown requested");
                self.shutdown.store(true, Ordering::SeqCst);
                self.clients.lock().await.clear();
                return Ok(Value::Boolean(true));
            }
            warn!(method, "unknown method");
            return Err(Self::service_err("method_not_found", method));
        };

        match method {
            Method::DoRegister | Method::RegisterWithoutGrab => {
                let req: RegisterReq = Self::decode(&params)?;
                let session = method == Method::RegisterWithoutGrab;
                self.registry
                    .lock()
                    .client_register(
                        &req.component,
                        &req.component_friendly,
                        &req.action,
                        &req.action_friendly,
                        &req.context,
                        session,
                    )
                    .map_err(|e| Self::service_err("register_failed", e.to_string()))?;
                Ok(Value::Boolean(true))
            }

            Method::GetShortcut => {
                let req: ActionRef = Self::decode(&params)?;
                let keys = self
                    .registry
                    .lock()
                    .shortcut_keys(&req.component, &req.action)
                    .map_err(|e| Self::service_err("unknown_action", e.to_string()))?;
                Ok(Value::Array(
                    keys.into_iter().map(|k| Value::String(k.into())).collect(),
                ))
            }

            Method::SetShortcut | Method::SetForeignShortcut => {
                let req: SetShortcutReq = Self::decode(&params)?;
                let keys = Self::parse_keys(&req.keys)?;
                let foreign = method == Method::SetForeignShortcut;
                let applied = {
                    let mut registry = self.registry.lock();
                    let handle = registry
                        .find_action(&req.component, &req.action)
                        .ok_or_else(|| {
                            Self::service_err(
                                "unknown_action",
                                format!("{}/{}", req.component, req.action),
                            )
                        })?;
                    let result = if foreign {
                        registry.set_foreign_shortcut_keys(handle, keys)
                    } else {
                        registry.set_shortcut_keys(handle, keys)
                    };
                    result.map_err(|e| Self::service_err("set_failed", e.to_string()))?
                };
                if applied && foreign {
                    // Tell the owning client its binding changed under it.
                    let event = {
                        let registry = self.registry.lock();
                        registry
                            .list_components()
                            .into_iter()
                            .find(|c| c.unique_name == req.component)
                            .map(|c| ShortcutEvent {
                                component: c.unique_name,
                                object_path: c.object_path,
                                action: req.action.clone(),
                                state: hotkeyd_protocol::KeyState::Released,
                            })
                    };
                    if let Some(event) = event {
                        self.broadcast(Notification::ShortcutChanged.as_str(), &event)
                            .await;
                    }
                }
                Ok(Value::Boolean(applied))
            }

            Method::Unregister => {
                let req: ActionRef = Self::decode(&params)?;
                let removed = self
                    .registry
                    .lock()
                    .unregister_action(&req.component, &req.action)
                    .map_err(|e| Self::service_err("unregister_failed", e.to_string()))?;
                Ok(Value::Boolean(removed))
            }

            Method::ListComponents => {
                let components = self.registry.lock().list_components();
                codec::to_value(&components)
                    .map_err(|e| Self::service_err("encode_failed", e.to_string()))
            }

            Method::ListActions => {
                let req: ActionRef = Self::decode(&params)?;
                let actions = self
                    .registry
                    .lock()
                    .list_actions(&req.component)
                    .map_err(|e| Self::service_err("unknown_component", e.to_string()))?;
                Ok(Value::Array(
                    actions
                        .into_iter()
                        .map(|a| Value::String(a.into()))
                        .collect(),
                ))
            }

            Method::IsGloballyAvailable => {
                let req: AvailabilityReq = Self::decode(&params)?;
                let seq = KeySequence::parse(&req.sequence)
                    .map_err(|e| Self::service_err("invalid_keys", e.to_string()))?;
                let context = if req.context.is_empty() {
                    hotkeyd_registry::DEFAULT_CONTEXT
                } else {
                    &req.context
                };
                let available =
                    self.registry
                        .lock()
                        .is_shortcut_available(&seq, &req.component, context);
                Ok(Value::Boolean(available))
            }
        }
    }

    async fn handle_notification(
        &self,
        _client: RpcSender,
        method: &str,
        _params: Vec<Value>,
    ) -> StdResult<(), RpcError> {
        trace!(method, "notification ignored");
        Ok(())
    }
}

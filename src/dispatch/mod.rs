//! Dispatch hook for answer events
//!
//! Questions do not depend on business-logic implementations. The dialogue
//! driver registers capability-typed handlers and callbacks in a
//! `HandlerRegistry` at startup, binds them to questions by key, and the
//! engine invokes the bound callback once per recorded answer.
//!
//! Handler identity persists as opaque strings: a handler by its type key,
//! a callback as a backtick-joined `type_key`/`is_static`/`method` triple.
//! Rehydrating a key that no longer resolves degrades to "unconfigured"
//! rather than failing, so previously-bound handlers may silently vanish
//! after a code change.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{DomainError, DomainResult};
use crate::events::AnswerRecorded;

/// Delimiter of the persisted callback triple
const HANDLER_REF_DELIMITER: char = '`';

/// Capability required of answer-event handler implementations.
///
/// Only types implementing this trait can be registered, which moves the
/// capability check to registration (and compile) time.
pub trait AnswerEventHandler: Send + Sync {
    /// Stable identity of the handler type, used as its registry key
    fn type_key(&self) -> &'static str;

    /// Called once per recorded answer on the question this handler serves
    fn on_answer(&self, event: &AnswerRecorded);
}

/// Callback invoked with the event payload after each recorded answer
pub type AnswerCallback = Arc<dyn Fn(&AnswerRecorded) + Send + Sync>;

/// Persistable identity of a registered callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    /// Type key of the declaring handler
    pub type_key: String,
    /// Whether the callback is free-standing rather than bound to a handler
    pub is_static: bool,
    /// Method name within the declaring type
    pub method: String,
}

impl HandlerRef {
    /// Reference to an instance method of a registered handler type
    pub fn method(type_key: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            type_key: type_key.into(),
            is_static: false,
            method: method.into(),
        }
    }

    /// Reference to a free-standing function
    pub fn static_fn(type_key: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            type_key: type_key.into(),
            is_static: true,
            method: method.into(),
        }
    }

    /// Encode for persistence
    pub fn encode(&self) -> String {
        format!(
            "{}{d}{}{d}{}",
            self.type_key,
            self.is_static,
            self.method,
            d = HANDLER_REF_DELIMITER
        )
    }

    /// Decode a persisted reference.
    ///
    /// Lenient: anything malformed or partially populated yields `None`,
    /// never an error.
    pub fn decode(encoded: &str) -> Option<Self> {
        let parts: Vec<&str> = encoded.split(HANDLER_REF_DELIMITER).collect();
        if parts.len() != 3 {
            return None;
        }
        let is_static = parts[1].trim().parse::<bool>().ok()?;
        if parts[0].trim().is_empty() || parts[2].trim().is_empty() {
            return None;
        }
        Some(Self {
            type_key: parts[0].to_string(),
            is_static,
            method: parts[2].to_string(),
        })
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Startup-time registry mapping string keys to handlers and callbacks
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn AnswerEventHandler>>,
    callbacks: HashMap<String, AnswerCallback>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own type key
    pub fn register_handler(&mut self, handler: Arc<dyn AnswerEventHandler>) {
        self.handlers.insert(handler.type_key().to_string(), handler);
    }

    /// Register an instance method of a capability-typed handler as a
    /// callback. Returns the reference the caller may persist.
    pub fn register_method<H>(
        &mut self,
        handler: Arc<H>,
        method: &str,
        f: fn(&H, &AnswerRecorded),
    ) -> HandlerRef
    where
        H: AnswerEventHandler + 'static,
    {
        let handler_ref = HandlerRef::method(handler.type_key(), method);
        let callback: AnswerCallback = Arc::new(move |event| f(&handler, event));
        self.callbacks.insert(handler_ref.encode(), callback);
        handler_ref
    }

    /// Register a free-standing function as a callback.
    /// Returns the reference the caller may persist.
    pub fn register_static(
        &mut self,
        type_key: &str,
        method: &str,
        f: fn(&AnswerRecorded),
    ) -> HandlerRef {
        let handler_ref = HandlerRef::static_fn(type_key, method);
        self.callbacks.insert(handler_ref.encode(), Arc::new(f));
        handler_ref
    }

    /// Look up a registered handler by type key
    pub fn handler(&self, type_key: &str) -> Option<Arc<dyn AnswerEventHandler>> {
        self.handlers.get(type_key).cloned()
    }

    /// Look up a registered callback
    pub fn callback(&self, handler_ref: &HandlerRef) -> Option<AnswerCallback> {
        self.callbacks.get(&handler_ref.encode()).cloned()
    }

    /// Resolve a persisted callback key, degrading to `None` on any miss
    pub fn resolve_callback(&self, encoded: &str) -> Option<AnswerCallback> {
        let Some(handler_ref) = HandlerRef::decode(encoded) else {
            debug!("malformed callback reference `{encoded}`, treating as unconfigured");
            return None;
        };
        let callback = self.callback(&handler_ref);
        if callback.is_none() {
            debug!("callback `{encoded}` is not registered, treating as unconfigured");
        }
        callback
    }
}

/// Handler configuration of a single question.
///
/// Holds the handler descriptor the driver registered and the callback the
/// engine invokes after each recorded answer. One configuration serves
/// every answer event for its question.
#[derive(Clone, Default)]
pub struct DispatchHook {
    handler: Option<Arc<dyn AnswerEventHandler>>,
    callback: Option<AnswerCallback>,
    callback_ref: Option<HandlerRef>,
}

impl DispatchHook {
    /// An unconfigured hook
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the handler registered under `type_key`.
    ///
    /// Binding an unregistered key is a configuration error and fails
    /// loudly at assignment time.
    pub fn bind_handler(
        &mut self,
        registry: &HandlerRegistry,
        type_key: &str,
    ) -> DomainResult<()> {
        let handler = registry
            .handler(type_key)
            .ok_or_else(|| DomainError::HandlerNotRegistered(type_key.to_string()))?;
        self.handler = Some(handler);
        Ok(())
    }

    /// Bind the callback registered under `handler_ref`.
    ///
    /// Binding an unregistered reference is a configuration error and fails
    /// loudly at assignment time.
    pub fn bind_callback(
        &mut self,
        registry: &HandlerRegistry,
        handler_ref: &HandlerRef,
    ) -> DomainResult<()> {
        let callback = registry
            .callback(handler_ref)
            .ok_or_else(|| DomainError::HandlerNotRegistered(handler_ref.encode()))?;
        self.callback = Some(callback);
        self.callback_ref = Some(handler_ref.clone());
        Ok(())
    }

    /// Set an inline callback. Inline callbacks have no persistable
    /// identity and do not survive a round-trip through storage.
    pub fn set_callback(&mut self, callback: AnswerCallback) {
        self.callback = Some(callback);
        self.callback_ref = None;
    }

    /// Clear the handler descriptor
    pub fn clear_handler(&mut self) {
        self.handler = None;
    }

    /// Clear the callback
    pub fn clear_callback(&mut self) {
        self.callback = None;
        self.callback_ref = None;
    }

    /// The bound handler descriptor, if any
    pub fn handler(&self) -> Option<&Arc<dyn AnswerEventHandler>> {
        self.handler.as_ref()
    }

    /// Persistable key of the bound handler, if any
    pub fn handler_key(&self) -> Option<&'static str> {
        self.handler.as_ref().map(|h| h.type_key())
    }

    /// Persistable key of the bound callback, if it was bound by reference
    pub fn callback_key(&self) -> Option<String> {
        self.callback_ref.as_ref().map(HandlerRef::encode)
    }

    /// Whether a callback is configured
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Invoke the callback with the event payload, if one is configured
    pub fn dispatch(&self, event: &AnswerRecorded) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    /// Re-resolve persisted keys against the registry.
    ///
    /// Lenient: a key that no longer decodes or resolves leaves that side
    /// of the hook unconfigured.
    pub fn rehydrate(
        registry: &HandlerRegistry,
        handler_key: Option<&str>,
        callback_key: Option<&str>,
    ) -> Self {
        let handler = handler_key.and_then(|key| {
            let handler = registry.handler(key);
            if handler.is_none() {
                debug!("handler `{key}` is not registered, treating as unconfigured");
            }
            handler
        });
        let callback_ref =
            callback_key.and_then(HandlerRef::decode).filter(|r| {
                registry.callback(r).is_some()
            });
        let callback = callback_key.and_then(|key| registry.resolve_callback(key));
        Self {
            handler,
            callback,
            callback_ref,
        }
    }
}

impl fmt::Debug for DispatchHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHook")
            .field("handler", &self.handler_key())
            .field("callback", &self.callback_key())
            .field("has_callback", &self.has_callback())
            .finish()
    }
}

//! # Dispatch Module
//!
//! Handler registration and application wiring.
//!
//! The transport owns event delivery and calls each registered handler
//! synchronously, one at a time. [`Bridge::install`] registers the discovery
//! button and one handler per [`EventKind`]; [`EventDispatcher`] is an
//! in-process [`EventSource`] used for replay and tests.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::actuator::Actuator;
use crate::controller::events::{ControllerEvent, EventKind};
use crate::controller::mapper::InputMapper;
use crate::diagnostics::DiagnosticSink;
use crate::discovery::toggle::{ButtonEdgeConfig, ButtonInput, DiscoveryToggle};
use crate::discovery::{DiscoveryBackend, DiscoveryController};
use crate::lifecycle::{LifecycleLogger, PairedLedPolicy};
use crate::link::ControllerLink;

/// Handler invoked for each event of the kind it was registered for.
pub type EventHandler = Box<dyn Fn(&ControllerEvent) + Send + Sync>;

/// Something that delivers controller events to registered handlers.
pub trait EventSource {
    fn register_handler(&mut self, kind: EventKind, handler: EventHandler);
}

/// Synchronous, in-process event source.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every handler registered for the event's kind, in registration
    /// order. Returns how many handlers ran.
    pub fn dispatch(&self, event: &ControllerEvent) -> usize {
        let kind = event.kind();
        let Some(handlers) = self.handlers.get(&kind) else {
            debug!("No handler for {:?}", kind);
            return 0;
        };
        for handler in handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl EventSource for EventDispatcher {
    fn register_handler(&mut self, kind: EventKind, handler: EventHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self.handlers.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventDispatcher")
            .field("handlers", &counts)
            .finish()
    }
}

/// External collaborators the bridge drives.
#[derive(Clone)]
pub struct Collaborators {
    pub actuator: Arc<dyn Actuator>,
    pub link: Arc<dyn ControllerLink>,
    pub discovery: Arc<dyn DiscoveryBackend>,
    pub sink: Arc<dyn DiagnosticSink>,
}

/// The complete reaction layer: input mapping, lifecycle logging and the
/// discovery button.
#[derive(Debug, Clone)]
pub struct Bridge {
    mapper: InputMapper,
    lifecycle: LifecycleLogger,
    toggle: DiscoveryToggle,
}

impl Bridge {
    #[must_use]
    pub fn new(collaborators: Collaborators, paired_led: PairedLedPolicy) -> Self {
        let Collaborators {
            actuator,
            link,
            discovery,
            sink,
        } = collaborators;
        Self {
            mapper: InputMapper::new(actuator.clone(), link, sink.clone()),
            lifecycle: LifecycleLogger::new(actuator, sink.clone(), paired_led),
            toggle: DiscoveryToggle::new(DiscoveryController::new(discovery), sink),
        }
    }

    /// Registers the discovery button and all event handlers.
    pub fn install<S, B>(&self, source: &mut S, buttons: &mut B, button: ButtonEdgeConfig)
    where
        S: EventSource + ?Sized,
        B: ButtonInput + ?Sized,
    {
        debug!(
            "Registering discovery button on pin {} ({:?}, {:?}, {} ms)",
            button.pin, button.pull, button.edge, button.debounce_ms
        );
        buttons.register_button_edge(button, self.toggle.clone().into_callback());

        let lifecycle = self.lifecycle.clone();
        source.register_handler(
            EventKind::Connection,
            Box::new(move |event| {
                if let ControllerEvent::Connection(e) = event {
                    lifecycle.on_connection(e);
                }
            }),
        );

        let mapper = self.mapper.clone();
        source.register_handler(
            EventKind::Input,
            Box::new(move |event| {
                if let ControllerEvent::Input(e) = event {
                    mapper.handle(e);
                }
            }),
        );

        let lifecycle = self.lifecycle.clone();
        source.register_handler(
            EventKind::Paired,
            Box::new(move |event| {
                if let ControllerEvent::Paired(e) = event {
                    lifecycle.on_paired(e);
                }
            }),
        );

        let lifecycle = self.lifecycle.clone();
        source.register_handler(
            EventKind::DiscoveryStarted,
            Box::new(move |_| lifecycle.on_discovery_started()),
        );

        let lifecycle = self.lifecycle.clone();
        source.register_handler(
            EventKind::DiscoveryStopped,
            Box::new(move |_| lifecycle.on_discovery_stopped()),
        );
    }
}

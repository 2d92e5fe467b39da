//! # Discovery Button Module
//!
//! A single physical button toggles discovery on and off.
//!
//! The button callback may run in interrupt context, so [`DiscoveryToggle::on_press`]
//! does a bounded amount of work: one state query, one diagnostic, one
//! command. It does not wait for the transport to confirm the transition, so
//! a press that lands while a previous transition is still in flight may act
//! on stale state.

use std::sync::Arc;

use super::DiscoveryController;
use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// Debounce applied to the discovery button, in milliseconds.
pub const BUTTON_DEBOUNCE_MS: u32 = 20;

/// Internal pull resistor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

/// Edge that triggers the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// GPIO configuration for the discovery button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdgeConfig {
    pub pin: u32,
    pub pull: Pull,
    pub edge: Edge,
    pub debounce_ms: u32,
}

impl ButtonEdgeConfig {
    /// Derives pull and edge from the button wiring.
    ///
    /// A pulled-up button reads low while pressed, so it fires on the falling
    /// edge; a pulled-down one fires on the rising edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds4_bridge::discovery::toggle::{ButtonEdgeConfig, Edge, Pull};
    ///
    /// let cfg = ButtonEdgeConfig::for_wiring(0, true);
    /// assert_eq!((cfg.pull, cfg.edge), (Pull::Up, Edge::Falling));
    /// assert_eq!(cfg.debounce_ms, 20);
    /// ```
    #[must_use]
    pub fn for_wiring(pin: u32, pull_up: bool) -> Self {
        let (pull, edge) = if pull_up {
            (Pull::Up, Edge::Falling)
        } else {
            (Pull::Down, Edge::Rising)
        };
        Self {
            pin,
            pull,
            edge,
            debounce_ms: BUTTON_DEBOUNCE_MS,
        }
    }
}

/// Callback invoked with the pin number on each debounced edge.
pub type ButtonCallback = Box<dyn Fn(u32) + Send + Sync>;

/// GPIO subsystem that delivers debounced button edges.
pub trait ButtonInput {
    fn register_button_edge(&mut self, config: ButtonEdgeConfig, callback: ButtonCallback);
}

/// What a button press requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Started,
    Cancelled,
}

/// Flips discovery on each button press.
#[derive(Clone)]
pub struct DiscoveryToggle {
    discovery: DiscoveryController,
    sink: Arc<dyn DiagnosticSink>,
}

impl DiscoveryToggle {
    #[must_use]
    pub fn new(discovery: DiscoveryController, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { discovery, sink }
    }

    /// Handles one debounced press.
    pub fn on_press(&self) -> ToggleAction {
        if self.discovery.is_discovering() {
            self.sink.emit(Diagnostic::ScanCancel);
            self.discovery.cancel_discovery();
            ToggleAction::Cancelled
        } else {
            self.sink.emit(Diagnostic::ScanStart);
            self.discovery.begin_discovery();
            ToggleAction::Started
        }
    }

    /// Wraps this toggle as a GPIO callback.
    #[must_use]
    pub fn into_callback(self) -> ButtonCallback {
        Box::new(move |_pin| {
            self.on_press();
        })
    }
}

impl std::fmt::Debug for DiscoveryToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryToggle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MockDiagnosticSink;
    use crate::discovery::MockDiscoveryBackend;
    use crate::link::mocks::{Call, Journal};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn journal_toggle(journal: &Arc<Journal>) -> DiscoveryToggle {
        DiscoveryToggle::new(DiscoveryController::new(journal.clone()), journal.clone())
    }

    #[test]
    fn test_wiring_pull_up() {
        let cfg = ButtonEdgeConfig::for_wiring(17, true);
        assert_eq!(
            cfg,
            ButtonEdgeConfig {
                pin: 17,
                pull: Pull::Up,
                edge: Edge::Falling,
                debounce_ms: BUTTON_DEBOUNCE_MS,
            }
        );
    }

    #[test]
    fn test_wiring_pull_down() {
        let cfg = ButtonEdgeConfig::for_wiring(4, false);
        assert_eq!(cfg.pull, Pull::Down);
        assert_eq!(cfg.edge, Edge::Rising);
        assert_eq!(cfg.debounce_ms, 20);
    }

    #[test]
    fn test_press_while_idle_starts() {
        let mut seq = Sequence::new();
        let mut backend = MockDiscoveryBackend::new();
        let mut sink = MockDiagnosticSink::new();

        backend
            .expect_is_discovering()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);
        sink.expect_emit()
            .with(eq(Diagnostic::ScanStart))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend
            .expect_begin_discovery()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend.expect_cancel_discovery().never();

        let toggle = DiscoveryToggle::new(
            DiscoveryController::new(Arc::new(backend)),
            Arc::new(sink),
        );
        assert_eq!(toggle.on_press(), ToggleAction::Started);
    }

    #[test]
    fn test_press_while_discovering_cancels() {
        let mut backend = MockDiscoveryBackend::new();
        let mut sink = MockDiagnosticSink::new();

        backend.expect_is_discovering().times(1).return_const(true);
        backend.expect_cancel_discovery().times(1).return_const(());
        backend.expect_begin_discovery().never();
        sink.expect_emit()
            .with(eq(Diagnostic::ScanCancel))
            .times(1)
            .return_const(());

        let toggle = DiscoveryToggle::new(
            DiscoveryController::new(Arc::new(backend)),
            Arc::new(sink),
        );
        assert_eq!(toggle.on_press(), ToggleAction::Cancelled);
    }

    #[test]
    fn test_presses_alternate() {
        let journal = Arc::new(Journal::new());
        let toggle = journal_toggle(&journal);

        let actions: Vec<_> = (0..4).map(|_| toggle.on_press()).collect();
        assert_eq!(
            actions,
            vec![
                ToggleAction::Started,
                ToggleAction::Cancelled,
                ToggleAction::Started,
                ToggleAction::Cancelled,
            ]
        );

        let commands: Vec<_> = journal
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::BeginDiscovery | Call::CancelDiscovery))
            .collect();
        assert_eq!(
            commands,
            vec![
                Call::BeginDiscovery,
                Call::CancelDiscovery,
                Call::BeginDiscovery,
                Call::CancelDiscovery,
            ]
        );
    }

    #[test]
    fn test_press_acts_on_reported_state() {
        // Transport flipped to discovering on its own; the press cancels.
        let journal = Arc::new(Journal::new());
        journal.set_discovering(true);
        let toggle = journal_toggle(&journal);

        assert_eq!(toggle.on_press(), ToggleAction::Cancelled);
        assert_eq!(journal.diagnostics(), vec![Diagnostic::ScanCancel]);
    }

    #[test]
    fn test_callback_ignores_pin_number() {
        let journal = Arc::new(Journal::new());
        let callback = journal_toggle(&journal).into_callback();

        callback(5);
        callback(99);
        assert_eq!(
            journal.diagnostics(),
            vec![Diagnostic::ScanStart, Diagnostic::ScanCancel]
        );
    }
}

//! # Replay Module
//!
//! Drives the bridge from a JSON Lines script instead of a live Bluetooth
//! stack.
//!
//! ## Script Format
//!
//! One step per line; blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"event": {"kind": "connection", "slot": 0, "address": "1c:a0:b8:00:11:22", "connected": true}}
//! {"event": {"kind": "input", "slot": 0, "buttons_down": ["share"], "state": {"battery": {"capacity": 73}}}}
//! "button_press"
//! {"sleep_ms": 500}
//! ```
//!
//! [`SimulatedLink`] stands in for the transport: it keeps a bounded table of
//! connected slots, answers disconnect requests and flips its discovery flag
//! synchronously. Events it produces (a disconnect, discovery start/stop) are
//! queued and delivered after the step that caused them, so no handler is
//! reentered.

use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::actuator::Actuator;
use crate::config::Config;
use crate::controller::events::{ConnectionEvent, ControllerEvent};
use crate::controller::state::{ControllerSlot, MAX_SLOTS};
use crate::diagnostics::DiagnosticSink;
use crate::discovery::toggle::{ButtonCallback, ButtonEdgeConfig, ButtonInput};
use crate::discovery::DiscoveryBackend;
use crate::dispatch::{Bridge, Collaborators, EventDispatcher};
use crate::error::{Ds4BridgeError, Result};
use crate::lifecycle::PairedLedPolicy;
use crate::link::ControllerLink;

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Deliver a controller event.
    Event(ControllerEvent),
    /// One debounced press of the discovery button.
    ButtonPress,
    /// Pause the replay.
    SleepMs(u64),
}

/// Parses one script line. Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns `Script` with the 1-based line number if the line is not a valid
/// step.
///
/// # Examples
///
/// ```
/// use ds4_bridge::replay::{parse_step, ScriptStep};
///
/// assert_eq!(parse_step(1, r#""button_press""#)?, Some(ScriptStep::ButtonPress));
/// assert_eq!(parse_step(2, "# comment")?, None);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_step(line_number: usize, line: &str) -> Result<Option<ScriptStep>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| Ds4BridgeError::Script {
            line: line_number,
            source,
        })
}

#[derive(Debug, Clone)]
struct Session {
    address: String,
}

/// In-memory stand-in for the controller transport.
#[derive(Debug)]
pub struct SimulatedLink {
    sessions: Mutex<[Option<Session>; MAX_SLOTS as usize]>,
    discovering: AtomicBool,
    pending: Mutex<VecDeque<ControllerEvent>>,
}

impl Default for SimulatedLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Default::default()),
            discovering: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Updates the session table from an event about to be dispatched.
    pub fn observe(&self, event: &ControllerEvent) {
        if let ControllerEvent::Connection(connection) = event {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = &mut sessions[usize::from(connection.slot.index())];
            *entry = connection.connected.then(|| Session {
                address: connection.address.clone(),
            });
        }
    }

    /// Whether `slot` currently has a session.
    #[must_use]
    pub fn is_connected(&self, slot: ControllerSlot) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)[usize::from(slot.index())]
        .is_some()
    }

    /// Removes and returns events produced since the last call.
    pub fn take_pending(&self) -> Vec<ControllerEvent> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    fn queue(&self, event: ControllerEvent) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
    }
}

impl ControllerLink for SimulatedLink {
    fn disconnect(&self, slot: ControllerSlot) -> bool {
        let session = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)[usize::from(slot.index())]
        .take();
        match session {
            Some(session) => {
                self.queue(ControllerEvent::Connection(ConnectionEvent {
                    slot,
                    address: session.address,
                    connected: false,
                }));
                true
            }
            None => false,
        }
    }
}

impl DiscoveryBackend for SimulatedLink {
    fn is_discovering(&self) -> bool {
        self.discovering.load(Ordering::SeqCst)
    }

    fn begin_discovery(&self) {
        if !self.discovering.swap(true, Ordering::SeqCst) {
            self.queue(ControllerEvent::DiscoveryStarted);
        }
    }

    fn cancel_discovery(&self) {
        if self.discovering.swap(false, Ordering::SeqCst) {
            self.queue(ControllerEvent::DiscoveryStopped);
        }
    }
}

/// Button subsystem that fires its callbacks on request.
#[derive(Default)]
pub struct SimulatedButtons {
    registered: Vec<(ButtonEdgeConfig, ButtonCallback)>,
}

impl SimulatedButtons {
    /// Fires every registered callback once.
    pub fn press(&self) {
        for (config, callback) in &self.registered {
            callback(config.pin);
        }
    }
}

impl ButtonInput for SimulatedButtons {
    fn register_button_edge(&mut self, config: ButtonEdgeConfig, callback: ButtonCallback) {
        self.registered.push((config, callback));
    }
}

/// Counters reported at the end of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub steps: usize,
    pub skipped: usize,
    pub events: usize,
}

/// Script-driven harness around an installed [`Bridge`].
pub struct Replay {
    dispatcher: EventDispatcher,
    buttons: SimulatedButtons,
    link: Arc<SimulatedLink>,
    step_delay: Duration,
}

impl Replay {
    /// Builds a replay whose actuator and diagnostics go to the given sinks.
    #[must_use]
    pub fn new(
        actuator: Arc<dyn Actuator>,
        sink: Arc<dyn DiagnosticSink>,
        paired_led: PairedLedPolicy,
        button: ButtonEdgeConfig,
        step_delay: Duration,
    ) -> Self {
        let link = Arc::new(SimulatedLink::new());
        let bridge = Bridge::new(
            Collaborators {
                actuator,
                link: link.clone(),
                discovery: link.clone(),
                sink,
            },
            paired_led,
        );

        let mut dispatcher = EventDispatcher::new();
        let mut buttons = SimulatedButtons::default();
        bridge.install(&mut dispatcher, &mut buttons, button);

        Self {
            dispatcher,
            buttons,
            link,
            step_delay,
        }
    }

    /// Builds a replay from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSlot` if the pairing LED slot is out of range.
    pub fn from_config(
        config: &Config,
        actuator: Arc<dyn Actuator>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        Ok(Self::new(
            actuator,
            sink,
            config.paired_led_policy()?,
            config.button_edge(),
            Duration::from_millis(config.replay.step_delay_ms),
        ))
    }

    /// The simulated transport.
    #[must_use]
    pub fn link(&self) -> &SimulatedLink {
        &self.link
    }

    /// Executes one step, then delivers any events it caused.
    ///
    /// Returns the number of events dispatched.
    pub async fn apply(&self, step: ScriptStep) -> usize {
        let mut events = 0;
        match step {
            ScriptStep::Event(event) => events += self.deliver(&event),
            ScriptStep::ButtonPress => self.buttons.press(),
            ScriptStep::SleepMs(ms) => sleep(Duration::from_millis(ms)).await,
        }
        loop {
            let pending = self.link.take_pending();
            if pending.is_empty() {
                break;
            }
            for event in &pending {
                events += self.deliver(event);
            }
        }
        events
    }

    fn deliver(&self, event: &ControllerEvent) -> usize {
        self.link.observe(event);
        let handled = self.dispatcher.dispatch(event);
        debug!("Dispatched {:?} to {} handler(s)", event.kind(), handled);
        1
    }

    /// Reads the script to the end, executing each step.
    ///
    /// Invalid lines are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `Io` if reading the script fails.
    pub async fn run<R>(&self, reader: R) -> Result<ReplayStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = ReplayStats::default();
        let mut lines = reader.lines();
        let mut line_number = 0;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            let step = match parse_step(line_number, &line) {
                Ok(Some(step)) => step,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping {}", e);
                    stats.skipped += 1;
                    continue;
                }
            };

            if stats.steps > 0 && !self.step_delay.is_zero() {
                sleep(self.step_delay).await;
            }
            stats.events += self.apply(step).await;
            stats.steps += 1;
        }

        info!(
            "Replay finished: {} steps, {} events, {} skipped",
            stats.steps, stats.events, stats.skipped
        );
        Ok(stats)
    }
}

impl std::fmt::Debug for Replay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replay")
            .field("dispatcher", &self.dispatcher)
            .field("link", &self.link)
            .field("step_delay", &self.step_delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::LedColor;
    use crate::controller::state::Button;
    use crate::diagnostics::Diagnostic;
    use crate::link::mocks::{Call, Journal};

    fn slot(n: u8) -> ControllerSlot {
        ControllerSlot::new(n).unwrap()
    }

    fn replay(journal: &Arc<Journal>) -> Replay {
        Replay::new(
            journal.clone(),
            journal.clone(),
            PairedLedPolicy::default(),
            ButtonEdgeConfig::for_wiring(0, true),
            Duration::ZERO,
        )
    }

    // ==================== Script Parsing Tests ====================

    #[test]
    fn test_parse_blank_and_comment() {
        assert_eq!(parse_step(1, "").unwrap(), None);
        assert_eq!(parse_step(1, "   ").unwrap(), None);
        assert_eq!(parse_step(1, "# hello").unwrap(), None);
    }

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            parse_step(1, r#"{"sleep_ms": 25}"#).unwrap(),
            Some(ScriptStep::SleepMs(25))
        );
        assert_eq!(
            parse_step(1, r#""button_press""#).unwrap(),
            Some(ScriptStep::ButtonPress)
        );
        assert_eq!(
            parse_step(1, r#"{"event": {"kind": "discovery_started"}}"#).unwrap(),
            Some(ScriptStep::Event(ControllerEvent::DiscoveryStarted))
        );
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let err = parse_step(7, "{not json").unwrap_err();
        assert!(matches!(err, Ds4BridgeError::Script { line: 7, .. }));
        assert!(err.to_string().contains("line 7"));
    }

    // ==================== Simulated Link Tests ====================

    #[test]
    fn test_link_tracks_sessions() {
        let link = SimulatedLink::new();
        assert!(!link.is_connected(slot(1)));

        link.observe(&ControllerEvent::Connection(ConnectionEvent {
            slot: slot(1),
            address: "aa".to_string(),
            connected: true,
        }));
        assert!(link.is_connected(slot(1)));
        assert!(!link.is_connected(slot(0)));

        link.observe(&ControllerEvent::Connection(ConnectionEvent {
            slot: slot(1),
            address: "aa".to_string(),
            connected: false,
        }));
        assert!(!link.is_connected(slot(1)));
    }

    #[test]
    fn test_link_disconnect() {
        let link = SimulatedLink::new();
        assert!(!link.disconnect(slot(2)));
        assert!(link.take_pending().is_empty());

        link.observe(&ControllerEvent::Connection(ConnectionEvent {
            slot: slot(2),
            address: "cc".to_string(),
            connected: true,
        }));
        assert!(link.disconnect(slot(2)));
        assert!(!link.is_connected(slot(2)));
        assert_eq!(
            link.take_pending(),
            vec![ControllerEvent::Connection(ConnectionEvent {
                slot: slot(2),
                address: "cc".to_string(),
                connected: false,
            })]
        );
        assert!(!link.disconnect(slot(2)));
    }

    #[test]
    fn test_link_discovery_is_idempotent() {
        let link = SimulatedLink::new();
        link.cancel_discovery();
        assert!(link.take_pending().is_empty());

        link.begin_discovery();
        link.begin_discovery();
        assert!(link.is_discovering());
        assert_eq!(link.take_pending(), vec![ControllerEvent::DiscoveryStarted]);

        link.cancel_discovery();
        assert!(!link.is_discovering());
        assert_eq!(link.take_pending(), vec![ControllerEvent::DiscoveryStopped]);
    }

    // ==================== Replay Tests ====================

    #[tokio::test]
    async fn test_button_press_round_trip() {
        let journal = Arc::new(Journal::new());
        let replay = replay(&journal);

        assert_eq!(replay.apply(ScriptStep::ButtonPress).await, 1);
        assert!(replay.link().is_discovering());
        assert_eq!(replay.apply(ScriptStep::ButtonPress).await, 1);
        assert!(!replay.link().is_discovering());

        assert_eq!(
            journal.diagnostics(),
            vec![
                Diagnostic::ScanStart,
                Diagnostic::DiscoveryStarted,
                Diagnostic::ScanCancel,
                Diagnostic::DiscoveryStopped,
            ]
        );
    }

    #[tokio::test]
    async fn test_ps_press_disconnects_connected_slot() {
        let journal = Arc::new(Journal::new());
        let replay = replay(&journal);

        let script = concat!(
            r#"{"event": {"kind": "connection", "slot": 1, "address": "aa", "connected": true}}"#,
            "\n",
            r#"{"event": {"kind": "input", "slot": 1, "buttons_down": ["ps"]}}"#,
            "\n",
            r#"{"event": {"kind": "input", "slot": 1, "buttons_down": ["ps"]}}"#,
            "\n",
        );
        let stats = replay.run(script.as_bytes()).await.unwrap();
        assert_eq!(
            stats,
            ReplayStats {
                steps: 3,
                skipped: 0,
                events: 4,
            }
        );

        assert_eq!(
            journal.calls(),
            vec![
                Call::Diagnostic(Diagnostic::Connection {
                    slot: slot(1),
                    address: "aa".to_string(),
                    connected: true,
                }),
                Call::Led(slot(1), LedColor::OFF),
                Call::Diagnostic(Diagnostic::Disconnect {
                    slot: slot(1),
                    success: true,
                }),
                Call::Diagnostic(Diagnostic::Connection {
                    slot: slot(1),
                    address: "aa".to_string(),
                    connected: false,
                }),
                Call::Led(slot(1), LedColor::OFF),
                Call::Diagnostic(Diagnostic::Disconnect {
                    slot: slot(1),
                    success: false,
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_skips_bad_lines() {
        let journal = Arc::new(Journal::new());
        let replay = replay(&journal);

        let script = "# demo\n\n{oops}\n{\"event\": {\"kind\": \"input\", \"slot\": 9}}\n\"button_press\"\n";
        let stats = replay.run(script.as_bytes()).await.unwrap();
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.events, 1);
    }

    #[tokio::test]
    async fn test_battery_report_from_script() {
        let journal = Arc::new(Journal::new());
        let replay = replay(&journal);

        let line = r#"{"event": {"kind": "input", "slot": 0, "buttons_down": ["share"], "state": {"battery": {"capacity": 73, "status": "discharging"}}}}"#;
        replay.run(line.as_bytes()).await.unwrap();

        let diagnostics = journal.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        let text = diagnostics[0].to_string();
        assert!(text.contains("73"));
        assert!(text.contains("discharging"));
    }

    #[tokio::test]
    async fn test_bundled_demo_script() {
        let journal = Arc::new(Journal::new());
        let replay = replay(&journal);

        let script = include_str!("../demos/session.jsonl");
        let stats = replay.run(script.as_bytes()).await.unwrap();
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.steps, 14);
        assert!(!replay.link().is_connected(slot(0)));
        assert!(!replay.link().is_discovering());

        let calls = journal.calls();
        assert!(calls.contains(&Call::Led(slot(0), LedColor::GREEN)));
        assert!(calls.contains(&Call::Rumble(slot(0), 255, 40)));
        assert_eq!(
            journal.diagnostics().last(),
            Some(&Diagnostic::Connection {
                slot: slot(0),
                address: "1c:a0:b8:00:11:22".to_string(),
                connected: false,
            })
        );
    }

    #[test]
    fn test_sleep_step_completes() {
        let journal = Arc::new(Journal::new());
        let replay = replay(&journal);
        let events = tokio_test::block_on(replay.apply(ScriptStep::SleepMs(1)));
        assert_eq!(events, 0);
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn test_from_config() {
        let journal = Arc::new(Journal::new());
        let mut config = Config::default();
        config.pairing.led_enabled = false;
        let replay = Replay::from_config(&config, journal.clone(), journal.clone()).unwrap();

        let mut input = crate::controller::events::InputEvent::new(slot(0));
        input.buttons_up.insert(Button::Cross);
        assert_eq!(replay.deliver(&ControllerEvent::Input(input)), 1);
        assert_eq!(
            journal.diagnostics(),
            vec![Diagnostic::ButtonEdge {
                button: Button::Cross,
                pressed: false,
            }]
        );

        config.pairing.led_slot = MAX_SLOTS;
        config.pairing.led_enabled = true;
        assert!(Replay::from_config(&config, journal.clone(), journal).is_err());
    }
}

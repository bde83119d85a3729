//! Connection-status monitoring for the live channel backing a session view.
//!
//! The monitor owns nothing but the status enum: the external transport
//! collaborator drives transitions, any number of observers read the current
//! value, and the signal is strictly advisory: a session remains completable
//! over plain request/response while the channel is down.
//!
//! One monitor exists per authenticated session. Dropping it on logout tears
//! the channel down; observers see the closure and a fresh login builds a
//! fresh monitor with no retained state.

use tokio::sync::watch;

use exam_core::model::ConnectionStatus;

/// Publisher side of the connection-status signal.
#[derive(Debug)]
pub struct ConnectionMonitor {
    tx: watch::Sender<ConnectionStatus>,
}

impl ConnectionMonitor {
    /// Starts in `Connecting`.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConnectionStatus::Connecting);
        Self { tx }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Hands out a read-only observer of the current status.
    #[must_use]
    pub fn watch(&self) -> StatusWatch {
        StatusWatch {
            rx: self.tx.subscribe(),
        }
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Applies a transition if it is legal, returning whether it took
    /// effect. Illegal moves are logged and ignored; repeating the current
    /// state is a no-op that observers do not see.
    pub fn transition(&self, next: ConnectionStatus) -> bool {
        let current = self.status();
        if current == next {
            return true;
        }
        if !current.can_transition_to(next) {
            tracing::warn!(%current, %next, "ignoring illegal transport transition");
            return false;
        }
        tracing::debug!(%current, %next, "transport status changed");
        self.tx.send_replace(next);
        true
    }

    pub fn mark_connected(&self) -> bool {
        self.transition(ConnectionStatus::Connected)
    }

    pub fn mark_disconnected(&self) -> bool {
        self.transition(ConnectionStatus::Disconnected)
    }

    /// A reconnect attempt after a drop.
    pub fn mark_reconnecting(&self) -> bool {
        self.transition(ConnectionStatus::Connecting)
    }

    /// A fatal transport fault; terminal for this monitor instance.
    pub fn mark_failed(&self) -> bool {
        self.transition(ConnectionStatus::Error)
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only observer of the connection status.
#[derive(Debug, Clone)]
pub struct StatusWatch {
    rx: watch::Receiver<ConnectionStatus>,
}

impl StatusWatch {
    #[must_use]
    pub fn current(&self) -> ConnectionStatus {
        *self.rx.borrow()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current().is_connected()
    }

    /// Waits for the next status change. Returns `None` once the monitor is
    /// dropped (logout teardown).
    pub async fn next_change(&mut self) -> Option<ConnectionStatus> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionStatus::{Connected, Connecting, Disconnected, Error};

    #[test]
    fn monitor_starts_connecting() {
        let monitor = ConnectionMonitor::new();
        assert_eq!(monitor.status(), Connecting);
        assert!(!monitor.is_connected());
    }

    #[tokio::test]
    async fn legal_transitions_reach_observers() {
        let monitor = ConnectionMonitor::new();
        let mut observer = monitor.watch();

        assert!(monitor.mark_connected());
        assert_eq!(observer.next_change().await, Some(Connected));
        assert!(observer.is_connected());

        assert!(monitor.mark_disconnected());
        assert_eq!(observer.next_change().await, Some(Disconnected));

        assert!(monitor.mark_reconnecting());
        assert_eq!(observer.next_change().await, Some(Connecting));
    }

    #[tokio::test]
    async fn illegal_transitions_are_ignored() {
        let monitor = ConnectionMonitor::new();
        let observer = monitor.watch();

        // connecting -> disconnected is not in the transition diagram
        assert!(!monitor.mark_disconnected());
        assert_eq!(monitor.status(), Connecting);
        assert_eq!(observer.current(), Connecting);
    }

    #[tokio::test]
    async fn error_is_reachable_from_anywhere_and_sticky() {
        let monitor = ConnectionMonitor::new();
        monitor.mark_connected();

        assert!(monitor.mark_failed());
        assert_eq!(monitor.status(), Error);

        // Terminal: nothing moves out of error.
        assert!(!monitor.mark_connected());
        assert!(!monitor.mark_reconnecting());
        assert_eq!(monitor.status(), Error);
    }

    #[tokio::test]
    async fn multiple_observers_see_the_same_signal() {
        let monitor = ConnectionMonitor::new();
        let mut one = monitor.watch();
        let mut two = monitor.watch();
        assert_eq!(monitor.observer_count(), 2);

        monitor.mark_connected();
        assert_eq!(one.next_change().await, Some(Connected));
        assert_eq!(two.next_change().await, Some(Connected));
    }

    #[tokio::test]
    async fn dropping_the_monitor_tears_the_signal_down() {
        let monitor = ConnectionMonitor::new();
        let mut observer = monitor.watch();
        drop(monitor);
        assert_eq!(observer.next_change().await, None);
    }

    #[tokio::test]
    async fn repeating_the_current_state_is_a_silent_no_op() {
        let monitor = ConnectionMonitor::new();
        let observer = monitor.watch();
        assert!(monitor.mark_reconnecting());
        assert_eq!(observer.current(), Connecting);
    }
}

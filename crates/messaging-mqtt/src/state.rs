use rumqttc::{ConnectionError, Event, Packet};

/// Connection lifecycle of a subscription.
///
/// `Disconnected → Connecting → Connected`, with
/// `Interrupted → Reconnecting → Connected` on transport loss. An explicit
/// shutdown returns to `Disconnected` and is terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    /// No session; initial and terminal state.
    Disconnected,

    /// First connection attempt in progress.
    Connecting,

    /// Session established and subscription active.
    Connected,

    /// Transport lost without an explicit disconnect.
    Interrupted,

    /// Re-establishing the session after an interruption.
    Reconnecting,
}

/// Computes the next state for a transport event. Pure so the transition
/// table is testable without a broker.
pub(crate) fn next_state(
    current: ConnectionState,
    event: &Result<Event, ConnectionError>,
) -> ConnectionState {
    match event {
        Ok(Event::Incoming(Packet::ConnAck(_))) => ConnectionState::Connected,
        Ok(_) => current,
        Err(_) => match current {
            ConnectionState::Disconnected => ConnectionState::Disconnected,
            _ => ConnectionState::Interrupted,
        },
    }
}

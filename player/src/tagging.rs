//! Session stamping for servers that do not echo the session token.
//!
//! The token of a `play` becomes current as soon as it is sent, unless a
//! `stop_buffering` is still unacknowledged: the old stream may still be
//! draining, so the new token waits for the matching `buffer_stopped`.
//! Untagged frames arriving in between keep the old token and are dropped
//! by the engine as stale.

use tracing::debug;
use tv_common::{Control, SessionToken};

#[derive(Debug, Default)]
pub struct SessionTagger {
    current: SessionToken,
    pending: Option<SessionToken>,
    unacked_stops: usize,
}

impl SessionTagger {
    pub fn current(&self) -> SessionToken {
        self.current
    }

    /// Record a control message that is about to be sent.
    pub fn on_outbound(&mut self, control: &Control) {
        match control {
            Control::StopBuffering => self.unacked_stops += 1,
            Control::Play { token, .. } if self.unacked_stops == 0 => {
                self.current = *token;
                self.pending = None;
            }
            Control::Play { token, .. } => {
                debug!("Tagger: {} waits for {} stop ack(s)", token, self.unacked_stops);
                self.pending = Some(*token);
            }
            _ => {}
        }
    }

    pub fn on_stop_ack(&mut self) {
        self.unacked_stops = self.unacked_stops.saturating_sub(1);
        if self.unacked_stops == 0 {
            self.promote();
        }
    }

    /// A fresh connection: acks owed by the old one will never come.
    pub fn on_reconnect(&mut self) {
        self.unacked_stops = 0;
        self.promote();
    }

    /// The server's own tag wins; otherwise stamp with the current token.
    pub fn tag(&self, explicit: Option<SessionToken>) -> SessionToken {
        explicit.unwrap_or(self.current)
    }

    fn promote(&mut self) {
        if let Some(token) = self.pending.take() {
            self.current = token;
        }
    }
}

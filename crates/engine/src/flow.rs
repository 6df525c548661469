//! Drip-feed flow control toward the producer.
//!
//! Frames are requested one chunk at a time. The next chunk goes out only
//! once the previous one has fully arrived, and only while the buffer is
//! at or below the high-water mark (`margin + slack` seconds ahead of the
//! cursor). Playback needs strictly more than `margin` frames ahead, so
//! requests must still go out at exactly the mark, even with zero slack.
//! Playback ticks also poll, so a buffer that drained below the mark while
//! no request was in flight gets topped up again.

use tracing::debug;
use tv_common::{Control, FlowConfig, FrameRate, SessionToken, StreamSession};

use crate::buffer::FrameBuffer;

#[derive(Debug)]
pub struct FlowController {
    config: FlowConfig,
    /// Frames asked for but not yet received.
    outstanding: usize,
    /// The producer has been told to play and not told to stop.
    producing: bool,
}

impl FlowController {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            config,
            outstanding: 0,
            producing: false,
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn is_producing(&self) -> bool {
        self.producing
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Unpresented frames playback needs in hand to keep running.
    pub fn margin(&self, rate: FrameRate) -> usize {
        self.config.margin_frames(rate)
    }

    /// Buffer level above which no new chunk is requested.
    pub fn high_water(&self, rate: FrameRate) -> usize {
        self.config.high_water_frames(rate)
    }

    /// Fewer than `margin` unpresented frames and more still to come.
    pub fn is_starved(&self, buffer: &FrameBuffer, rate: FrameRate) -> bool {
        !buffer.is_complete() && buffer.remaining() < self.margin(rate)
    }

    pub fn is_healthy(&self, buffer: &FrameBuffer, rate: FrameRate) -> bool {
        !self.is_starved(buffer, rate)
    }

    /// Tell the producer to start the session and ask for the first chunk.
    pub fn start(&mut self, session: &StreamSession, token: SessionToken) -> Vec<Control> {
        self.producing = true;
        self.outstanding = self.config.chunk_size;
        debug!("Flow: start {} {} (chunk {})", session, token, self.config.chunk_size);
        vec![
            Control::Play {
                session: session.clone(),
                token,
            },
            Control::RequestFrames {
                count: self.config.chunk_size,
            },
        ]
    }

    /// Account for one arrived frame; may request the next chunk.
    pub fn on_append(&mut self, buffer: &FrameBuffer, rate: FrameRate) -> Option<Control> {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.poll(buffer, rate)
    }

    /// Request a chunk if none is in flight and the buffer is not above
    /// the high-water mark.
    pub fn poll(&mut self, buffer: &FrameBuffer, rate: FrameRate) -> Option<Control> {
        if !self.producing || buffer.is_complete() || self.outstanding > 0 {
            return None;
        }
        if buffer.remaining() > self.high_water(rate) {
            return None;
        }

        self.outstanding = self.config.chunk_size;
        debug!(
            "Flow: requesting {} frames ({} buffered ahead)",
            self.config.chunk_size,
            buffer.remaining()
        );
        Some(Control::RequestFrames {
            count: self.config.chunk_size,
        })
    }

    /// The producer finished the stream; nothing more is owed.
    pub fn on_complete(&mut self) {
        self.outstanding = 0;
        self.producing = false;
    }

    /// Requests made over a lost connection will never be answered.
    pub fn on_reconnect(&mut self) {
        if self.outstanding > 0 {
            debug!("Flow: forgetting {} frames owed by the old connection", self.outstanding);
        }
        self.outstanding = 0;
    }

    /// Halt an active request stream. Returns the stop message when the
    /// producer was still producing.
    pub fn stop(&mut self) -> Option<Control> {
        let was_producing = self.producing;
        self.reset();
        was_producing.then_some(Control::StopBuffering)
    }

    pub fn reset(&mut self) {
        self.outstanding = 0;
        self.producing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tv_common::Frame;

    fn fill(buffer: &mut FrameBuffer, count: usize) {
        for _ in 0..count {
            buffer.append(Frame::new(vec![], vec![]));
        }
    }

    fn started() -> FlowController {
        let mut flow = FlowController::new(FlowConfig::default());
        flow.start(&StreamSession::new("a.mp4", "bytetrack"), SessionToken(1));
        flow
    }

    #[test]
    fn start_sends_play_then_first_chunk() {
        let mut flow = FlowController::new(FlowConfig::default());
        let session = StreamSession::new("a.mp4", "bytetrack");
        let controls = flow.start(&session, SessionToken(3));
        assert_eq!(
            controls,
            vec![
                Control::Play {
                    session,
                    token: SessionToken(3)
                },
                Control::RequestFrames { count: 10 },
            ]
        );
        assert!(flow.is_producing());
        assert_eq!(flow.outstanding(), 10);
    }

    #[test]
    fn next_chunk_follows_the_last_frame_of_the_previous_one() {
        let mut flow = started();
        let mut buffer = FrameBuffer::new();

        for _ in 0..9 {
            buffer.append(Frame::new(vec![], vec![]));
            assert_eq!(flow.on_append(&buffer, FrameRate::DEFAULT), None);
        }
        buffer.append(Frame::new(vec![], vec![]));
        assert_eq!(
            flow.on_append(&buffer, FrameRate::DEFAULT),
            Some(Control::RequestFrames { count: 10 })
        );
    }

    #[test]
    fn requests_pause_above_high_water_and_resume_on_poll() {
        let mut flow = started();
        let mut buffer = FrameBuffer::new();
        let rate = FrameRate::DEFAULT;

        fill(&mut buffer, 90);
        flow.outstanding = 1;
        buffer.append(Frame::new(vec![], vec![]));
        assert_eq!(flow.on_append(&buffer, rate), None, "91 frames ahead is enough");

        buffer.advance();
        assert_eq!(buffer.remaining(), 90);
        assert_eq!(flow.poll(&buffer, rate), Some(Control::RequestFrames { count: 10 }));
        assert_eq!(flow.poll(&buffer, rate), None, "one chunk in flight at a time");
    }

    #[test]
    fn zero_slack_still_requests_at_the_margin() {
        let config = FlowConfig {
            slack_seconds: 0,
            ..FlowConfig::default()
        };
        let mut flow = FlowController::new(config);
        flow.start(&StreamSession::new("a.mp4", "bytetrack"), SessionToken(1));
        flow.outstanding = 0;
        let rate = FrameRate::DEFAULT;

        let mut buffer = FrameBuffer::new();
        fill(&mut buffer, 60);
        assert_eq!(flow.high_water(rate), flow.margin(rate));
        assert_eq!(
            flow.poll(&buffer, rate),
            Some(Control::RequestFrames { count: 10 }),
            "playback cannot present at exactly the margin, so more must be asked for"
        );
    }

    #[test]
    fn complete_buffers_are_never_topped_up() {
        let mut flow = started();
        let mut buffer = FrameBuffer::new();
        fill(&mut buffer, 3);
        buffer.mark_complete();
        flow.on_complete();
        assert_eq!(flow.poll(&buffer, FrameRate::DEFAULT), None);
        assert!(!flow.is_producing());
    }

    #[test]
    fn starvation_signal_uses_the_margin() {
        let flow = FlowController::new(FlowConfig::default());
        let mut buffer = FrameBuffer::new();
        let rate = FrameRate::new(30).unwrap();

        fill(&mut buffer, 59);
        assert!(flow.is_starved(&buffer, rate));
        fill(&mut buffer, 1);
        assert!(flow.is_healthy(&buffer, rate));

        let mut short = FrameBuffer::new();
        fill(&mut short, 5);
        short.mark_complete();
        assert!(flow.is_healthy(&short, rate));
    }

    #[test]
    fn reconnect_lets_polling_request_again() {
        let mut flow = started();
        let mut buffer = FrameBuffer::new();
        fill(&mut buffer, 4);
        assert_eq!(flow.poll(&buffer, FrameRate::DEFAULT), None, "chunk still owed");

        flow.on_reconnect();
        assert_eq!(
            flow.poll(&buffer, FrameRate::DEFAULT),
            Some(Control::RequestFrames { count: 10 })
        );
    }

    #[test]
    fn stop_only_messages_an_active_producer() {
        let mut idle = FlowController::new(FlowConfig::default());
        assert_eq!(idle.stop(), None);

        let mut flow = started();
        assert_eq!(flow.stop(), Some(Control::StopBuffering));
        assert!(!flow.is_producing());
        assert_eq!(flow.outstanding(), 0);
    }
}

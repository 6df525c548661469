//! The session object tying buffer, flow control and playback together.
//!
//! A [`Player`] is owned by exactly one event loop. Ticks, inbound transport
//! messages, user commands and connection changes all arrive as
//! [`PlayerEvent`]s and are applied one at a time, so the buffer and
//! playback state never see interleaved updates. Each event yields
//! [`Effects`] for the loop to carry out: control messages for the
//! transport, timer changes, and whether a new frame went on screen.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use tv_common::{
    Control, FlowConfig, Frame, FrameRate, Inbound, PlaybackError, SessionToken, Speed, StreamSession,
    TrackedObject,
};
use tv_overlay::{build_overlay, fps_label, AnnotationFilter, FpsMeter, LabelOptions, OverlayItem};

use crate::buffer::FrameBuffer;
use crate::flow::FlowController;
use crate::scheduler::{PlayOutcome, PlaybackScheduler, PlaybackSnapshot, PlaybackStatus, TickOutcome};

/// User actions.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    SetSpeed(Speed),
    SelectVideo(String),
    SelectTracker(String),
    SetFilter(AnnotationFilter),
    SetLabels(LabelOptions),
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    Tick(Instant),
    Inbound(Inbound),
    Command(Command),
    /// The transport connected (`true`) or lost its connection (`false`).
    Connection(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerChange {
    /// (Re)start the tick timer with this period.
    Arm(Duration),
    /// Tear the tick timer down.
    Disarm,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Effects {
    /// Messages for the transport, in send order.
    pub outbound: Vec<Control>,
    pub timer: Option<TimerChange>,
    /// Index of a frame that just became current.
    pub presented: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct PlayerSettings {
    pub flow: FlowConfig,
    pub speed: Speed,
    /// Tracker used when a video is selected before any tracker was chosen.
    pub default_tracker: String,
    pub labels: LabelOptions,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            flow: FlowConfig::default(),
            speed: Speed::NORMAL,
            default_tracker: "bytetrack".to_string(),
            labels: LabelOptions::default(),
        }
    }
}

/// Everything the presentation layer polls.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSnapshot {
    pub playback: PlaybackSnapshot,
    pub session: Option<StreamSession>,
    pub token: SessionToken,
    pub cursor: usize,
    pub buffered: usize,
    pub complete: bool,
    pub buffer_healthy: bool,
    pub connected: bool,
    /// Transport is down; nothing new will arrive until it reconnects.
    pub stalled: bool,
}

pub struct Player {
    buffer: FrameBuffer,
    flow: FlowController,
    scheduler: PlaybackScheduler,
    session: Option<StreamSession>,
    token: SessionToken,
    default_tracker: String,
    videos: Vec<String>,
    trackers: Vec<String>,
    connected: bool,
    filter: AnnotationFilter,
    labels: LabelOptions,
    fps: FpsMeter,
    /// Tick period currently armed in the event loop, if any.
    armed: Option<Duration>,
}

impl Player {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            flow: FlowController::new(settings.flow),
            scheduler: PlaybackScheduler::new(settings.speed),
            session: None,
            token: SessionToken::NONE,
            default_tracker: settings.default_tracker,
            videos: Vec::new(),
            trackers: Vec::new(),
            connected: false,
            filter: AnnotationFilter::default(),
            labels: settings.labels,
            fps: FpsMeter::new(),
            armed: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn status(&self) -> PlaybackStatus {
        self.scheduler.status()
    }

    pub fn session(&self) -> Option<&StreamSession> {
        self.session.as_ref()
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    pub fn videos(&self) -> &[String] {
        &self.videos
    }

    pub fn trackers(&self) -> &[String] {
        &self.trackers
    }

    pub fn roster(&self) -> &[TrackedObject] {
        self.buffer.roster()
    }

    pub fn filter(&self) -> &AnnotationFilter {
        &self.filter
    }

    pub fn labels(&self) -> LabelOptions {
        self.labels
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.scheduler.frame_rate()
    }

    pub fn current_frame(&self) -> Option<(usize, Arc<Frame>)> {
        self.scheduler.current().cloned()
    }

    /// Overlay items for the frame on screen, after filtering.
    pub fn overlay(&self) -> Vec<OverlayItem> {
        self.scheduler
            .current()
            .map(|(_, frame)| build_overlay(frame, &self.filter, &self.labels))
            .unwrap_or_default()
    }

    pub fn fps_label(&mut self, now: Instant) -> String {
        fps_label(self.fps.fps(now))
    }

    pub fn stalled(&self) -> bool {
        !self.connected
    }

    pub fn control_label(&self) -> &'static str {
        self.scheduler.control_label()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let rate = self.scheduler.frame_rate();
        PlayerSnapshot {
            playback: self.scheduler.snapshot(),
            session: self.session.clone(),
            token: self.token,
            cursor: self.buffer.cursor(),
            buffered: self.buffer.len(),
            complete: self.buffer.is_complete(),
            buffer_healthy: self.flow.is_healthy(&self.buffer, rate),
            connected: self.connected,
            stalled: self.stalled(),
        }
    }

    // -----------------------------------------------------------------------
    // Event handling
    // -----------------------------------------------------------------------

    /// Apply one event. Only user commands can fail; stale or surplus
    /// inbound data is dropped silently.
    pub fn handle(&mut self, event: PlayerEvent) -> Result<Effects, PlaybackError> {
        let mut effects = Effects::default();

        match event {
            PlayerEvent::Tick(now) => self.on_tick(now, &mut effects),
            PlayerEvent::Inbound(message) => self.on_inbound(message, &mut effects),
            PlayerEvent::Command(command) => self.on_command(command, &mut effects)?,
            PlayerEvent::Connection(up) => self.on_connection(up),
        }

        self.sync_timer(&mut effects);
        Ok(effects)
    }

    fn on_tick(&mut self, now: Instant, effects: &mut Effects) {
        let rate = self.scheduler.frame_rate();
        let margin = self.flow.margin(rate);

        match self.scheduler.tick(&mut self.buffer, margin) {
            TickOutcome::Presented(index) => {
                self.fps.record(now);
                effects.presented = Some(index);
            }
            TickOutcome::Ended => {
                info!("Player: {} ended", self.session_label());
                return;
            }
            TickOutcome::Buffering => {}
            TickOutcome::Inactive => return,
        }

        if let Some(control) = self.flow.poll(&self.buffer, rate) {
            effects.outbound.push(control);
        }
    }

    fn on_inbound(&mut self, message: Inbound, effects: &mut Effects) {
        match message {
            Inbound::Frame { token, frame } => {
                if !self.is_current(token) {
                    debug!("Player: dropping frame from stale session {}", token);
                    return;
                }
                if self.buffer.is_complete() {
                    warn!("Player: frame arrived after end of {}, dropping", self.session_label());
                    return;
                }
                self.buffer.append(frame);
                let rate = self.scheduler.frame_rate();
                if let Some(control) = self.flow.on_append(&self.buffer, rate) {
                    effects.outbound.push(control);
                }
            }

            Inbound::StreamEnd { token } => {
                if !self.is_current(token) {
                    debug!("Player: dropping end marker from stale session {}", token);
                    return;
                }
                self.buffer.mark_complete();
                self.flow.on_complete();
                info!(
                    "Player: {} fully buffered ({} frames)",
                    self.session_label(),
                    self.buffer.len()
                );
            }

            Inbound::Summary {
                frame_rate,
                known_objects,
            } => {
                info!(
                    "Player: summary for {}: {}, {} known objects",
                    self.session_label(),
                    frame_rate,
                    known_objects.len()
                );
                self.scheduler.set_frame_rate(frame_rate);
                self.buffer.set_roster(known_objects);
            }

            Inbound::StreamList { videos, trackers } => {
                info!("Player: {} videos available", videos.len());
                self.videos = videos;
                if !trackers.is_empty() {
                    self.trackers = trackers;
                }

                if self.session.is_none() {
                    if let Some(first) = self.videos.first().cloned() {
                        let tracker = self.pick_tracker();
                        self.switch_session(StreamSession::new(first, tracker), effects);
                    }
                }
            }

            Inbound::BufferStopped => {
                debug!("Player: producer confirmed stop");
            }
        }
    }

    fn on_command(&mut self, command: Command, effects: &mut Effects) -> Result<(), PlaybackError> {
        match command {
            Command::Play => self.play(effects)?,

            Command::Pause => {
                self.scheduler.pause();
            }

            Command::Toggle => {
                if self.scheduler.status().is_active() {
                    self.scheduler.pause();
                } else {
                    self.play(effects)?;
                }
            }

            Command::SetSpeed(speed) => {
                if self.scheduler.set_speed(speed).is_some() {
                    info!("Player: speed {}", speed);
                }
            }

            Command::SelectVideo(video) => {
                if !self.videos.is_empty() && !self.videos.contains(&video) {
                    return Err(PlaybackError::UnknownVideo(video));
                }
                let next = match &self.session {
                    Some(session) => session.with_video(video),
                    None => StreamSession::new(video, self.pick_tracker()),
                };
                self.switch_session(next, effects);
            }

            Command::SelectTracker(tracker) => {
                let next = self.session.as_ref().map(|s| s.with_tracker(tracker.as_str()));
                match next {
                    Some(next) => self.switch_session(next, effects),
                    None => self.default_tracker = tracker,
                }
            }

            Command::SetFilter(filter) => self.filter = filter,

            Command::SetLabels(labels) => self.labels = labels,
        }
        Ok(())
    }

    fn on_connection(&mut self, up: bool) {
        if up == self.connected {
            return;
        }
        self.connected = up;
        if up {
            info!("Player: transport connected");
            self.flow.on_reconnect();
        } else {
            warn!("Player: transport lost, holding state until it reconnects");
        }
    }

    fn play(&mut self, effects: &mut Effects) -> Result<(), PlaybackError> {
        let outcome = self.scheduler.play(self.session.is_some(), &mut self.buffer)?;

        match (outcome, &self.session) {
            (PlayOutcome::Started, Some(session)) => {
                info!("Player: starting {} {}", session, self.token);
                let controls = self.flow.start(session, self.token);
                effects.outbound.extend(controls);
            }
            (PlayOutcome::Replayed, _) => {
                info!("Player: replaying {} from buffer", self.session_label());
                self.fps.reset();
            }
            _ => {}
        }
        Ok(())
    }

    /// Replace the current session. Buffer, playback and flow state are reset
    /// together, the producer is told to stop, and the new token makes any
    /// old-session frame still in flight stale.
    fn switch_session(&mut self, next: StreamSession, effects: &mut Effects) {
        if self.session.as_ref() == Some(&next) {
            debug!("Player: {} already selected", next);
            return;
        }

        if let Some(stop) = self.flow.stop() {
            effects.outbound.push(stop);
        }
        self.buffer.reset();
        self.scheduler.reset();
        self.fps.reset();
        self.token = self.token.next();

        info!("Player: switched to {} {}", next, self.token);
        effects.outbound.push(Control::RequestSummary { session: next.clone() });
        self.session = Some(next);
    }

    fn sync_timer(&mut self, effects: &mut Effects) {
        let wanted = self
            .scheduler
            .status()
            .is_active()
            .then(|| self.scheduler.tick_period());

        if wanted != self.armed {
            self.armed = wanted;
            effects.timer = Some(match wanted {
                Some(period) => TimerChange::Arm(period),
                None => TimerChange::Disarm,
            });
        }
    }

    fn is_current(&self, token: SessionToken) -> bool {
        self.session.is_some() && token == self.token
    }

    fn pick_tracker(&self) -> String {
        if self.trackers.is_empty() || self.trackers.contains(&self.default_tracker) {
            self.default_tracker.clone()
        } else {
            self.trackers[0].clone()
        }
    }

    fn session_label(&self) -> String {
        self.session
            .as_ref()
            .map_or_else(|| "<no session>".to_string(), ToString::to_string)
    }
}

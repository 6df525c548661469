//! The single task that owns the [`Player`].
//!
//! Transport events, console input and timer ticks are applied one at a time,
//! so the engine never sees concurrent mutation. Effects returned by the
//! engine are carried out here: control messages go to the transport, the
//! tick timer is rebuilt or torn down, and presented frames go to the sink.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tv_common::Control;
use tv_engine::{Command, Effects, Player, PlayerEvent, PlaybackStatus, TimerChange};
use tv_overlay::AnnotationFilter;

use crate::console::{ConsoleInput, LabelPart, HELP};
use crate::sink::{FrameSink, Presentation};

pub struct EventLoop<S> {
    player: Player,
    sink: S,
    outbound: mpsc::UnboundedSender<Control>,
    /// Play once the first stream is selected and the transport is up.
    autoplay: bool,
}

impl<S: FrameSink> EventLoop<S> {
    pub fn new(player: Player, sink: S, outbound: mpsc::UnboundedSender<Control>, autoplay: bool) -> Self {
        Self {
            player,
            sink,
            outbound,
            autoplay,
        }
    }

    /// Run until `quit`, or until the transport side hangs up. Returns the
    /// sink.
    pub async fn run(mut self, mut events: mpsc::Receiver<PlayerEvent>, mut console: mpsc::Receiver<ConsoleInput>) -> S {
        let mut ticker: Option<Interval> = None;
        let mut console_open = true;

        loop {
            tokio::select! {
                now = next_tick(&mut ticker) => {
                    self.dispatch(PlayerEvent::Tick(now.into_std()), &mut ticker);
                }
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event, &mut ticker),
                    None => {
                        info!("Event loop: transport closed");
                        break;
                    }
                },
                input = console.recv(), if console_open => match input {
                    Some(ConsoleInput::Quit) => {
                        info!("Event loop: quit requested");
                        break;
                    }
                    Some(input) => self.on_console(input, &mut ticker),
                    None => console_open = false,
                },
            }
        }

        self.sink
    }

    fn dispatch(&mut self, event: PlayerEvent, ticker: &mut Option<Interval>) {
        let effects = match self.player.handle(event) {
            Ok(effects) => effects,
            Err(e) => {
                warn!("Command rejected: {}", e);
                return;
            }
        };
        self.apply(effects, ticker);

        let ready = !self.player.stalled() && self.player.session().is_some();
        if self.autoplay && ready && self.player.status() == PlaybackStatus::Idle {
            info!("Event loop: autoplay");
            self.autoplay = false;
            self.dispatch(PlayerEvent::Command(Command::Play), ticker);
        }
    }

    fn apply(&mut self, effects: Effects, ticker: &mut Option<Interval>) {
        for control in effects.outbound {
            if self.outbound.send(control).is_err() {
                warn!("Event loop: transport gone, dropping control message");
            }
        }

        match effects.timer {
            Some(TimerChange::Arm(period)) => {
                debug!("Event loop: tick every {:?}", period);
                *ticker = Some(new_ticker(period));
            }
            Some(TimerChange::Disarm) => {
                debug!("Event loop: tick disarmed");
                *ticker = None;
            }
            None => {}
        }

        if effects.presented.is_some() {
            self.present();
        }
    }

    fn present(&mut self) {
        let fps = self.player.fps_label(Instant::now().into_std());
        let Some((index, frame)) = self.player.current_frame() else {
            return;
        };
        let Some(session) = self.player.session().cloned() else {
            return;
        };
        let overlay = self.player.overlay();

        self.sink.present(Presentation {
            session: &session,
            index,
            frame: &frame,
            overlay: &overlay,
            fps_label: &fps,
        });
    }

    fn on_console(&mut self, input: ConsoleInput, ticker: &mut Option<Interval>) {
        let command = match input {
            ConsoleInput::Player(command) => command,
            ConsoleInput::FilterClass(class_name) => Command::SetFilter(AnnotationFilter {
                class_name: Some(class_name),
                ..self.player.filter().clone()
            }),
            ConsoleInput::FilterId(object_id) => Command::SetFilter(AnnotationFilter {
                object_id: Some(object_id),
                ..self.player.filter().clone()
            }),
            ConsoleInput::FilterClear => {
                let mut filter = self.player.filter().clone();
                filter.clear();
                Command::SetFilter(filter)
            }
            ConsoleInput::Labels { part, on } => {
                let mut labels = self.player.labels();
                match part {
                    LabelPart::Id => labels.show_id = on,
                    LabelPart::Class => labels.show_class = on,
                }
                Command::SetLabels(labels)
            }
            ConsoleInput::Status => {
                println!("{}", self.status_line());
                return;
            }
            ConsoleInput::Help => {
                println!("{}", HELP);
                return;
            }
            ConsoleInput::Quit => return,
        };

        self.dispatch(PlayerEvent::Command(command), ticker);
    }

    fn status_line(&self) -> String {
        let s = self.player.snapshot();
        let session = s
            .session
            .as_ref()
            .map_or_else(|| "<none>".to_string(), ToString::to_string);

        format!(
            "{} {} | {} | frame {}/{}{} | {} @ {} | [{}]{}",
            session,
            s.token,
            s.playback.status.label(),
            s.cursor,
            s.buffered,
            if s.complete { "" } else { "+" },
            s.playback.frame_rate,
            s.playback.speed,
            self.player.control_label(),
            if s.stalled { " | stalled" } else { "" },
        )
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}

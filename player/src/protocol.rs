//! JSON wire protocol spoken with the analysis server.
//!
//! Outbound messages are `{"type": ..., "content": ...}`; inbound messages
//! carry their fields next to `type`. Anything that does not decode into a
//! structurally valid message is rejected here and never reaches the engine.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tv_common::{
    Annotation, BoundingBox, Control, Frame, FrameRate, Inbound, SessionToken, TrackedObject,
};

use crate::tagging::SessionTagger;

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Frame count, sent as a decimal string.
    GetFrames(String),
    GetSummary(StreamRef),
    StopBuffering,
    Play(PlayRequest),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StreamRef {
    pub video: String,
    pub tracker: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayRequest {
    pub video: String,
    pub tracker: String,
    /// Session token the server may echo back on frames.
    pub session: u64,
}

impl From<&Control> for ClientMessage {
    fn from(control: &Control) -> Self {
        match control {
            Control::RequestFrames { count } => ClientMessage::GetFrames(count.to_string()),
            Control::RequestSummary { session } => ClientMessage::GetSummary(StreamRef {
                video: session.video.clone(),
                tracker: session.tracker.clone(),
            }),
            Control::StopBuffering => ClientMessage::StopBuffering,
            Control::Play { session, token } => ClientMessage::Play(PlayRequest {
                video: session.video.clone(),
                tracker: session.tracker.clone(),
                session: token.0,
            }),
        }
    }
}

pub fn encode(control: &Control) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&ClientMessage::from(control))?)
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    VideoFrame {
        /// Base64 image, optionally as a `data:` URL.
        frame: String,
        #[serde(default)]
        positions: Vec<Position>,
        #[serde(default)]
        session: Option<u64>,
    },
    VideoList {
        videos: Vec<String>,
        #[serde(default)]
        trackers: Vec<String>,
    },
    VideoSummary {
        content: SummaryContent,
    },
    VideoEnd {
        #[serde(default)]
        session: Option<u64>,
    },
    BufferStopped,
}

/// One detected object as sent by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    pub id: u32,
    pub class: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub mask: Option<Vec<[f32; 2]>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryContent {
    pub fps: NumberOrText,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntry {
    pub id: u32,
    pub class: String,
}

/// Some servers send numbers as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<Position> for Annotation {
    fn from(p: Position) -> Self {
        let annotation = Annotation::new(p.id, p.class, BoundingBox::new(p.x, p.y, p.width, p.height));
        match p.mask {
            Some(points) => annotation.with_mask(points.into_iter().map(|[x, y]| (x, y)).collect()),
            None => annotation,
        }
    }
}

/// Decode one text message. Frames and end markers without an explicit
/// session are stamped by `tagger`, which also learns about stop acks.
pub fn decode(text: &str, tagger: &mut SessionTagger) -> Result<Inbound, ProtocolError> {
    let message: ServerMessage = serde_json::from_str(text)?;

    let inbound = match message {
        ServerMessage::VideoFrame {
            frame,
            positions,
            session,
        } => Inbound::Frame {
            token: tagger.tag(session.map(SessionToken)),
            frame: Frame::new(decode_image(&frame)?, positions.into_iter().map(Annotation::from).collect()),
        },

        ServerMessage::VideoList { videos, trackers } => Inbound::StreamList { videos, trackers },

        ServerMessage::VideoSummary { content } => {
            let fps = content
                .fps
                .as_f64()
                .filter(|f| f.is_finite() && (1.0..=FrameRate::MAX_FPS as f64).contains(f))
                .ok_or_else(|| ProtocolError::FrameRate(format!("{:?}", content.fps)))?;
            let frame_rate = FrameRate::new(fps.trunc() as u32)
                .map_err(|e| ProtocolError::FrameRate(e.to_string()))?;
            Inbound::Summary {
                frame_rate,
                known_objects: content
                    .objects
                    .into_iter()
                    .map(|o| TrackedObject {
                        object_id: o.id,
                        class_name: o.class,
                    })
                    .collect(),
            }
        }

        ServerMessage::VideoEnd { session } => Inbound::StreamEnd {
            token: tagger.tag(session.map(SessionToken)),
        },

        ServerMessage::BufferStopped => {
            tagger.on_stop_ack();
            Inbound::BufferStopped
        }
    };

    Ok(inbound)
}

fn decode_image(payload: &str) -> Result<Vec<u8>, ProtocolError> {
    let data = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    Ok(STANDARD.decode(data.trim())?)
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame image is not valid base64: {0}")]
    Image(#[from] base64::DecodeError),

    #[error("invalid frame rate: {0}")]
    FrameRate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use serde_json::json;
    use tv_common::StreamSession;

    fn to_json(control: &Control) -> serde_json::Value {
        serde_json::from_str(&encode(control).unwrap()).unwrap()
    }

    #[test]
    fn encodes_control_messages() {
        let session = StreamSession::new("street.mp4", "bytetrack");

        assert_eq!(
            to_json(&Control::RequestFrames { count: 10 }),
            json!({"type": "get_frames", "content": "10"})
        );
        assert_eq!(to_json(&Control::StopBuffering), json!({"type": "stop_buffering"}));
        assert_eq!(
            to_json(&Control::RequestSummary {
                session: session.clone()
            }),
            json!({"type": "get_summary", "content": {"video": "street.mp4", "tracker": "bytetrack"}})
        );
        assert_eq!(
            to_json(&Control::Play {
                session,
                token: SessionToken(4)
            }),
            json!({"type": "play", "content": {"video": "street.mp4", "tracker": "bytetrack", "session": 4}})
        );
    }

    #[test]
    fn decodes_frames_with_boxes_and_masks() {
        let mut tagger = SessionTagger::default();
        let text = json!({
            "type": "video_frame",
            "frame": STANDARD.encode([1u8, 2, 3]),
            "positions": [
                {"id": 3, "class": "car", "x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
                {"id": 4, "class": "person", "x": 0, "y": 0, "width": 1, "height": 1,
                 "mask": [[0, 0], [5, 0], [5, 5]]}
            ],
            "session": 7
        })
        .to_string();

        let Inbound::Frame { token, frame } = decode(&text, &mut tagger).unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(token, SessionToken(7));
        assert_eq!(frame.image, vec![1, 2, 3]);
        assert_eq!(frame.annotations.len(), 2);
        assert_eq!(frame.annotations[0].bbox, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        assert!(!frame.annotations[0].has_mask());
        assert_eq!(
            frame.annotations[1].mask.as_deref(),
            Some(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)][..])
        );
    }

    #[test]
    fn untagged_frames_take_the_tagger_token() {
        let mut tagger = SessionTagger::default();
        tagger.on_outbound(&Control::Play {
            session: StreamSession::new("a.mp4", "sort"),
            token: SessionToken(2),
        });
        let text = format!(r#"{{"type":"video_frame","frame":"data:image/png;base64,{}"}}"#, STANDARD.encode([9u8]));

        let Inbound::Frame { token, frame } = decode(&text, &mut tagger).unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(token, SessionToken(2));
        assert_eq!(frame.image, vec![9]);
        assert!(frame.annotations.is_empty());
    }

    #[test]
    fn decodes_list_summary_and_end() {
        let mut tagger = SessionTagger::default();

        let list = decode(r#"{"type":"video_list","videos":["a.mp4","b.mp4"]}"#, &mut tagger).unwrap();
        assert_eq!(
            list,
            Inbound::StreamList {
                videos: vec!["a.mp4".into(), "b.mp4".into()],
                trackers: vec![],
            }
        );

        let summary = decode(
            r#"{"type":"video_summary","content":{"fps":"29.97","objects":[{"id":1,"class":"car"}]}}"#,
            &mut tagger,
        )
        .unwrap();
        assert_eq!(
            summary,
            Inbound::Summary {
                frame_rate: FrameRate::new(29).unwrap(),
                known_objects: vec![TrackedObject {
                    object_id: 1,
                    class_name: "car".into()
                }],
            }
        );

        let numeric = decode(r#"{"type":"video_summary","content":{"fps":25}}"#, &mut tagger).unwrap();
        assert!(matches!(numeric, Inbound::Summary { frame_rate, .. } if frame_rate.fps() == 25));

        let end = decode(r#"{"type":"video_end","session":3}"#, &mut tagger).unwrap();
        assert_eq!(end, Inbound::StreamEnd { token: SessionToken(3) });

        let ack = decode(r#"{"type":"buffer_stopped"}"#, &mut tagger).unwrap();
        assert_eq!(ack, Inbound::BufferStopped);
    }

    #[test]
    fn rejects_malformed_messages() {
        let mut tagger = SessionTagger::default();
        assert!(matches!(decode("not json", &mut tagger), Err(ProtocolError::Json(_))));
        assert!(matches!(
            decode(r#"{"type":"video_frame","frame":"%%%"}"#, &mut tagger),
            Err(ProtocolError::Image(_))
        ));
        assert!(matches!(
            decode(r#"{"type":"video_summary","content":{"fps":"0"}}"#, &mut tagger),
            Err(ProtocolError::FrameRate(_))
        ));
        for absurd in [r#"1e12"#, r#""1e12""#, r#"1001"#, r#""NaN""#] {
            let text = format!(r#"{{"type":"video_summary","content":{{"fps":{absurd}}}}}"#);
            assert!(
                matches!(decode(&text, &mut tagger), Err(ProtocolError::FrameRate(_))),
                "fps {absurd} should be rejected"
            );
        }
        assert!(matches!(
            decode(r#"{"type":"video_frame","frame":"AA==","positions":[{"id":1}]}"#, &mut tagger),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(decode(r#"{"type":"mystery"}"#, &mut tagger), Err(ProtocolError::Json(_))));
    }
}

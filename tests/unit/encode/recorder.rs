use super::*;
use crate::encode::raw::RawEncoder;
use crate::foundation::core::Fps;
use crate::session::events::EventLog;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 1,
        fps: Fps::new(25, 1).unwrap(),
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA::from_rgba8(2, 1, vec![v, v, v, 255, v, v, v, 255]).unwrap()
}

/// Encoder that buffers frames and only emits them, two per chunk, when finished.
#[derive(Default)]
struct BatchingEncoder {
    pending: Vec<u8>,
    opened_with: Vec<Option<String>>,
}

impl Encoder for BatchingEncoder {
    fn open(&mut self, _cfg: &SinkConfig, codec: Option<&CodecConfig>) -> ReelmixResult<String> {
        self.opened_with.push(codec.map(|c| c.codec.clone()));
        Ok("video/mp4".to_owned())
    }

    fn encode(
        &mut self,
        _idx: FrameIndex,
        frame: &FrameRGBA,
        chunks: &mut dyn FnMut(Vec<u8>),
    ) -> ReelmixResult<()> {
        self.pending.push(frame.data[0]);
        if self.pending.len() == 2 {
            chunks(std::mem::take(&mut self.pending));
        }
        Ok(())
    }

    fn finish(&mut self, chunks: &mut dyn FnMut(Vec<u8>)) -> ReelmixResult<()> {
        chunks(std::mem::take(&mut self.pending));
        Ok(())
    }
}

#[test]
fn preferred_codec_is_used_when_accepted() {
    let log = Arc::new(EventLog::new());
    let mut sink = RecordingSink::new(BatchingEncoder::default(), log.clone());
    sink.begin(cfg()).unwrap();
    assert_eq!(
        sink.encoder().opened_with,
        vec![Some("avc1.42E01E".to_owned())]
    );
    assert!(
        !log.events()
            .iter()
            .any(|e| matches!(e, RunEvent::CodecFallback { .. }))
    );
}

#[test]
fn chunks_concatenate_in_arrival_order() {
    let log = Arc::new(EventLog::new());
    let mut sink = RecordingSink::new(BatchingEncoder::default(), log.clone());
    sink.begin(cfg()).unwrap();
    for (i, v) in [1u8, 2, 3].into_iter().enumerate() {
        sink.push_frame(FrameIndex(i as u64), &frame(v)).unwrap();
    }
    let artifact = sink.end().unwrap();
    assert_eq!(artifact.bytes, vec![1, 2, 3]);
    assert_eq!(artifact.chunk_count, 2);
    assert_eq!(artifact.content_type, "video/mp4");

    let sizes: Vec<usize> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            RunEvent::ChunkReceived { bytes } => Some(*bytes),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![2, 1]);
}

#[test]
fn rejected_codec_falls_back_to_defaults() {
    let log = Arc::new(EventLog::new());
    let mut sink = RecordingSink::new(RawEncoder::new(), log.clone());
    sink.begin(cfg()).unwrap();

    let content_type = sink.content_type().unwrap().to_owned();
    assert!(content_type.starts_with("video/x-raw"));
    assert!(content_type.contains("framerate=25/1"));
    match log.events().first() {
        Some(RunEvent::CodecFallback { preferred, reason }) => {
            assert_eq!(preferred, "avc1.42E01E");
            assert!(reason.contains("avc1.42E01E"));
        }
        other => panic!("expected codec fallback, got {other:?}"),
    }

    sink.push_frame(FrameIndex(0), &frame(7)).unwrap();
    let artifact = sink.end().unwrap();
    assert_eq!(artifact.bytes, frame(7).data);
    assert_eq!(artifact.suggested_file_name(), "final_video.rgba");
}

#[test]
fn raw_codec_needs_no_fallback() {
    let log = Arc::new(EventLog::new());
    let mut sink =
        RecordingSink::with_codec(RawEncoder::new(), Some(CodecConfig::rawvideo()), log.clone());
    sink.begin(cfg()).unwrap();
    assert!(log.events().is_empty());
}

#[test]
fn out_of_order_and_mismatched_frames_are_rejected() {
    let log = Arc::new(EventLog::new());
    let mut sink = RecordingSink::new(RawEncoder::new(), log);
    assert!(sink.push_frame(FrameIndex(0), &frame(1)).is_err());

    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(3), &frame(1)).unwrap();
    assert!(sink.push_frame(FrameIndex(3), &frame(1)).is_err());
    assert!(sink.push_frame(FrameIndex(2), &frame(1)).is_err());
    assert!(
        sink.push_frame(FrameIndex(4), &FrameRGBA::blank(1, 1))
            .is_err()
    );
    sink.end().unwrap();
    assert!(sink.end().is_err());
}

#[test]
fn h264_baseline_defaults() {
    let c = CodecConfig::h264_baseline();
    assert_eq!(c.codec, "avc1.42E01E");
    assert_eq!(c.bitrate_bps, 8_000_000);
    assert!(c.mime_type.starts_with("video/mp4"));
}

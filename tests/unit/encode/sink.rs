use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::default(),
    }
}

fn artifact(content_type: &str) -> MediaArtifact {
    MediaArtifact {
        bytes: vec![1, 2, 3],
        content_type: content_type.to_owned(),
        chunk_count: 1,
    }
}

#[test]
fn file_name_follows_container() {
    assert_eq!(
        artifact("video/mp4; codecs=\"avc1.42E01E\"").suggested_file_name(),
        "final_video.mp4"
    );
    assert_eq!(artifact("video/mp4").suggested_file_name(), "final_video.mp4");
    assert_eq!(artifact("video/webm").suggested_file_name(), "final_video.webm");
    assert_eq!(
        artifact("video/x-raw; format=rgba").suggested_file_name(),
        "final_video.rgba"
    );
    assert_eq!(artifact("").suggested_file_name(), "final_video.bin");
}

#[test]
fn write_to_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out/final_video.mp4");
    artifact("video/mp4").write_to(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
}

#[test]
fn in_memory_sink_keeps_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    let frame = FrameRGBA::blank(2, 2);
    sink.push_frame(FrameIndex(0), &frame).unwrap();
    sink.push_frame(FrameIndex(1), &frame).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &frame).is_err());

    let out = sink.end().unwrap();
    assert!(out.is_empty());
    assert!(sink.is_ended());
    assert_eq!(sink.config(), Some(cfg()));
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1]);
}

#[test]
fn in_memory_sink_requires_begin() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &FrameRGBA::blank(2, 2)).is_err());
    assert!(sink.end().is_err());
}

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::core::Fps;
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::media::decoder::{DecodedFrame, DecoderFactory, SourceMetadata, VideoDecoder};
use crate::media::source::{SourceFile, probe_video};
use crate::render::frame::FrameRGBA;

/// Creates [`FfmpegDecoder`]s that decode at the output frame rate.
#[derive(Clone, Copy, Debug)]
pub struct FfmpegDecoderFactory {
    fps: Fps,
}

impl FfmpegDecoderFactory {
    pub fn new(fps: Fps) -> Self {
        Self { fps }
    }
}

impl DecoderFactory for FfmpegDecoderFactory {
    fn create_decoder(&self, _slot: usize) -> ReelmixResult<Box<dyn VideoDecoder>> {
        Ok(Box::new(FfmpegDecoder::new(self.fps)))
    }
}

/// Decoder backed by the system `ffmpeg` binary.
///
/// `load` probes the file with `ffprobe`. `seek` spawns `ffmpeg -ss <t>` streaming raw RGBA frames
/// resampled to the output rate, and counts as settled once the first frame has been read.
pub struct FfmpegDecoder {
    fps: Fps,
    path: Option<PathBuf>,
    meta: Option<SourceMetadata>,
    seek_sec: f64,
    stream: Option<FrameStream>,
    current: Option<DecodedFrame>,
    playing: bool,
}

struct FrameStream {
    child: Child,
    stdout: ChildStdout,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    frames_read: u64,
    exhausted: bool,
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl FrameStream {
    fn stderr_text(&mut self) -> String {
        let _ = self.child.kill();
        let _ = self.child.wait();
        match self.stderr_drain.take().map(|h| h.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_owned(),
            _ => String::new(),
        }
    }
}

impl FfmpegDecoder {
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            path: None,
            meta: None,
            seek_sec: 0.0,
            stream: None,
            current: None,
            playing: false,
        }
    }

    fn frame_len(&self) -> ReelmixResult<usize> {
        let meta = self
            .meta
            .ok_or_else(|| ReelmixError::Other(anyhow::anyhow!("ffmpeg decoder not loaded")))?;
        Ok(meta.width as usize * meta.height as usize * 4)
    }

    fn spawn_stream(&self, path: &std::path::Path, start_sec: f64) -> ReelmixResult<FrameStream> {
        let meta = self
            .meta
            .ok_or_else(|| ReelmixError::Other(anyhow::anyhow!("ffmpeg decoder not loaded")))?;
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{start_sec:.6}")])
            .arg("-i")
            .arg(path)
            .args([
                "-an",
                "-vf",
                // Output is pinned to the probed display size; ffmpeg auto-rotates before `scale`.
                &stream_filter(self.fps, meta.width, meta.height),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelmixError::Other(anyhow::anyhow!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ReelmixError::Other(anyhow::anyhow!("failed to open ffmpeg stdout (unexpected)"))
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            ReelmixError::Other(anyhow::anyhow!("failed to open ffmpeg stderr (unexpected)"))
        })?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(FrameStream {
            child,
            stdout,
            stderr_drain: Some(stderr_drain),
            frames_read: 0,
            exhausted: false,
        })
    }

    /// Read the next frame; `None` once ffmpeg reached the end of the source.
    fn read_frame(&mut self) -> ReelmixResult<Option<DecodedFrame>> {
        let len = self.frame_len()?;
        let meta = self
            .meta
            .ok_or_else(|| ReelmixError::Other(anyhow::anyhow!("ffmpeg decoder not loaded")))?;
        let frame_secs = self.fps.frame_duration_secs();
        let seek_sec = self.seek_sec;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ReelmixError::Other(anyhow::anyhow!("ffmpeg decoder not seeked")))?;
        if stream.exhausted {
            return Ok(None);
        }

        let mut buf = vec![0u8; len];
        match stream.stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                stream.exhausted = true;
                return Ok(None);
            }
            Err(e) => {
                return Err(ReelmixError::Other(anyhow::anyhow!(
                    "failed to read frame from ffmpeg: {e}"
                )));
            }
        }

        let pts_sec = seek_sec + stream.frames_read as f64 * frame_secs;
        stream.frames_read += 1;
        Ok(Some(DecodedFrame {
            pts_sec,
            image: FrameRGBA::from_rgba8(meta.width, meta.height, buf)?,
        }))
    }
}

/// Filter graph for decoded frames: resample to `fps`, then force `width`x`height`.
fn stream_filter(fps: Fps, width: u32, height: u32) -> String {
    format!("fps={}/{},scale={width}:{height}", fps.num, fps.den)
}

impl VideoDecoder for FfmpegDecoder {
    fn load(&mut self, source: &SourceFile) -> ReelmixResult<SourceMetadata> {
        self.stream = None;
        self.current = None;
        self.playing = false;

        let info = probe_video(&source.path)?;
        let meta = SourceMetadata {
            width: info.width,
            height: info.height,
            duration_sec: info.duration_sec,
        };
        self.path = Some(source.path.clone());
        self.meta = Some(meta);
        Ok(meta)
    }

    fn seek(&mut self, time_sec: f64) -> ReelmixResult<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| ReelmixError::Other(anyhow::anyhow!("ffmpeg decoder not loaded")))?;
        self.stream = None;
        self.current = None;
        self.playing = false;
        self.seek_sec = time_sec;
        self.stream = Some(self.spawn_stream(&path, time_sec)?);

        match self.read_frame()? {
            Some(frame) => {
                self.current = Some(frame);
                Ok(())
            }
            None => {
                let stderr = self
                    .stream
                    .take()
                    .map(|mut s| s.stderr_text())
                    .unwrap_or_default();
                Err(ReelmixError::Other(anyhow::anyhow!(
                    "ffmpeg produced no frames at {time_sec:.3}s: {stderr}"
                )))
            }
        }
    }

    fn play(&mut self) -> ReelmixResult<()> {
        if self.current.is_none() {
            return Err(ReelmixError::Other(anyhow::anyhow!(
                "play requested before a successful seek"
            )));
        }
        if let Some(stream) = self.stream.as_mut()
            && !stream.exhausted
            && let Ok(Some(status)) = stream.child.try_wait()
            && !status.success()
        {
            return Err(ReelmixError::Other(anyhow::anyhow!(
                "ffmpeg exited with status {status}"
            )));
        }
        self.playing = true;
        Ok(())
    }

    fn frame_at(&mut self, time_sec: f64) -> ReelmixResult<&DecodedFrame> {
        if !self.playing {
            return Err(ReelmixError::Other(anyhow::anyhow!(
                "frame requested before play"
            )));
        }
        let frame_secs = self.fps.frame_duration_secs();
        loop {
            let next_pts = match self.current.as_ref() {
                Some(f) => f.pts_sec + frame_secs,
                None => break,
            };
            // Small tolerance so float drift does not hold a frame for an extra tick.
            if next_pts > time_sec + 1e-6 {
                break;
            }
            match self.read_frame()? {
                Some(frame) => self.current = Some(frame),
                None => break,
            }
        }
        self.current
            .as_ref()
            .ok_or_else(|| ReelmixError::Other(anyhow::anyhow!("ffmpeg decoder has no frame")))
    }
}

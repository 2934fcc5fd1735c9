use std::io::{Read, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;

use crate::encode::recorder::{CodecConfig, Encoder};
use crate::encode::sink::SinkConfig;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelmixError, ReelmixResult};
use crate::render::composite::flatten_over_bg;
use crate::render::frame::FrameRGBA;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Options for [`FfmpegEncoder`].
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Encoder that spawns the system `ffmpeg` and streams fragmented MP4 back.
///
/// Raw frames go to ffmpeg's stdin; a reader thread forwards stdout in chunks so encoded data
/// arrives while recording is still in progress.
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_rx: Option<mpsc::Receiver<std::io::Result<Vec<u8>>>>,
    stdout_reader: Option<std::thread::JoinHandle<()>>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
}

impl FfmpegEncoder {
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stdout_rx: None,
            stdout_reader: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
        }
    }

    /// Forward every chunk the reader thread has produced so far.
    fn drain_ready(&mut self, chunks: &mut dyn FnMut(Vec<u8>)) -> ReelmixResult<()> {
        let Some(rx) = self.stdout_rx.as_ref() else {
            return Ok(());
        };
        loop {
            match rx.try_recv() {
                Ok(Ok(chunk)) => chunks(chunk),
                Ok(Err(e)) => {
                    return Err(ReelmixError::encode(format!(
                        "failed to read ffmpeg output: {e}"
                    )));
                }
                Err(mpsc::TryRecvError::Empty | mpsc::TryRecvError::Disconnected) => {
                    return Ok(());
                }
            }
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(FfmpegEncoderOpts::default())
    }
}

impl Encoder for FfmpegEncoder {
    fn open(&mut self, cfg: &SinkConfig, codec: Option<&CodecConfig>) -> ReelmixResult<String> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelmixError::validation(
                "ffmpeg encoder width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelmixError::validation(
                "ffmpeg encoder width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelmixError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let (codec_args, content_type) = match codec {
            Some(codec) => {
                let args = codec_args(codec)?;
                (args, codec.mime_type.clone())
            }
            None => (Vec::new(), "video/mp4".to_owned()),
        };

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw premultiplied RGBA8 frames, flattened before writing (encode).
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);
        cmd.args(&codec_args);
        // Fragmented MP4 can be written to a pipe and consumed incrementally.
        cmd.args([
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
            "pipe:1",
        ]);

        let mut child = cmd.spawn().map_err(|e| {
            ReelmixError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelmixError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelmixError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelmixError::encode("failed to open ffmpeg stderr (unexpected)"))?;

        let (tx, rx) = mpsc::channel();
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_rx = Some(rx);
        self.stdout_reader = Some(stdout_reader);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(*cfg);
        Ok(content_type)
    }

    fn encode(
        &mut self,
        _idx: FrameIndex,
        frame: &FrameRGBA,
        chunks: &mut dyn FnMut(Vec<u8>),
    ) -> ReelmixResult<()> {
        if self.cfg.is_none() {
            return Err(ReelmixError::encode("ffmpeg encoder not opened"));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelmixError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_over_bg(&frame.data, &mut self.scratch, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelmixError::encode("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelmixError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        self.drain_ready(chunks)
    }

    fn finish(&mut self, chunks: &mut dyn FnMut(Vec<u8>)) -> ReelmixResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelmixError::encode("ffmpeg encoder not opened"))?;

        // The reader exits at EOF, which closes the channel.
        if let Some(rx) = self.stdout_rx.take() {
            for msg in rx {
                let chunk = msg.map_err(|e| {
                    ReelmixError::encode(format!("failed to read ffmpeg output: {e}"))
                })?;
                chunks(chunk);
            }
        }
        if let Some(handle) = self.stdout_reader.take() {
            handle
                .join()
                .map_err(|_| ReelmixError::encode("ffmpeg stdout reader thread panicked"))?;
        }

        let status = child.wait().map_err(|e| {
            ReelmixError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelmixError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelmixError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelmixError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// H.264 profile and level encoded in an `avc1.PPCCLL` codec string.
pub fn parse_avc1(codec: &str) -> Option<(&'static str, String)> {
    let hex = codec.strip_prefix("avc1.")?;
    if hex.len() != 6 {
        return None;
    }
    let profile_idc = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let level_idc = u8::from_str_radix(&hex[4..6], 16).ok()?;
    let profile = match profile_idc {
        0x42 => "baseline",
        0x4D => "main",
        0x64 => "high",
        _ => return None,
    };
    Some((profile, format!("{}.{}", level_idc / 10, level_idc % 10)))
}

/// ffmpeg output arguments for `codec`, or `CodecRejected` when it cannot be produced.
fn codec_args(codec: &CodecConfig) -> ReelmixResult<Vec<String>> {
    let (profile, level) = parse_avc1(&codec.codec).ok_or_else(|| {
        ReelmixError::codec_rejected(format!("unsupported codec string '{}'", codec.codec))
    })?;
    if !ffmpeg_has_encoder("libx264") {
        return Err(ReelmixError::codec_rejected(
            "ffmpeg was built without libx264",
        ));
    }
    let mut args = vec![
        "-c:v".to_owned(),
        "libx264".to_owned(),
        "-profile:v".to_owned(),
        profile.to_owned(),
        "-level:v".to_owned(),
        level,
    ];
    if codec.bitrate_bps > 0 {
        args.push("-b:v".to_owned());
        args.push(codec.bitrate_bps.to_string());
    }
    Ok(args)
}

/// Whether `listing` (output of `ffmpeg -encoders`) names the encoder `name`.
pub fn encoder_listed(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

/// Return `true` when the local `ffmpeg` offers the encoder `name`.
pub fn ffmpeg_has_encoder(name: &str) -> bool {
    Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map(|out| out.status.success() && encoder_listed(&String::from_utf8_lossy(&out.stdout), name))
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

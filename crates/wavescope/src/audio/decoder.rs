//! Symphonia-backed audio decoding
//!
//! Provides `SymphoniaSource` which decodes audio files into f32 samples,
//! supporting MP3, AAC, FLAC, Vorbis, WAV and friends, with coarse seeking
//! through the underlying format reader.

use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use rodio::Source;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions};
use symphonia::core::formats::{FormatOptions, SeekMode, SeekTo};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, ProbeResult};
use symphonia::core::units::Time;

use crate::config::timeouts::PROBE_TIMEOUT_SECS;
use crate::error::WaveError;

use super::types::TrackInfo;

/// Human-readable name for a symphonia codec type
pub fn codec_type_to_name(codec: symphonia::core::codecs::CodecType) -> &'static str {
    use symphonia::core::codecs::*;
    match codec {
        CODEC_TYPE_AAC => "AAC",
        CODEC_TYPE_FLAC => "FLAC",
        CODEC_TYPE_MP3 => "MP3",
        CODEC_TYPE_VORBIS => "Vorbis",
        CODEC_TYPE_PCM_U8 => "PCM 8-bit",
        CODEC_TYPE_PCM_S16LE | CODEC_TYPE_PCM_S16BE => "PCM 16-bit",
        CODEC_TYPE_PCM_S24LE | CODEC_TYPE_PCM_S24BE => "PCM 24-bit",
        CODEC_TYPE_PCM_S32LE | CODEC_TYPE_PCM_S32BE => "PCM 32-bit",
        CODEC_TYPE_PCM_F32LE | CODEC_TYPE_PCM_F32BE => "PCM 32-bit Float",
        CODEC_TYPE_PCM_F64LE | CODEC_TYPE_PCM_F64BE => "PCM 64-bit Float",
        CODEC_TYPE_PCM_ALAW => "PCM A-law",
        CODEC_TYPE_PCM_MULAW => "PCM u-law",
        _ => "Audio",
    }
}

/// Total stream duration, when the container declares enough to compute it
pub(crate) fn params_duration(params: &CodecParameters) -> Option<Duration> {
    params.time_base.zip(params.n_frames).map(|(tb, frames)| {
        let time = tb.calc_time(frames);
        Duration::from_secs_f64(time.seconds as f64 + time.frac)
    })
}

/// Adapter exposing any `Read + Seek` reader as a seekable media source
struct SeekableSource<R> {
    inner: R,
    len: Option<u64>,
}

impl<R: Read + Seek> SeekableSource<R> {
    fn new(mut inner: R) -> Self {
        let len = stream_len(&mut inner).ok();
        Self { inner, len }
    }
}

fn stream_len<R: Seek>(reader: &mut R) -> std::io::Result<u64> {
    let pos = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(pos))?;
    Ok(len)
}

impl<R: Read> Read for SeekableSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for SeekableSource<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<R: Read + Seek + Send + Sync> MediaSource for SeekableSource<R> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        self.len
    }
}

/// Probe a reader's container format on a background thread.
///
/// Returns immediately; the `"symphonia-probe"` thread sends its result
/// over the channel, so callers may poll with `try_recv()` or block with
/// `recv_timeout()`.
pub fn start_probe<R: Read + Seek + Send + Sync + 'static>(
    reader: R,
    format_hint: Option<String>,
) -> Result<Receiver<Result<ProbeResult, WaveError>>, WaveError> {
    let source = SeekableSource::new(reader);
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = format_hint.as_deref() {
        hint.with_extension(ext);
    }

    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::Builder::new()
        .name("symphonia-probe".to_string())
        .spawn(move || {
            let outcome = symphonia::default::get_probe()
                .format(
                    &hint,
                    mss,
                    &FormatOptions::default(),
                    &MetadataOptions::default(),
                )
                .map_err(|e| WaveError::Decode(format!("Probe error: {}", e)));
            let _ = tx.send(outcome);
        })
        .map_err(|e| WaveError::Audio(format!("Failed to spawn probe thread: {}", e)))?;

    Ok(rx)
}

/// A symphonia-based audio source decoding to interleaved f32 samples
pub struct SymphoniaSource {
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    format: Box<dyn symphonia::core::formats::FormatReader>,
    track_id: u32,
    sample_buf: Option<SampleBuffer<f32>>,
    sample_idx: usize,
    channels: u16,
    sample_rate: u32,
    codec_name: String,
    total_duration: Option<Duration>,
    /// Stores the last non-EOF error for the engine to check after the
    /// stream ends
    last_error: Arc<Mutex<Option<String>>>,
}

impl SymphoniaSource {
    /// Open a source from a reader, detecting the container format
    pub fn new<R: Read + Seek + Send + Sync + 'static>(reader: R) -> Result<Self, WaveError> {
        Self::new_with_hint(reader, None)
    }

    /// Open a source with an optional format hint (e.g., "mp3", "flac")
    ///
    /// Waits at most `PROBE_TIMEOUT_SECS` for the probe to finish.
    pub fn new_with_hint<R: Read + Seek + Send + Sync + 'static>(
        reader: R,
        format_hint: Option<&str>,
    ) -> Result<Self, WaveError> {
        let rx = start_probe(reader, format_hint.map(str::to_string))?;

        let probed = match rx.recv_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS)) {
            Ok(Ok(probed)) => probed,
            Ok(Err(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => {
                return Err(WaveError::Timeout(format!(
                    "No probe result within {}s",
                    PROBE_TIMEOUT_SECS
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(WaveError::Decode("Probe thread panicked".to_string()))
            }
        };

        Self::from_probed(probed)
    }

    /// Create a `SymphoniaSource` from a completed `ProbeResult`
    pub fn from_probed(probed: ProbeResult) -> Result<Self, WaveError> {
        let format = probed.format;

        let (track_id, codec_params) = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .map(|t| (t.id, t.codec_params.clone()))
            .ok_or_else(|| WaveError::Decode("No audio track found".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| WaveError::Decode(format!("Decoder creation error: {}", e)))?;

        let channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(2);
        let sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let codec_name = codec_type_to_name(codec_params.codec).to_string();
        let total_duration = params_duration(&codec_params);

        let mut source = Self {
            decoder,
            format,
            track_id,
            sample_buf: None,
            sample_idx: 0,
            channels,
            sample_rate,
            codec_name,
            total_duration,
            last_error: Arc::new(Mutex::new(None)),
        };

        // Pre-decode the first frame so the reported sample rate reflects
        // the decoder's real output before rodio configures resampling
        source.decode_next_packet();

        Ok(source)
    }

    /// Get the codec name (e.g., "MP3", "FLAC")
    pub fn codec_name(&self) -> &str {
        &self.codec_name
    }

    /// Handle to the error slot, read by the engine once the stream ends.
    ///
    /// After an abnormal end (an IO failure or a fatal decode error) the
    /// slot holds the message; a clean EOF leaves it empty.
    pub fn error_slot(&self) -> Arc<Mutex<Option<String>>> {
        self.last_error.clone()
    }

    /// Get stream details as a `TrackInfo`
    pub fn track_info(&self) -> TrackInfo {
        TrackInfo {
            codec_name: self.codec_name.clone(),
            channels: self.channels,
            sample_rate: self.sample_rate,
            duration: self.total_duration,
        }
    }

    /// Record a fatal stream error for the engine to read back later
    fn store_error(&self, e: impl std::fmt::Display) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(e.to_string());
        }
    }

    fn decode_next_packet(&mut self) -> bool {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    // Clean EOF, no error stored
                    return false;
                }
                Err(e) => {
                    self.store_error(e);
                    return false;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let frames = decoded.capacity() as u64;

                    self.sample_rate = spec.rate;
                    self.channels = spec.channels.count() as u16;

                    let undersized = self
                        .sample_buf
                        .as_ref()
                        .map_or(true, |buf| buf.capacity() < frames as usize);
                    if undersized {
                        self.sample_buf = Some(SampleBuffer::new(frames, spec));
                    }

                    if let Some(buf) = self.sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        self.sample_idx = 0;
                        return true;
                    }
                }
                Err(symphonia::core::errors::Error::DecodeError(_)) => {
                    // Corrupt frame, try the next packet
                }
                Err(e) => {
                    self.store_error(e);
                    return false;
                }
            }
        }
    }
}

impl Iterator for SymphoniaSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(buf) = self.sample_buf.as_ref() {
                if let Some(&sample) = buf.samples().get(self.sample_idx) {
                    self.sample_idx += 1;
                    return Some(sample);
                }
            }

            if !self.decode_next_packet() {
                return None;
            }
        }
    }
}

impl Source for SymphoniaSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> std::num::NonZero<u16> {
        std::num::NonZero::new(self.channels).unwrap_or(std::num::NonZero::<u16>::MIN)
    }

    fn sample_rate(&self) -> std::num::NonZero<u32> {
        std::num::NonZero::new(self.sample_rate).unwrap_or(std::num::NonZero::<u32>::MIN)
    }

    fn total_duration(&self) -> Option<Duration> {
        self.total_duration
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        let time = Time::new(pos.as_secs(), f64::from(pos.subsec_nanos()) / 1e9);
        self.format
            .seek(
                SeekMode::Coarse,
                SeekTo::Time {
                    time,
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| rodio::source::SeekError::Other(std::sync::Arc::new(e)))?;
        self.decoder.reset();
        self.sample_buf = None;
        self.sample_idx = 0;
        Ok(())
    }
}

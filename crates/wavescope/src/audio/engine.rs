//! Audio engine
//!
//! Runs playback on a dedicated thread, accepting commands via crossbeam
//! channels and emitting events back. Each routed track plays through its
//! own player connected to the shared output mixer; the route is swapped
//! through an [`AudioGraph`] so the new track is connected before the old
//! one is torn down, and the analysis tap keeps seeing a live signal
//! across song changes.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rodio::{DeviceSinkBuilder, Player};

use crate::config::audio::ENGINE_TICK_MS;
use crate::error::WaveError;

use super::decoder::SymphoniaSource;
use super::graph::{AudioGraph, SourcePort};
use super::tap::{SignalTap, TapSource};
use super::types::{
    new_shared_status, AudioCommand, AudioEvent, PlaybackState, PlayerStatus, ReadSeek,
    SharedStatus, TrackInfo,
};

/// One live route: a dedicated player feeding the shared output mixer
struct TrackPort {
    player: Player,
    info: TrackInfo,
    error_slot: Arc<Mutex<Option<String>>>,
}

impl SourcePort for TrackPort {
    fn disconnect(&mut self) {
        self.player.stop();
    }
}

/// Playback engine living on its own thread
pub struct AudioEngine {
    cmd_tx: Sender<AudioCommand>,
    event_rx: Receiver<AudioEvent>,
    tap: SignalTap,
    status: SharedStatus,
    thread: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Start the engine thread and open the audio output.
    ///
    /// Does not return until the output stream is up, or failed to open.
    pub fn new() -> Result<Self, WaveError> {
        let (cmd_tx, cmd_rx) = bounded::<AudioCommand>(16);
        let (event_tx, event_rx) = bounded::<AudioEvent>(64);
        let (init_tx, init_rx) = bounded::<Result<(), String>>(1);

        let tap = SignalTap::new();
        let tap_thread = tap.clone();

        let status = new_shared_status();
        let status_thread = status.clone();

        let thread = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                Self::run(cmd_rx, event_tx, init_tx, tap_thread, status_thread);
            })
            .map_err(|e| WaveError::Audio(format!("Failed to spawn audio thread: {}", e)))?;

        // The thread reports whether the output opened
        let init_result = init_rx
            .recv()
            .map_err(|_| WaveError::Audio("Audio thread terminated during init".to_string()))?;

        init_result.map_err(WaveError::Audio)?;

        Ok(Self {
            cmd_tx,
            event_rx,
            tap,
            status,
            thread: Some(thread),
        })
    }

    /// Queue a command for the engine thread
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    /// Route a new track from the given reader, replacing the current one
    pub fn play(&self, reader: Box<dyn ReadSeek>, format_hint: Option<String>) {
        self.send(AudioCommand::Play {
            reader,
            format_hint,
        });
    }

    /// Pause playback
    pub fn pause(&self) {
        self.send(AudioCommand::Pause);
    }

    /// Resume playback
    pub fn resume(&self) {
        self.send(AudioCommand::Resume);
    }

    /// Adjust playback volume, clamped to 0.0..=2.0
    pub fn set_volume(&self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume));
    }

    /// Jump to a position in the current track
    pub fn seek(&self, pos: Duration) {
        self.send(AudioCommand::Seek(pos));
    }

    /// Pull the next pending event, if any
    pub fn try_recv_event(&self) -> Option<AudioEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Borrow the event channel, handy for `select!` loops
    pub fn event_receiver(&self) -> &Receiver<AudioEvent> {
        &self.event_rx
    }

    /// Get a handle to the shared analysis tap
    pub fn tap(&self) -> SignalTap {
        self.tap.clone()
    }

    /// Get a handle to the polled playback status
    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    /// Stop the engine thread and wait for it to exit
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// Engine thread body
    fn run(
        cmd_rx: Receiver<AudioCommand>,
        event_tx: Sender<AudioEvent>,
        init_tx: Sender<Result<(), String>>,
        tap: SignalTap,
        status: SharedStatus,
    ) {
        // The output stream must live on this thread; cpal streams may be !Send
        let mut stream = match DeviceSinkBuilder::open_default_sink() {
            Ok(s) => s,
            Err(e) => {
                let _ = init_tx.send(Err(format!("Audio output unavailable: {}", e)));
                return;
            }
        };
        stream.log_on_drop(false);

        let _ = init_tx.send(Ok(()));

        let mut graph: AudioGraph<TrackPort> = AudioGraph::new();
        let mut state = PlaybackState::Stopped;
        let mut volume: f32 = 1.0;

        loop {
            match cmd_rx.recv_timeout(Duration::from_millis(ENGINE_TICK_MS)) {
                Ok(cmd) => match cmd {
                    AudioCommand::Play {
                        reader,
                        format_hint,
                    } => {
                        let result = graph.route(|| {
                            let source =
                                SymphoniaSource::new_with_hint(reader, format_hint.as_deref())?;
                            let info = source.track_info();
                            let error_slot = source.error_slot();
                            let player = Player::connect_new(stream.mixer());
                            player.set_volume(volume);
                            player.append(TapSource::new(source, tap.clone()));
                            player.play();
                            Ok(TrackPort {
                                player,
                                info,
                                error_slot,
                            })
                        });
                        match result {
                            Ok(()) => {
                                state = PlaybackState::Playing;
                                if let Some(port) = graph.current() {
                                    let _ = event_tx.send(AudioEvent::Playing(port.info.clone()));
                                }
                            }
                            Err(e) => {
                                // The previous route, if any, keeps playing
                                let _ = event_tx.send(AudioEvent::Error(e.to_string()));
                            }
                        }
                    }
                    AudioCommand::Pause => {
                        if state == PlaybackState::Playing {
                            if let Some(port) = graph.current() {
                                port.player.pause();
                            }
                            state = PlaybackState::Paused;
                            let _ = event_tx.send(AudioEvent::Paused);
                        }
                    }
                    AudioCommand::Resume => {
                        if state == PlaybackState::Paused {
                            if let Some(port) = graph.current() {
                                port.player.play();
                            }
                            state = PlaybackState::Playing;
                            let _ = event_tx.send(AudioEvent::Resumed);
                        }
                    }
                    AudioCommand::SetVolume(vol) => {
                        volume = vol.clamp(0.0, 2.0);
                        if let Some(port) = graph.current() {
                            port.player.set_volume(volume);
                        }
                    }
                    AudioCommand::Seek(pos) => {
                        if let Some(port) = graph.current() {
                            if let Err(e) = port.player.try_seek(pos) {
                                let _ =
                                    event_tx.send(AudioEvent::Error(format!("Seek failed: {}", e)));
                            }
                        }
                    }
                    AudioCommand::Shutdown => break,
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            // End-of-track detection
            if state == PlaybackState::Playing {
                let finished = graph.current().map(|p| p.player.empty()).unwrap_or(false);
                if finished {
                    state = PlaybackState::Stopped;
                    let failure = graph
                        .current()
                        .and_then(|p| p.error_slot.lock().ok())
                        .and_then(|mut slot| slot.take());
                    match failure {
                        Some(msg) => {
                            let _ =
                                event_tx.send(AudioEvent::Error(format!("Stream error: {}", msg)));
                        }
                        None => {
                            let _ = event_tx.send(AudioEvent::Finished);
                        }
                    }
                }
            }

            // Status snapshot for pollers
            if let Ok(mut st) = status.lock() {
                st.state = state;
                st.duration = graph.current().and_then(|p| p.info.duration);
                st.position = match graph.current() {
                    Some(port) if state != PlaybackState::Stopped => port.player.get_pos(),
                    _ => Duration::ZERO,
                };
            }
        }

        graph.clear();
        tap.reset();
        if let Ok(mut st) = status.lock() {
            *st = PlayerStatus::default();
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Minimal 16-bit PCM WAV file in memory
    fn make_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
        let block_align = channels * (bits_per_sample / 8);
        let data_size = (samples.len() * 2) as u32;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + samples.len() * 2);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            buf.extend_from_slice(&s.to_le_bytes());
        }
        buf
    }

    /// One second of mono sine
    fn make_one_second_wav() -> Vec<u8> {
        let samples: Vec<i16> = (0..44100)
            .map(|i| ((i as f32 * 0.09).sin() * 11000.0) as i16)
            .collect();
        make_wav(44100, 1, &samples)
    }

    /// Ten milliseconds of mono sine
    fn make_short_wav() -> Vec<u8> {
        let samples: Vec<i16> = (0..441)
            .map(|i| ((i as f32 * 0.4).sin() * 6000.0) as i16)
            .collect();
        make_wav(44100, 1, &samples)
    }

    /// Helper: wait for the next event within a timeout
    fn wait_for_event(engine: &AudioEngine, timeout_ms: u64) -> Option<AudioEvent> {
        let deadline = std::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Some(evt) = engine.try_recv_event() {
                return Some(evt);
            }
            if std::time::Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    /// Helper: block until the engine announces a playing track
    fn await_playing(engine: &AudioEngine) -> TrackInfo {
        match wait_for_event(engine, 2000) {
            Some(AudioEvent::Playing(info)) => info,
            other => panic!("wanted Playing, saw {:?}", other),
        }
    }

    /// Helper: try to create an engine; None if audio hardware is unavailable
    fn try_engine() -> Option<AudioEngine> {
        AudioEngine::new().ok()
    }

    // --- Lifecycle ---

    #[test]
    fn starts_and_shuts_down_cleanly() {
        let Some(engine) = try_engine() else { return };
        engine.shutdown();
    }

    #[test]
    fn dropping_the_engine_joins_the_thread() {
        let Some(engine) = try_engine() else { return };
        drop(engine);
        // Reaching this line means the join completed
    }

    #[test]
    fn fresh_engine_is_stopped_and_silent() {
        let Some(engine) = try_engine() else { return };

        let status = engine.status();
        assert_eq!(status.lock().unwrap().state, PlaybackState::Stopped);

        let tap = engine.tap();
        let mut time = vec![0u8; tap.buffer_len()];
        tap.time_domain(&mut time);
        assert!(time.iter().all(|&b| b == 128));

        engine.shutdown();
    }

    // --- Play ---

    #[test]
    fn play_emits_track_info() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(make_one_second_wav())), None);

        let info = await_playing(&engine);
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 44100);
        assert!(!info.codec_name.is_empty());
        let duration = info.duration.expect("wav duration should be known");
        assert!((duration.as_secs_f64() - 1.0).abs() < 0.05);

        engine.shutdown();
    }

    #[test]
    fn second_play_swaps_the_route() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(make_one_second_wav())), None);
        await_playing(&engine);

        // Route a second clip without any stop in between
        let samples: Vec<i16> = (0..60000)
            .map(|i| ((i as f32 * 0.15).sin() * 9000.0) as i16)
            .collect();
        let wav2 = make_wav(48000, 2, &samples);
        engine.play(Box::new(Cursor::new(wav2)), None);

        let info = await_playing(&engine);
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 48000);

        engine.shutdown();
    }

    #[test]
    fn finished_event_after_short_clip() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(make_short_wav())), None);
        await_playing(&engine);

        match wait_for_event(&engine, 3000) {
            Some(AudioEvent::Finished) => {}
            other => panic!("wanted Finished, saw {:?}", other),
        }

        engine.shutdown();
    }

    // --- Pause / Resume ---

    #[test]
    fn pause_and_resume_round_trip() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(make_one_second_wav())), None);
        await_playing(&engine);

        engine.pause();
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Paused) => {}
            other => panic!("wanted Paused, saw {:?}", other),
        }

        engine.resume();
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Resumed) => {}
            other => panic!("wanted Resumed, saw {:?}", other),
        }

        engine.shutdown();
    }

    #[test]
    fn pause_when_stopped_is_ignored() {
        let Some(engine) = try_engine() else { return };

        engine.pause();
        thread::sleep(Duration::from_millis(300));
        assert!(engine.try_recv_event().is_none());

        engine.shutdown();
    }

    // --- Error handling ---

    #[test]
    fn garbage_input_surfaces_an_error_event() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(vec![0u8; 100])), None);

        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Error(msg)) => {
                assert!(!msg.is_empty(), "engine error should carry a message");
            }
            other => panic!("wanted Error, saw {:?}", other),
        }

        engine.shutdown();
    }

    #[test]
    fn failed_replacement_keeps_the_current_track_playing() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(make_one_second_wav())), None);
        await_playing(&engine);

        // A bad replacement must not tear down the live route
        engine.play(Box::new(Cursor::new(vec![0u8; 64])), None);
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Error(_)) => {}
            other => panic!("wanted Error, saw {:?}", other),
        }

        thread::sleep(Duration::from_millis(300));
        let status = engine.status();
        assert_eq!(status.lock().unwrap().state, PlaybackState::Playing);

        engine.shutdown();
    }

    // --- Seek / status ---

    #[test]
    fn seek_moves_the_reported_position() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(make_one_second_wav())), None);
        await_playing(&engine);

        engine.seek(Duration::from_millis(500));
        thread::sleep(Duration::from_millis(300));

        let status = engine.status();
        let position = status.lock().unwrap().position;
        assert!(
            position >= Duration::from_millis(450),
            "position should have jumped, got {:?}",
            position
        );

        engine.shutdown();
    }

    #[test]
    fn status_tracks_duration_while_playing() {
        let Some(engine) = try_engine() else { return };

        engine.play(Box::new(Cursor::new(make_one_second_wav())), None);
        await_playing(&engine);

        thread::sleep(Duration::from_millis(300));
        let status = engine.status();
        let snapshot = status.lock().unwrap().clone();
        assert_eq!(snapshot.state, PlaybackState::Playing);
        let duration = snapshot.duration.expect("duration should be known");
        assert!((duration.as_secs_f64() - 1.0).abs() < 0.05);

        engine.shutdown();
    }

    // --- Tap integration ---

    #[test]
    fn tap_sees_signal_while_a_track_plays() {
        let Some(engine) = try_engine() else { return };

        let tap = engine.tap();
        engine.play(Box::new(Cursor::new(make_one_second_wav())), None);
        await_playing(&engine);

        thread::sleep(Duration::from_millis(400));
        let mut time = vec![0u8; tap.buffer_len()];
        tap.time_domain(&mut time);
        assert!(
            time.iter().any(|&b| b != 128),
            "tap should capture the playing waveform"
        );

        engine.shutdown();
    }
}

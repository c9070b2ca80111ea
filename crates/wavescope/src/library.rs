//! Song library
//!
//! Builds the playable song list from a manifest-driven directory scan
//! plus any user-supplied files. Each entry is probed with symphonia for
//! its duration and tags; entries that fail to probe are skipped with a
//! warning so one bad file never blocks the rest of the list.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::meta::{MetadataRevision, StandardTagKey};

use crate::audio::decoder::{self, start_probe};
use crate::config::library::MANIFEST_FILE;
use crate::config::timeouts::PROBE_TIMEOUT_SECS;
use crate::error::{Result, WaveError};

/// One playable song
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// Path to the audio file
    pub path: PathBuf,
    /// Display name: "artist - title", the title alone, or the file stem
    pub name: String,
    /// Duration in seconds (0.0 when unknown)
    pub length: f32,
    /// Whether the song was supplied by the user rather than the manifest
    pub custom: bool,
}

/// Pull artist/title out of a metadata revision, skipping empty values
fn collect_tags(rev: &MetadataRevision, artist: &mut Option<String>, title: &mut Option<String>) {
    for tag in rev.tags() {
        let value = tag.value.to_string();
        if value.is_empty() {
            continue;
        }
        match tag.std_key {
            Some(StandardTagKey::Artist) => *artist = Some(value),
            Some(StandardTagKey::TrackTitle) => *title = Some(value),
            _ => {}
        }
    }
}

impl Song {
    /// Probe an audio file for its tags and duration.
    ///
    /// Blocks for up to `PROBE_TIMEOUT_SECS`. The name falls back to the
    /// file stem when no title tag is present.
    pub fn probe(path: &Path, custom: bool) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| WaveError::Library(format!("Failed to open {}: {}", path.display(), e)))?;

        let format_hint = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());

        let rx = start_probe(file, format_hint)?;
        let mut probed = match rx.recv_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS)) {
            Ok(Ok(probed)) => probed,
            Ok(Err(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => {
                return Err(WaveError::Timeout(format!(
                    "Probe timed out for {}",
                    path.display()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(WaveError::Decode("Probe thread panicked".to_string()))
            }
        };

        // Container metadata first (vorbis comments, FLAC tags), then
        // anything the probe collected on the way in (ID3)
        let mut artist = None;
        let mut title = None;
        if let Some(rev) = probed.format.metadata().current() {
            collect_tags(rev, &mut artist, &mut title);
        }
        if artist.is_none() && title.is_none() {
            if let Some(metadata) = probed.metadata.get() {
                if let Some(rev) = metadata.current() {
                    collect_tags(rev, &mut artist, &mut title);
                }
            }
        }

        let length = probed
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .and_then(|t| decoder::params_duration(&t.codec_params))
            .map(|d| d.as_secs_f32())
            .unwrap_or(0.0);

        let name = match (artist, title) {
            (Some(artist), Some(title)) => format!("{} - {}", artist, title),
            (None, Some(title)) => title,
            _ => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| path.display().to_string()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            name,
            length,
            custom,
        })
    }
}

/// The playable song list
#[derive(Debug, Default)]
pub struct Library {
    songs: Vec<Song>,
}

impl Library {
    /// Create an empty library
    pub fn new() -> Self {
        Self { songs: Vec::new() }
    }

    /// Build a library from `<dir>/list.txt`, one relative filename per
    /// non-empty line.
    ///
    /// An unreadable manifest is an error; individual entries that fail to
    /// probe are skipped with a warning.
    pub fn load_manifest(dir: &Path) -> Result<Self> {
        let manifest = dir.join(MANIFEST_FILE);
        let contents = fs::read_to_string(&manifest).map_err(|e| {
            WaveError::Library(format!(
                "Failed to read manifest {}: {}",
                manifest.display(),
                e
            ))
        })?;

        let mut library = Self::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let path = dir.join(line);
            match Song::probe(&path, false) {
                Ok(song) => library.songs.push(song),
                Err(e) => eprintln!("Skipping {}: {}", path.display(), e),
            }
        }

        library.sort();
        Ok(library)
    }

    /// Probe user-supplied files and append them as custom songs.
    ///
    /// Returns how many were added; failures are skipped with a warning.
    pub fn add_files(&mut self, paths: &[PathBuf]) -> usize {
        let mut added = 0;
        for path in paths {
            match Song::probe(path, true) {
                Ok(song) => {
                    self.songs.push(song);
                    added += 1;
                }
                Err(e) => eprintln!("Skipping {}: {}", path.display(), e),
            }
        }
        if added > 0 {
            self.sort();
        }
        added
    }

    /// Sort: manifest songs before custom ones, ties broken by name
    pub fn sort(&mut self) {
        self.songs
            .sort_by(|a, b| a.custom.cmp(&b.custom).then_with(|| a.name.cmp(&b.name)));
    }

    /// All songs in display order
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Get a song by index
    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    /// Number of songs
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Check if the library has no songs
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT_ID: AtomicU32 = AtomicU32::new(0);

    fn temp_song_dir() -> PathBuf {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let dir = temp_dir().join(format!("wavescope_lib_test_{}", id));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Hand-assembled 16-bit PCM WAV file
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

    fn write_one_second_wav(path: &Path) {
        let samples: Vec<i16> = (0..44100)
            .map(|i| ((i as f32 * 0.11).sin() * 9500.0) as i16)
            .collect();
        let mut file = File::create(path).unwrap();
        file.write_all(&make_wav(44100, 1, &samples)).unwrap();
    }

    fn song(name: &str, custom: bool) -> Song {
        Song {
            path: PathBuf::from(format!("{}.wav", name)),
            name: name.to_string(),
            length: 1.0,
            custom,
        }
    }

    // --- Probing ---

    #[test]
    fn probe_reads_duration_and_falls_back_to_stem() {
        let dir = temp_song_dir();
        let path = dir.join("ambient track.wav");
        write_one_second_wav(&path);

        let song = Song::probe(&path, false).unwrap();
        assert_eq!(song.name, "ambient track");
        assert!((song.length - 1.0).abs() < 0.05);
        assert!(!song.custom);
        assert_eq!(song.path, path);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn probe_missing_file_is_an_error() {
        let dir = temp_song_dir();
        let result = Song::probe(&dir.join("not_there.wav"), false);
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn probe_garbage_file_is_an_error() {
        let dir = temp_song_dir();
        let path = dir.join("garbage.mp3");
        fs::write(&path, vec![0u8; 256]).unwrap();

        let result = Song::probe(&path, false);
        assert!(result.is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    // --- Manifest loading ---

    #[test]
    fn load_manifest_probes_listed_songs() {
        let dir = temp_song_dir();
        write_one_second_wav(&dir.join("one.wav"));
        write_one_second_wav(&dir.join("two.wav"));
        fs::write(dir.join(MANIFEST_FILE), "one.wav\ntwo.wav\n").unwrap();

        let library = Library::load_manifest(&dir).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.songs()[0].name, "one");
        assert_eq!(library.songs()[1].name, "two");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_manifest_skips_entries_that_fail_to_probe() {
        let dir = temp_song_dir();
        write_one_second_wav(&dir.join("good.wav"));
        fs::write(dir.join("broken.mp3"), vec![0u8; 64]).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            "good.wav\nmissing.flac\nbroken.mp3\n",
        )
        .unwrap();

        let library = Library::load_manifest(&dir).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.songs()[0].name, "good");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_manifest_ignores_blank_lines() {
        let dir = temp_song_dir();
        write_one_second_wav(&dir.join("only.wav"));
        fs::write(dir.join(MANIFEST_FILE), "\nonly.wav\n\n  \n").unwrap();

        let library = Library::load_manifest(&dir).unwrap();
        assert_eq!(library.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_manifest_missing_is_an_error() {
        let dir = temp_song_dir();
        let result = Library::load_manifest(&dir);
        assert!(matches!(result, Err(WaveError::Library(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    // --- Custom files and ordering ---

    #[test]
    fn add_files_marks_songs_custom() {
        let dir = temp_song_dir();
        let path = dir.join("extra.wav");
        write_one_second_wav(&path);

        let mut library = Library::new();
        let added = library.add_files(&[path]);
        assert_eq!(added, 1);
        assert!(library.songs()[0].custom);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn add_files_skips_unreadable_paths() {
        let dir = temp_song_dir();
        let good = dir.join("ok.wav");
        write_one_second_wav(&good);

        let mut library = Library::new();
        let added = library.add_files(&[dir.join("nope.wav"), good]);
        assert_eq!(added, 1);
        assert_eq!(library.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn sort_puts_manifest_songs_before_custom_ones() {
        let mut library = Library {
            songs: vec![
                song("zeta", false),
                song("added", true),
                song("alpha", false),
            ],
        };
        library.sort();

        let names: Vec<_> = library.songs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta", "added"]);
    }

    #[test]
    fn sort_breaks_ties_by_name() {
        let mut library = Library {
            songs: vec![song("b", true), song("a", true), song("c", true)],
        };
        library.sort();

        let names: Vec<_> = library.songs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}

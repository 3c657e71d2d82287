// Note Timeline - Write-once note events and the finished composition
// The timeline is the sole output of the composition engine

use serde::{Deserialize, Serialize};

use crate::GENERATOR_VERSION;

/// The five instrument tracks of an arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackId {
    Drums,
    Bass,
    Chords,
    Melody,
    Pad,
}

impl TrackId {
    /// All tracks in stable order
    pub const ALL: [TrackId; 5] = [
        TrackId::Drums,
        TrackId::Bass,
        TrackId::Chords,
        TrackId::Melody,
        TrackId::Pad,
    ];

    /// Stable track index (also used as the MIDI channel for pitched tracks)
    pub fn index(&self) -> usize {
        match self {
            TrackId::Drums => 0,
            TrackId::Bass => 1,
            TrackId::Chords => 2,
            TrackId::Melody => 3,
            TrackId::Pad => 4,
        }
    }

    /// MIDI channel: percussion on channel 10 (0-indexed 9)
    pub fn channel(&self) -> u8 {
        match self {
            TrackId::Drums => 9,
            other => other.index() as u8,
        }
    }

    /// Display name used as MIDI track name
    pub fn name(&self) -> &'static str {
        match self {
            TrackId::Drums => "Drums",
            TrackId::Bass => "Bass",
            TrackId::Chords => "Chords",
            TrackId::Melody => "Melody",
            TrackId::Pad => "Pad",
        }
    }
}

/// A single timed note event; never mutated after creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub track: TrackId,

    /// MIDI channel (9 for percussion, track index otherwise)
    pub channel: u8,

    /// MIDI pitch 0-127
    pub pitch: u8,

    /// Absolute start time in beats from the top of the song
    pub start_beat: f64,

    /// Duration in beats
    pub beats: f64,

    /// MIDI velocity 0-127
    pub velocity: u8,
}

/// Ordered, append-only collection of note events for a whole run
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<NoteEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Timeline { events: Vec::new() }
    }

    /// Append one note event.
    ///
    /// This is the only write path: velocity is clamped to 0-127, pitch is
    /// clamped into MIDI range, and zero/negative durations are dropped so a
    /// degenerate upstream computation can never corrupt the timeline.
    pub fn add_note(&mut self, track: TrackId, pitch: i32, start_beat: f64, beats: f64, velocity: i32) {
        if beats <= 0.0 || start_beat < 0.0 {
            return;
        }
        let pitch = pitch.clamp(0, 127) as u8;
        let velocity = velocity.clamp(0, 127) as u8;
        self.events.push(NoteEvent {
            track,
            channel: track.channel(),
            pitch,
            start_beat,
            beats,
            velocity,
        });
    }

    /// All events in append order
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Events belonging to one track, in append order
    pub fn track_events(&self, track: TrackId) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter(move |e| e.track == track)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn into_events(self) -> Vec<NoteEvent> {
        self.events
    }
}

/// Per-track metadata handed to the encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub track: TrackId,
    pub name: String,

    /// GM program number; `None` for percussion and omitted instruments
    pub program: Option<u8>,
}

/// A finished composition: the note timeline plus everything the MIDI
/// encoder needs (tempo, track names, program numbers, title)
#[derive(Debug, Clone)]
pub struct Composition {
    pub title: String,
    pub seed: u64,
    pub bpm: u32,
    pub total_beats: f64,
    pub tracks: Vec<TrackInfo>,
    pub events: Vec<NoteEvent>,
}

impl Composition {
    /// Title string encoding the generator version and the seed
    pub fn title_for_seed(seed: u64) -> String {
        format!("HitFactory_v{}_Seed_{}", GENERATOR_VERSION, seed)
    }

    /// Filename-safe variant of the title (whitespace and colons sanitized)
    pub fn filename(&self) -> String {
        let safe = self.title.replace(' ', "_").replace(':', "-");
        format!("{}.mid", safe)
    }

    /// Approximate song duration in seconds at the composition tempo
    pub fn duration_seconds(&self) -> f64 {
        self.total_beats / self.bpm as f64 * 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_channels() {
        assert_eq!(TrackId::Drums.channel(), 9);
        assert_eq!(TrackId::Bass.channel(), 1);
        assert_eq!(TrackId::Chords.channel(), 2);
        assert_eq!(TrackId::Melody.channel(), 3);
        assert_eq!(TrackId::Pad.channel(), 4);
    }

    #[test]
    fn test_add_note_clamps() {
        let mut timeline = Timeline::new();
        timeline.add_note(TrackId::Melody, 200, 0.0, 1.0, 300);
        timeline.add_note(TrackId::Melody, -5, 1.0, 1.0, -20);

        let events = timeline.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].pitch, 127);
        assert_eq!(events[0].velocity, 127);
        assert_eq!(events[1].pitch, 0);
        assert_eq!(events[1].velocity, 0);
    }

    #[test]
    fn test_add_note_drops_degenerate_durations() {
        let mut timeline = Timeline::new();
        timeline.add_note(TrackId::Bass, 40, 0.0, 0.0, 90);
        timeline.add_note(TrackId::Bass, 40, 0.0, -1.0, 90);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_track_events_filter() {
        let mut timeline = Timeline::new();
        timeline.add_note(TrackId::Drums, 36, 0.0, 0.5, 100);
        timeline.add_note(TrackId::Bass, 40, 0.0, 1.0, 90);
        timeline.add_note(TrackId::Drums, 38, 1.0, 0.5, 100);

        assert_eq!(timeline.track_events(TrackId::Drums).count(), 2);
        assert_eq!(timeline.track_events(TrackId::Bass).count(), 1);
        assert_eq!(timeline.track_events(TrackId::Pad).count(), 0);
    }

    #[test]
    fn test_filename_sanitization() {
        let composition = Composition {
            title: "HitFactory v0.7.2: Seed 42".to_string(),
            seed: 42,
            bpm: 120,
            total_beats: 16.0,
            tracks: Vec::new(),
            events: Vec::new(),
        };
        assert_eq!(composition.filename(), "HitFactory_v0.7.2-_Seed_42.mid");
    }

    #[test]
    fn test_title_encodes_version_and_seed() {
        let title = Composition::title_for_seed(42);
        assert!(title.contains(GENERATOR_VERSION));
        assert!(title.ends_with("Seed_42"));
    }
}

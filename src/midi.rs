// MIDI Export - Convert compositions to MIDI files using midly crate
// Format 1 (parallel) with a meta track followed by one track per instrument

use midly::{Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::{Composition, TrackId};

/// MIDI export options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - typically 480 or 960
    pub ppq: u16,

    /// Include tempo metadata
    pub include_tempo: bool,

    /// Include time signature metadata
    pub include_time_signature: bool,

    /// Include track names
    pub track_names: bool,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            include_tempo: true,
            include_time_signature: true,
            track_names: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum MidiExportError {
    #[error("failed to encode MIDI: {0}")]
    Encode(String),
}

/// Export a composition to MIDI file bytes.
///
/// Track 0 carries the title, tempo and time signature; each instrument
/// track carries its name, a program change for pitched instruments, and
/// its note on/off pairs in delta time.
pub fn export_midi(
    composition: &Composition,
    options: &MidiExportOptions,
) -> Result<Vec<u8>, MidiExportError> {
    let header = Header {
        format: midly::Format::Parallel,
        timing: Timing::Metrical(options.ppq.into()),
    };
    let ticks_per_beat = options.ppq as f64;

    let mut tracks = Vec::with_capacity(composition.tracks.len() + 1);

    let mut meta_track = Track::new();
    if options.track_names {
        meta_track.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(composition.title.as_bytes())),
        });
    }
    if options.include_tempo {
        let us_per_quarter = 60_000_000 / composition.bpm.max(1);
        meta_track.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter.into())),
        });
    }
    if options.include_time_signature {
        // 4/4, quarter-note click, eight 32nds per quarter
        meta_track.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
        });
    }
    meta_track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    tracks.push(meta_track);

    for info in &composition.tracks {
        let mut track = Track::new();
        if options.track_names {
            track.push(TrackEvent {
                delta: 0.into(),
                kind: TrackEventKind::Meta(MetaMessage::TrackName(info.name.as_bytes())),
            });
        }
        if info.track != TrackId::Drums {
            if let Some(program) = info.program {
                track.push(TrackEvent {
                    delta: 0.into(),
                    kind: TrackEventKind::Midi {
                        channel: info.track.channel().into(),
                        message: MidiMessage::ProgramChange {
                            program: program.into(),
                        },
                    },
                });
            }
        }

        let mut events: Vec<(u32, TrackEventKind)> = Vec::new();
        for note in composition.events.iter().filter(|e| e.track == info.track) {
            let tick_on = (note.start_beat * ticks_per_beat).round() as u32;
            let tick_off = ((note.start_beat + note.beats) * ticks_per_beat).round() as u32;

            events.push((
                tick_on,
                TrackEventKind::Midi {
                    channel: note.channel.into(),
                    message: MidiMessage::NoteOn {
                        key: note.pitch.into(),
                        vel: note.velocity.into(),
                    },
                },
            ));
            events.push((
                tick_off,
                TrackEventKind::Midi {
                    channel: note.channel.into(),
                    message: MidiMessage::NoteOff {
                        key: note.pitch.into(),
                        vel: 0.into(),
                    },
                },
            ));
        }
        events.sort_by_key(|(tick, _)| *tick);

        let mut last_tick = 0u32;
        for (tick, kind) in events {
            let delta = tick.saturating_sub(last_tick);
            track.push(TrackEvent {
                delta: delta.into(),
                kind,
            });
            last_tick = tick;
        }

        // One bar of silence before the end marker
        let end_tick = last_tick + (ticks_per_beat * 4.0) as u32;
        track.push(TrackEvent {
            delta: (end_tick - last_tick).into(),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        tracks.push(track);
    }

    let smf = Smf { header, tracks };
    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| MidiExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use crate::config::GenerationConfig;
    use std::io::Write;

    fn test_composition() -> Composition {
        let mut config = GenerationConfig::default();
        config.seed = Some(1234);
        compose(&config).expect("compose")
    }

    #[test]
    fn test_export_parses_back() {
        let composition = test_composition();
        let bytes = export_midi(&composition, &MidiExportOptions::default()).expect("export");

        let smf = Smf::parse(&bytes).expect("parse");
        assert_eq!(smf.header.format, midly::Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(480.into()));
        // Meta track plus the five instrument tracks
        assert_eq!(smf.tracks.len(), 6);
    }

    #[test]
    fn test_tempo_meta_matches_bpm() {
        let composition = test_composition();
        let bytes = export_midi(&composition, &MidiExportOptions::default()).expect("export");
        let smf = Smf::parse(&bytes).expect("parse");

        let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        assert_eq!(tempo, Some(60_000_000 / composition.bpm));
    }

    #[test]
    fn test_pitched_tracks_carry_program_changes() {
        let composition = test_composition();
        let bytes = export_midi(&composition, &MidiExportOptions::default()).expect("export");
        let smf = Smf::parse(&bytes).expect("parse");

        // Drums track (index 1) has no program change
        let has_program = |track: &[TrackEvent]| {
            track.iter().any(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::ProgramChange { .. },
                        ..
                    }
                )
            })
        };
        assert!(!has_program(&smf.tracks[1]));
        for track in &smf.tracks[2..] {
            assert!(has_program(track));
        }
    }

    #[test]
    fn test_note_on_off_pairs_balance() {
        let composition = test_composition();
        let bytes = export_midi(&composition, &MidiExportOptions::default()).expect("export");
        let smf = Smf::parse(&bytes).expect("parse");

        for track in &smf.tracks[1..] {
            let mut on = 0usize;
            let mut off = 0usize;
            for event in track {
                match event.kind {
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOn { .. },
                        ..
                    } => on += 1,
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOff { .. },
                        ..
                    } => off += 1,
                    _ => {}
                }
            }
            assert_eq!(on, off);
        }
    }

    #[test]
    fn test_drum_events_on_channel_ten() {
        let composition = test_composition();
        let bytes = export_midi(&composition, &MidiExportOptions::default()).expect("export");
        let smf = Smf::parse(&bytes).expect("parse");

        for event in &smf.tracks[1] {
            if let TrackEventKind::Midi { channel, .. } = event.kind {
                assert_eq!(channel.as_int(), 9);
            }
        }
    }

    #[test]
    fn test_file_round_trip() {
        let composition = test_composition();
        let bytes = export_midi(&composition, &MidiExportOptions::default()).expect("export");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(composition.filename());
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(&bytes).expect("write");

        let read_back = std::fs::read(&path).expect("read");
        assert_eq!(read_back, bytes);
        Smf::parse(&read_back).expect("parse");
    }

    #[test]
    fn test_options_can_disable_metadata() {
        let composition = test_composition();
        let options = MidiExportOptions {
            include_tempo: false,
            include_time_signature: false,
            track_names: false,
            ..MidiExportOptions::default()
        };
        let bytes = export_midi(&composition, &options).expect("export");
        let smf = Smf::parse(&bytes).expect("parse");

        let has_meta = smf.tracks[0].iter().any(|e| {
            matches!(
                e.kind,
                TrackEventKind::Meta(MetaMessage::Tempo(_))
                    | TrackEventKind::Meta(MetaMessage::TimeSignature(..))
                    | TrackEventKind::Meta(MetaMessage::TrackName(_))
            )
        });
        assert!(!has_meta);
    }
}

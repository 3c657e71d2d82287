// Bass Renderer - Root-anchored lines with chord-tone walks and passing tones
// Pitches stay inside the MIDI 24-60 bass register

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::Genre;
use crate::params::{ParamSet, RhythmPersonality};
use crate::sections::{SectionProfile, SectionType};
use crate::theory::{build_voicing, scale_tones, Chord, ScaleKind};
use crate::timeline::{Timeline, TrackId};

/// Renders the bass part for one section over its chord progression.
///
/// Chorus peaks (outside Ballad and RetroSynthwave) drive straight eighths on
/// the root. Ballads sustain one root per chord. Everything else walks in
/// steps, mixing chord tones and diatonic passing tones.
pub fn render_bass(
    timeline: &mut Timeline,
    progression: &[Chord],
    start_beat: f64,
    section: SectionType,
    profile: &SectionProfile,
    params: &ParamSet,
    key_root: u8,
    is_major: bool,
    rng: &mut Pcg32,
) {
    let scale_pcs = scale_tones(key_root, is_major, ScaleKind::Diatonic);
    let total_beats: f64 = progression.iter().map(|c| c.beats).sum();
    let mut current_beat = start_beat;

    for chord in progression {
        let mut velocity = profile.velocity_base;
        if profile.build_tension && total_beats > 0.0 {
            let progress = (current_beat - start_beat) / total_beats;
            velocity = ((profile.velocity_base as f64 + 15.0 * progress) as i32).min(110);
        }

        let mut octave_root = chord.root - 12;
        if octave_root < 24 {
            octave_root += 12;
        }
        let chord_tones = build_voicing(chord.root, chord.quality, 2, 3);

        let drives_eighths = profile.is_peak_section
            && section == SectionType::Chorus
            && !matches!(params.genre, Genre::Ballad | Genre::RetroSynthwave);

        if drives_eighths {
            let step = 0.5;
            let steps = (chord.beats / step) as usize;
            for step_idx in 0..steps {
                let mut pitch = octave_root;
                if step_idx % 2 == 1 && chord_tones.len() > 1 && rng.gen::<f64>() < 0.4 {
                    pitch = if chord_tones[1] < 60 { chord_tones[1] } else { octave_root };
                }
                // Accent the downbeat of every other beat
                let accent = if step_idx % 4 == 0 { 5 } else { 0 };
                timeline.add_note(
                    TrackId::Bass,
                    pitch,
                    current_beat + step_idx as f64 * step,
                    step - 0.02,
                    (velocity + accent).min(127),
                );
            }
        } else if params.genre == Genre::Ballad {
            timeline.add_note(TrackId::Bass, octave_root, current_beat, chord.beats - 0.1, velocity);
        } else {
            let step = match params.rhythm_personality {
                RhythmPersonality::EdmPulse if profile.is_peak_section => 0.25,
                RhythmPersonality::HipHopGroove => *[0.5, 1.0].choose(rng).unwrap_or(&0.5),
                _ => 0.5,
            };
            let steps = ((chord.beats / step) as usize).max(1);
            let mut last_pitch: Option<i32> = None;

            for step_idx in 0..steps {
                let beat = current_beat + step_idx as f64 * step;
                let mut beats = step;
                if beat + beats > current_beat + chord.beats {
                    beats = current_beat + chord.beats - beat;
                }
                if beats <= 0.05 {
                    continue;
                }

                let mut pitch = octave_root;
                let note_velocity = if step_idx == 0 { (velocity + 5).min(127) } else { velocity };

                if params.rhythm_personality == RhythmPersonality::HipHopGroove
                    && step_idx == 0
                    && rng.gen::<f64>() < 0.4
                {
                    // Occasional sub drop sustained under the whole chord
                    let sub = if octave_root >= 36 { octave_root - 12 } else { octave_root };
                    timeline.add_note(TrackId::Bass, sub, beat, chord.beats - 0.1, note_velocity);
                    break;
                }

                if step_idx > 0 && rng.gen::<f64>() < 0.6 {
                    let mut options: Vec<i32> = chord_tones
                        .iter()
                        .copied()
                        .filter(|&t| (24..60).contains(&t))
                        .collect();
                    if options.is_empty() {
                        options.push(octave_root);
                    }

                    if last_pitch.is_some() && rng.gen::<f64>() < 0.4 {
                        let last = last_pitch.unwrap_or(octave_root);
                        let target = *options.choose(rng).unwrap_or(&octave_root);
                        let diff = target - last;
                        if diff.abs() > 1 && diff.abs() <= 4 {
                            let dir = if diff > 0 { 1 } else { -1 };
                            let passing_pc = ((last + dir).rem_euclid(12)) as u8;
                            if scale_pcs.contains(&passing_pc) {
                                let candidates: Vec<i32> = (1..diff.abs())
                                    .map(|i| last + dir * i)
                                    .filter(|n| n.rem_euclid(12) as u8 == passing_pc)
                                    .collect();
                                if let Some(&passing) = candidates.choose(rng) {
                                    pitch = passing;
                                }
                            }
                        }
                    } else {
                        pitch = *options.choose(rng).unwrap_or(&octave_root);
                    }
                }

                if pitch < 24 {
                    pitch += 12;
                }
                if pitch > 60 {
                    pitch -= 12;
                }
                timeline.add_note(TrackId::Bass, pitch, beat, beats - 0.02, note_velocity);
                last_pitch = Some(pitch);
            }
        }

        current_beat += chord.beats;
    }
}

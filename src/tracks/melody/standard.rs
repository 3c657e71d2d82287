// Standard Motif Melody - Motif creation, variation and stepwise phrase walks
// Hook sections establish a motif on first appearance and restate it,
// usually varied, on every later appearance of the same section type

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::params::{ComplexityTier, Motif, MotifNote, ParamSet, RunState};
use crate::sections::{MelodyStyle, SectionProfile, SectionType};
use crate::theory::{scale_tones, Chord, ScaleKind};
use crate::timeline::{Timeline, TrackId};

use super::{fold_to_melodic_range, MelodyGenerator};

fn melodic_scale(key_root: u8, is_major: bool, style: MelodyStyle, rng: &mut Pcg32) -> Vec<u8> {
    // Bridges always use the full scale; elsewhere the pentatonic dominates
    if style == MelodyStyle::BridgeDistinct || rng.gen::<f64>() < 0.3 {
        scale_tones(key_root, is_major, ScaleKind::Diatonic)
    } else if is_major {
        scale_tones(key_root, is_major, ScaleKind::MajorPentatonic)
    } else {
        scale_tones(key_root, is_major, ScaleKind::MinorPentatonic)
    }
}

fn chord_tone_pcs(chord: &Chord, key_root: u8) -> Vec<u8> {
    let pcs = chord.quality.pitch_classes(chord.root);
    if pcs.is_empty() {
        vec![key_root % 12]
    } else {
        pcs
    }
}

/// Creates a short motif over the section's home chord.
pub fn create_motif(
    motif_beats: f64,
    home_chord: &Chord,
    key_root: u8,
    is_major: bool,
    tier: ComplexityTier,
    style: MelodyStyle,
    rng: &mut Pcg32,
) -> Motif {
    let bridge = style == MelodyStyle::BridgeDistinct;
    let scale_pcs = if bridge {
        scale_tones(key_root, is_major, ScaleKind::Diatonic)
    } else if is_major {
        scale_tones(key_root, is_major, ScaleKind::MajorPentatonic)
    } else {
        scale_tones(key_root, is_major, ScaleKind::MinorPentatonic)
    };
    let chord_pcs = chord_tone_pcs(home_chord, key_root);

    let mut base_octave: i32 = 5;
    if bridge && rng.gen::<f64>() < 0.3 {
        base_octave = *[4, 5, 6].choose(rng).unwrap_or(&5);
    }

    let start_pc = if bridge && chord_pcs.len() > 1 {
        // Bridges start from the upper chord tones
        *chord_pcs[chord_pcs.len() / 2..].choose(rng).unwrap_or(&chord_pcs[0])
    } else {
        *chord_pcs.choose(rng).unwrap_or(&(key_root % 12))
    };
    let start_pitch = base_octave * 12 + start_pc as i32;

    let start_beats: f64 = if bridge {
        *[1.0, 1.5, 2.0, 0.75].choose(rng).unwrap_or(&1.0)
    } else {
        *[0.5, 1.0, 0.75].choose(rng).unwrap_or(&0.5)
    };

    let mut notes = vec![MotifNote {
        pitch: start_pitch,
        offset: 0.0,
        beats: start_beats.min(motif_beats),
    }];
    let mut cursor = start_beats.min(motif_beats);
    let mut last_pitch = start_pitch;

    let note_count = if bridge { rng.gen_range(1..=3) } else { rng.gen_range(2..=4) };
    for _ in 1..note_count {
        if cursor >= motif_beats {
            break;
        }

        let mut next_pc = (last_pitch.rem_euclid(12)) as u8;
        if rng.gen::<f64>() < if bridge { 0.4 } else { 0.7 } {
            let mut steps: Vec<i32> = vec![-1, -2, 1, 2];
            if bridge {
                steps.extend([-3, 3, -4, 4, -5, 5, -7, 7]);
            }
            let step = *steps.choose(rng).unwrap_or(&1);
            next_pc = ((next_pc as i32 + step).rem_euclid(12)) as u8;
            let mut attempts = 0;
            while !scale_pcs.contains(&next_pc) && attempts < 5 {
                let nudge = *[-1i32, 1].choose(rng).unwrap_or(&1);
                next_pc = ((next_pc as i32 + nudge).rem_euclid(12)) as u8;
                attempts += 1;
            }
        } else {
            let pool = if rng.gen::<f64>() < 0.5 { &scale_pcs } else { &chord_pcs };
            next_pc = *pool.choose(rng).unwrap_or(&(key_root % 12));
        }

        let mut next_pitch = base_octave * 12 + next_pc as i32;

        let max_leap = if bridge {
            14
        } else {
            match tier {
                ComplexityTier::Simple => 6,
                ComplexityTier::Moderate => 9,
                ComplexityTier::Complex => 12,
            }
        };
        if (next_pitch - start_pitch).abs() > max_leap {
            let octave_diff = next_pitch / 12 - start_pitch / 12;
            if octave_diff != 0 && rng.gen::<f64>() < 0.7 {
                next_pitch -= octave_diff * 12;
            }
            if (next_pitch - start_pitch).abs() > max_leap {
                next_pitch = last_pitch + *[-1, 1, 2, -2, 3, -3].choose(rng).unwrap_or(&1);
            }
        }

        let mut beats = if bridge {
            *[0.75, 1.0, 1.5, 2.0].choose(rng).unwrap_or(&1.0)
        } else {
            *[0.25, 0.5, 0.5, 0.75, 1.0].choose(rng).unwrap_or(&0.5)
        };
        if cursor + beats > motif_beats {
            beats = motif_beats - cursor;
        }
        if beats < 0.125 {
            continue;
        }

        notes.push(MotifNote { pitch: next_pitch, offset: cursor, beats });
        cursor += beats;
        last_pitch = next_pitch;
    }

    Motif { notes }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variation {
    RhythmicSimple,
    PitchOrnament,
    None,
}

/// Produces a varied restatement of a motif. Rhythmic variation reshuffles
/// note durations; pitch ornament splits one note into itself plus a
/// neighbor tone.
fn apply_variation(motif: &Motif, variation: Variation, rng: &mut Pcg32) -> Motif {
    if motif.is_empty() {
        return Motif::default();
    }
    match variation {
        Variation::RhythmicSimple => {
            let mut offset = 0.0;
            let mut notes = Vec::with_capacity(motif.notes.len());
            for note in &motif.notes {
                let mut beats = note.beats;
                if rng.gen::<f64>() < 0.3 {
                    beats = if note.beats == 0.5 {
                        *[0.25, 0.75].choose(rng).unwrap_or(&0.25)
                    } else if note.beats == 1.0 {
                        *[0.5, 0.75, 1.25].choose(rng).unwrap_or(&0.5)
                    } else if note.beats == 0.25 {
                        0.5
                    } else {
                        note.beats
                    };
                }
                let beats = beats.max(0.125);
                notes.push(MotifNote { pitch: note.pitch, offset, beats });
                offset += beats;
            }
            Motif { notes }
        }
        Variation::PitchOrnament => {
            if motif.notes.len() < 2 {
                return motif.clone();
            }
            let ornament_idx = rng.gen_range(0..motif.notes.len());
            let mut offset = 0.0;
            let mut notes = Vec::new();
            for (i, note) in motif.notes.iter().enumerate() {
                if i == ornament_idx && note.beats > 0.25 {
                    let neighbor = note.pitch + *[-1, -2, 1, 2].choose(rng).unwrap_or(&1);
                    let half = note.beats / 2.0;
                    notes.push(MotifNote { pitch: note.pitch, offset, beats: half });
                    offset += half;
                    notes.push(MotifNote { pitch: neighbor, offset, beats: half });
                    offset += half;
                } else {
                    notes.push(MotifNote { pitch: note.pitch, offset, beats: note.beats });
                    offset += note.beats;
                }
            }
            Motif { notes }
        }
        Variation::None => motif.clone(),
    }
}

/// Generates one chord's worth of melody: an optional motif statement
/// followed by a stepwise walk over scale and chord tones.
#[allow(clippy::too_many_arguments)]
fn generate_phrase(
    phrase_beats: f64,
    chord: &Chord,
    key_root: u8,
    is_major: bool,
    tier: ComplexityTier,
    profile: &SectionProfile,
    is_hook: bool,
    hook_accent_strong: bool,
    motif: Option<&Motif>,
    is_repetition: bool,
    rng: &mut Pcg32,
) -> Vec<MotifNote> {
    let style = profile.melody_style;
    let bridge = style == MelodyStyle::BridgeDistinct;
    let scale_pcs = melodic_scale(key_root, is_major, style, rng);
    let chord_pcs = chord_tone_pcs(chord, key_root);

    let base_octave: i32 = 5;
    let mut notes: Vec<MotifNote> = Vec::new();
    let mut cursor = 0.0_f64;
    let mut last_pitch: Option<i32> = None;
    let mut note_count = 0usize;

    let varied;
    let mut active_motif = motif;
    if let Some(m) = motif {
        if is_repetition && rng.gen::<f64>() < 0.6 {
            let variation = *[
                Variation::RhythmicSimple,
                Variation::PitchOrnament,
                Variation::None,
            ]
            .choose(rng)
            .unwrap_or(&Variation::None);
            if variation != Variation::None {
                varied = apply_variation(m, variation, rng);
                active_motif = Some(&varied);
            }
        }
    }

    let statement_probability = if is_hook {
        0.8
    } else if bridge {
        0.1
    } else {
        0.3
    };
    if let Some(m) = active_motif {
        if rng.gen::<f64>() < statement_probability {
            let span: f64 = m.notes.iter().map(|n| n.beats).sum();
            if span <= phrase_beats + 0.01 {
                for note in &m.notes {
                    if note.offset + note.beats > phrase_beats + 0.01 {
                        continue;
                    }
                    let mut pitch = note.pitch;
                    // Anchor strong motif beats onto chord tones
                    let strong = note.offset == 0.0 || note.offset % 1.0 == 0.0;
                    if strong && !chord_pcs.contains(&(pitch.rem_euclid(12) as u8)) {
                        let pc = *chord_pcs.choose(rng).unwrap_or(&(key_root % 12));
                        pitch = (pitch / 12) * 12 + pc as i32;
                    }
                    notes.push(MotifNote { pitch, offset: note.offset, beats: note.beats });
                    last_pitch = Some(pitch);
                }
                cursor += span;
                note_count += m.notes.len();
            }
        }
    }

    let mut walk_density = profile.rhythmic_density;
    if bridge {
        walk_density *= 0.7;
    }
    let note_budget = phrase_beats * 2.0 * walk_density;

    while cursor < phrase_beats - 0.125 && (note_count as f64) < note_budget {
        let mut duration_options: Vec<f64> = if bridge {
            vec![1.0, 1.5, 0.75, 2.0]
        } else {
            vec![0.5, 1.0, 0.25]
        };
        if tier == ComplexityTier::Complex {
            duration_options.extend([0.125, 0.33]);
        }
        let mut beats = *duration_options.choose(rng).unwrap_or(&0.5);
        if cursor + beats > phrase_beats {
            beats = phrase_beats - cursor;
        }
        if beats < 0.125 {
            break;
        }

        let strong_beat = cursor % 2.0 == 0.0;
        let mut pool: Vec<u8> = Vec::new();
        if is_hook && hook_accent_strong && strong_beat {
            pool = chord_pcs.clone();
        } else if rng.gen::<f64>() < if bridge { 0.5 } else { 0.7 } {
            pool.extend(&chord_pcs);
        }
        if pool.is_empty() {
            pool.extend(&scale_pcs);
        }

        let chosen_pc = *pool.choose(rng).unwrap_or(&(key_root % 12));
        let mut next_pitch = base_octave * 12 + chosen_pc as i32;

        if let Some(last) = last_pitch {
            let max_interval = match tier {
                ComplexityTier::Simple => 5,
                ComplexityTier::Complex => 10,
                ComplexityTier::Moderate => {
                    if bridge {
                        9
                    } else {
                        7
                    }
                }
            };
            let mut interval = (next_pitch - last).abs();
            let mut attempts = 0;
            while interval > max_interval && attempts < 3 {
                let alt_pc = *pool.choose(rng).unwrap_or(&chosen_pc);
                let alt = base_octave * 12 + alt_pc as i32;
                if (alt - last).abs() < interval {
                    next_pitch = alt;
                }
                interval = (next_pitch - last).abs();
                attempts += 1;
            }
        }

        notes.push(MotifNote { pitch: next_pitch, offset: cursor, beats });
        last_pitch = Some(next_pitch);
        cursor += beats;
        note_count += 1;
    }

    notes
}

/// The default melody strategy
pub struct StandardMotif;

impl MelodyGenerator for StandardMotif {
    fn render(
        &self,
        timeline: &mut Timeline,
        progression: &[Chord],
        start_beat: f64,
        section: SectionType,
        profile: &SectionProfile,
        params: &ParamSet,
        state: &mut RunState,
        rng: &mut Pcg32,
    ) {
        let key_root = state.active_key_root;
        let is_major = state.active_is_major;
        let tier = params.complexity_tier;
        let is_hook = section.is_hook();
        let bridge = profile.melody_style == MelodyStyle::BridgeDistinct;

        let mut base_velocity = profile.velocity_base + rng.gen_range(3..=8);
        if profile.is_peak_section {
            base_velocity = (base_velocity + 10).min(120);
        }

        if is_hook && !bridge && !state.motifs.contains_key(&section) {
            if let Some(home_chord) = progression.first() {
                let motif_beats = *[1.0, 2.0].choose(rng).unwrap_or(&1.0);
                let motif = create_motif(
                    motif_beats,
                    home_chord,
                    key_root,
                    is_major,
                    tier,
                    profile.melody_style,
                    rng,
                );
                state.motifs.insert(section, motif);
            }
        }
        let motif = if is_hook && !bridge {
            state.motifs.get(&section).cloned()
        } else {
            None
        };

        let total_beats: f64 = progression.iter().map(|c| c.beats).sum();
        let mut current_beat = start_beat;

        for (i, chord) in progression.iter().enumerate() {
            let progress = if total_beats > 0.0 {
                (current_beat - start_beat) / total_beats
            } else {
                0.0
            };

            let mut velocity = base_velocity;
            if profile.build_tension {
                velocity = ((base_velocity as f64 + 20.0 * progress) as i32).min(115);
            } else if section == SectionType::Outro {
                velocity = (base_velocity as f64 * (1.0 - progress * 0.9)) as i32;
            }

            let is_repetition = is_hook && (i > 0 || state.motif_played.contains(&section));
            let phrase = generate_phrase(
                chord.beats,
                chord,
                key_root,
                is_major,
                tier,
                profile,
                is_hook,
                params.hook_accent_strong,
                motif.as_ref().filter(|_| !bridge),
                is_repetition,
                rng,
            );
            if is_hook && i == 0 && !bridge {
                state.motif_played.insert(section);
            }

            for note in &phrase {
                let mut final_vel = velocity;
                let strong = note.offset == 0.0 || note.offset % 1.0 == 0.0;
                if is_hook && params.hook_accent_strong && strong {
                    final_vel = (velocity + 10).min(127);
                } else if profile.build_tension && note.pitch > 67 {
                    final_vel = (velocity + 5).min(127);
                }
                timeline.add_note(
                    TrackId::Melody,
                    fold_to_melodic_range(note.pitch),
                    current_beat + note.offset,
                    note.beats * 0.98,
                    final_vel,
                );
            }

            current_beat += chord.beats;
        }
    }
}

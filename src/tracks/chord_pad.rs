// Chord and Pad Renderer - Sustained voicings, tension pulses, outro decay
// One renderer serves both roles; the pad role sits an octave higher,
// slightly softer, with looser sustain

use rand::seq::SliceRandom;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::params::ParamSet;
use crate::sections::{SectionProfile, SectionType};
use crate::theory::{build_voicing, Chord};
use crate::timeline::{Timeline, TrackId};

/// Renders the chord or pad part for one section.
///
/// Tension builds crescendo across the section and often pulse the chord
/// instrument in half beats; Outros decay toward silence, with pads allowed
/// to ring well past their bar.
pub fn render_chords(
    timeline: &mut Timeline,
    track: TrackId,
    progression: &[Chord],
    start_beat: f64,
    bars: u32,
    section: SectionType,
    profile: &SectionProfile,
    params: &ParamSet,
    pad_role: bool,
    rng: &mut Pcg32,
) {
    let base_velocity = profile.velocity_base - if pad_role { 10 } else { 0 };
    let octave_center = if pad_role { 5 } else { 4 };
    let sustain_factor = if pad_role && section == SectionType::Outro {
        2.5
    } else if pad_role {
        0.98
    } else {
        0.95
    };
    let total_beats = bars as f64 * 4.0;
    let mut current_beat = start_beat;

    for chord in progression {
        let progress = if total_beats > 0.0 {
            (current_beat - start_beat) / total_beats
        } else {
            0.0
        };

        let mut velocity = base_velocity;
        if profile.build_tension {
            let cap = if pad_role { 100 } else { 110 };
            velocity = ((base_velocity as f64 + 20.0 * progress) as i32).min(cap);
        } else if section == SectionType::Outro {
            velocity = (base_velocity as f64 * (1.0 - progress * 0.8)) as i32;
        }

        let mut voice_count = 3;
        if params.seventh_probability > rng.gen::<f64>() && chord.quality.is_extended() {
            voice_count = *[3usize, 4].choose(rng).unwrap_or(&3);
        }
        if pad_role {
            voice_count = *[2usize, 3, 4].choose(rng).unwrap_or(&3);
        }
        let pitches = build_voicing(chord.root, chord.quality, octave_center, voice_count);

        if !profile.build_tension && section != SectionType::Outro {
            velocity = (velocity + if pad_role { 3 } else { 5 }).min(127);
        }

        let mut sustain = chord.beats * sustain_factor;
        if pad_role && rng.gen::<f64>() < 0.5 {
            sustain = chord.beats + 0.1;
        }

        if profile.build_tension && !pad_role && rng.gen::<f64>() < 0.6 {
            // Half-beat pulses instead of one sustained hit
            let pulses = (chord.beats / 0.5) as usize;
            for pulse in 0..pulses {
                for &pitch in &pitches {
                    timeline.add_note(
                        track,
                        pitch,
                        current_beat + pulse as f64 * 0.5,
                        0.5 * sustain_factor,
                        velocity,
                    );
                }
            }
        } else {
            for &pitch in &pitches {
                timeline.add_note(track, pitch, current_beat, sustain, velocity);
            }
        }

        current_beat += chord.beats;
    }
}

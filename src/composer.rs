// Composer - Drives one full composition run from config to note timeline
// Resolves parameters, walks the song form section by section within the
// duration budget, and assembles the finished composition record

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::config::{GenerationConfig, StructuralComplexity};
use crate::params::{ParamSet, RunState};
use crate::sections::{resolve_profile, LayerCategory, SectionType};
use crate::theory::section_progression;
use crate::timeline::{Composition, Timeline, TrackId, TrackInfo};
use crate::tracks::{melody_generator, render_bass, render_chords, render_drums};

#[derive(Debug, Error)]
pub enum ComposeError {
    /// The resolved song form contained no sections
    #[error("song form resolved to no sections")]
    EmptySongForm,
}

/// Drives one composition run. Holds the immutable plan, the mutable run
/// state and the seeded random stream; every random decision after parameter
/// resolution draws from that single stream in section order.
struct Composer {
    params: ParamSet,
    state: RunState,
    rng: Pcg32,
    timeline: Timeline,
}

impl Composer {
    fn new(params: ParamSet, rng: Pcg32) -> Self {
        let state = RunState::new(&params);
        Composer {
            params,
            state,
            rng,
            timeline: Timeline::new(),
        }
    }

    /// Draws the bar length for every distinct section type, in order of
    /// first appearance in the song form.
    fn draw_bar_lengths(&mut self, complexity: StructuralComplexity) -> HashMap<SectionType, u32> {
        let mut lengths = HashMap::new();
        let form = self.params.song_form.clone();
        for section in form {
            if lengths.contains_key(&section) {
                continue;
            }
            let choices: &[u32] = match section {
                SectionType::Intro | SectionType::Outro => {
                    if complexity == StructuralComplexity::Simple {
                        &[2, 4]
                    } else {
                        &[4, 8]
                    }
                }
                SectionType::Bridge | SectionType::InstrumentalHook => &[4, 8],
                _ => match complexity {
                    StructuralComplexity::Simple => &[8, 12],
                    StructuralComplexity::Developed => &[12, 16, 20],
                    StructuralComplexity::Standard => &[8, 12, 16],
                },
            };
            let bars = *choices.choose(&mut self.rng).unwrap_or(&choices[0]);
            lengths.insert(section, bars);
        }
        lengths
    }

    /// Renders one section starting at `start_beat` and returns the beats it
    /// consumed, including any trailing pause.
    fn run_section(&mut self, section: SectionType, start_beat: f64, bars: u32) -> f64 {
        log::debug!("rendering {} ({} bars)", section.as_str(), bars);
        let profile = resolve_profile(section, self.params.dynamic_level, &self.params, &mut self.rng);

        self.state.bridge_modulating = false;
        if section == SectionType::Bridge && profile.modulate_key {
            self.state.bridge_modulating = true;
            let shift = *[7u8, 5].choose(&mut self.rng).unwrap_or(&7);
            self.state.active_key_root = (self.params.key_root + shift) % 12;
            self.state.active_is_major = self.params.is_major;
            log::info!(
                "modulating bridge to key root {} ({})",
                self.state.active_key_root,
                if self.state.active_is_major { "major" } else { "minor" }
            );
        }

        let progression = section_progression(
            bars,
            self.state.active_key_root,
            self.state.active_is_major,
            &self.params.schema_degrees,
            self.params.seventh_probability,
            self.state.bridge_modulating,
            &mut self.rng,
        );

        if profile.has_layer(LayerCategory::Drums) {
            render_drums(
                &mut self.timeline,
                start_beat,
                bars,
                section,
                &profile,
                &self.params,
                &mut self.rng,
            );
        }
        if profile.has_layer(LayerCategory::Bass) && self.params.instruments.bass.is_some() {
            render_bass(
                &mut self.timeline,
                &progression,
                start_beat,
                section,
                &profile,
                &self.params,
                self.state.active_key_root,
                self.state.active_is_major,
                &mut self.rng,
            );
        }
        if profile.has_layer(LayerCategory::Chords) && self.params.instruments.chords.is_some() {
            render_chords(
                &mut self.timeline,
                TrackId::Chords,
                &progression,
                start_beat,
                bars,
                section,
                &profile,
                &self.params,
                false,
                &mut self.rng,
            );
        }
        let wants_melody = profile.has_layer(LayerCategory::Melody)
            || profile.has_layer(LayerCategory::CounterMelody);
        if wants_melody && self.params.instruments.melody.is_some() {
            melody_generator(self.params.melody_method).render(
                &mut self.timeline,
                &progression,
                start_beat,
                section,
                &profile,
                &self.params,
                &mut self.state,
                &mut self.rng,
            );
        }
        if profile.has_layer(LayerCategory::Pad) && self.params.instruments.pad.is_some() {
            render_chords(
                &mut self.timeline,
                TrackId::Pad,
                &progression,
                start_beat,
                bars,
                section,
                &profile,
                &self.params,
                true,
                &mut self.rng,
            );
        }

        // Breathing room before the drop into the chorus
        let mut pause_beats = 0.0;
        if section == SectionType::PreChorus && self.rng.gen::<f64>() < 0.7 {
            pause_beats = *[1.0, 2.0].choose(&mut self.rng).unwrap_or(&1.0);
            log::debug!("adding {} beats of silence after prechorus", pause_beats);
        }

        if self.state.bridge_modulating {
            self.state.active_key_root = self.params.key_root;
            self.state.active_is_major = self.params.is_major;
            self.state.bridge_modulating = false;
            log::debug!("reverted to original key {}", self.params.key_name);
        }

        bars as f64 * 4.0 + pause_beats
    }
}

/// Generates a complete composition from the given configuration.
///
/// A fixed seed yields an identical composition; an absent seed draws one
/// from the thread RNG. The song form is walked in order until the duration
/// budget derived from the target length and tempo is exhausted.
pub fn compose(config: &GenerationConfig) -> Result<Composition, ComposeError> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = Pcg32::seed_from_u64(seed);
    let params = ParamSet::resolve(config, seed, &mut rng);
    if params.song_form.is_empty() {
        return Err(ComposeError::EmptySongForm);
    }

    log::info!(
        "composing '{}': {} bpm, {}, schema {}, {:?} rhythm",
        Composition::title_for_seed(seed),
        params.bpm,
        params.key_name,
        params.schema_name,
        params.rhythm_personality
    );

    let mut composer = Composer::new(params, rng);
    let bar_lengths = composer.draw_bar_lengths(config.structural_complexity);

    let max_beats =
        composer.params.target_duration_seconds as f64 / 60.0 * composer.params.bpm as f64;
    let mut cursor = 0.0_f64;
    let form = composer.params.song_form.clone();
    for section in form {
        if cursor >= max_beats {
            log::info!("duration budget reached at {:.1} beats", cursor);
            break;
        }
        let bars = bar_lengths.get(&section).copied().unwrap_or(4);
        cursor += composer.run_section(section, cursor, bars);
    }

    let params = composer.params;
    let tracks = TrackId::ALL
        .iter()
        .map(|&track| {
            let program = match track {
                TrackId::Drums => None,
                TrackId::Bass => params.instruments.bass,
                TrackId::Chords => params.instruments.chords,
                TrackId::Melody => params.instruments.melody,
                TrackId::Pad => params.instruments.pad,
            };
            TrackInfo {
                track,
                name: track.name().to_string(),
                program,
            }
        })
        .collect();

    log::info!(
        "composition complete: {:.0} beats, about {:.1}s",
        cursor,
        cursor / params.bpm as f64 * 60.0
    );

    Ok(Composition {
        title: Composition::title_for_seed(seed),
        seed,
        bpm: params.bpm,
        total_beats: cursor,
        tracks,
        events: composer.timeline.into_events(),
    })
}

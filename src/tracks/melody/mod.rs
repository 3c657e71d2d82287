// Melody Strategies - Pluggable per-run melodic generation behind one trait

pub mod contour;
pub mod standard;

use rand_pcg::Pcg32;

use crate::config::MelodyMethod;
use crate::params::{ParamSet, RunState};
use crate::sections::{SectionProfile, SectionType};
use crate::theory::Chord;
use crate::timeline::Timeline;

pub use contour::ContourDriven;
pub use standard::StandardMotif;

/// A melody strategy renders the melody part for one section over its
/// chord progression, reading the active key from the run state and caching
/// hook motifs into it.
pub trait MelodyGenerator {
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
    );
}

static STANDARD: StandardMotif = StandardMotif;
static CONTOUR: ContourDriven = ContourDriven;

/// Strategy dispatch. MarkovChain currently delegates to the motif strategy.
pub fn melody_generator(method: MelodyMethod) -> &'static dyn MelodyGenerator {
    match method {
        MelodyMethod::ContourDriven => &CONTOUR,
        MelodyMethod::Standard | MelodyMethod::MarkovChain => &STANDARD,
    }
}

/// Octave-folds a pitch into the melodic register C3-C6
pub(crate) fn fold_to_melodic_range(mut pitch: i32) -> i32 {
    while pitch < 48 {
        pitch += 12;
    }
    while pitch > 84 {
        pitch -= 12;
    }
    pitch
}

// HitFactory - Procedural multi-track song generator
// Module declarations and top-level entry point

pub mod composer;
pub mod config;
pub mod midi;
pub mod params;
pub mod sections;
pub mod theory;
pub mod timeline;
pub mod tracks;

pub use composer::{compose, ComposeError};
pub use config::GenerationConfig;
pub use midi::{export_midi, MidiExportError, MidiExportOptions};
pub use timeline::{Composition, NoteEvent, TrackId};

/// Version tag embedded in generated song titles.
pub const GENERATOR_VERSION: &str = "0.7.2";

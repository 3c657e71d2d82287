// Track Renderers - Per-role note generation onto the shared timeline

pub mod bass;
pub mod chord_pad;
pub mod drums;
pub mod melody;

pub use bass::render_bass;
pub use chord_pad::render_chords;
pub use drums::render_drums;
pub use melody::{melody_generator, MelodyGenerator};

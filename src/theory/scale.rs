// Scale Tones - Pitch-class sets for the scales the generators draw from

/// Scale families available to the melodic generators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    /// Full seven-note major or natural minor scale
    Diatonic,

    /// Five-note major pentatonic (ignores the key mode)
    MajorPentatonic,

    /// Five-note minor pentatonic (ignores the key mode)
    MinorPentatonic,
}

const MAJOR_INTERVALS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_INTERVALS: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
const MAJOR_PENTATONIC_INTERVALS: [u8; 5] = [0, 2, 4, 7, 9];
const MINOR_PENTATONIC_INTERVALS: [u8; 5] = [0, 3, 5, 7, 10];

/// Returns the sorted pitch classes (0-11) of the requested scale on `root`.
pub fn scale_tones(root: u8, is_major: bool, kind: ScaleKind) -> Vec<u8> {
    let intervals: &[u8] = match kind {
        ScaleKind::Diatonic => {
            if is_major {
                &MAJOR_INTERVALS
            } else {
                &MINOR_INTERVALS
            }
        }
        ScaleKind::MajorPentatonic => &MAJOR_PENTATONIC_INTERVALS,
        ScaleKind::MinorPentatonic => &MINOR_PENTATONIC_INTERVALS,
    };

    let mut tones: Vec<u8> = intervals.iter().map(|i| (root + i) % 12).collect();
    tones.sort_unstable();
    tones
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_scale() {
        assert_eq!(
            scale_tones(0, true, ScaleKind::Diatonic),
            vec![0, 2, 4, 5, 7, 9, 11]
        );
    }

    #[test]
    fn test_a_minor_scale() {
        // A natural minor shares the pitch classes of C major
        assert_eq!(
            scale_tones(9, false, ScaleKind::Diatonic),
            vec![0, 2, 4, 5, 7, 9, 11]
        );
    }

    #[test]
    fn test_pentatonics_ignore_mode() {
        let major_pent = scale_tones(0, false, ScaleKind::MajorPentatonic);
        assert_eq!(major_pent, vec![0, 2, 4, 7, 9]);

        let minor_pent = scale_tones(0, true, ScaleKind::MinorPentatonic);
        assert_eq!(minor_pent, vec![0, 3, 5, 7, 10]);
    }

    #[test]
    fn test_transposition_wraps() {
        // G major: G A B C D E F#
        assert_eq!(
            scale_tones(7, true, ScaleKind::Diatonic),
            vec![0, 2, 4, 6, 7, 9, 11]
        );
    }
}

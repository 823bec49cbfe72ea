// Note name + octave -> fundamental frequency (12-TET, A4 = 440 Hz)

use super::note::Note;

/// Returned for names that are not a pitch. Callers must not synthesize it.
pub const SILENT_FREQUENCY: f64 = 0.0;

/// Octave the pitch-class table is pinned to
const REFERENCE_OCTAVE: i32 = 4;

/// 440 * 2^((n - 9) / 12) for n = 0 (C4) ..= 11 (B4)
const PITCH_CLASS_FREQUENCIES: [f64; 12] = [
    261.625_565_300_598_6,
    277.182_630_976_872_1,
    293.664_767_917_407_6,
    311.126_983_722_080_9,
    329.627_556_912_869_9,
    349.228_231_433_003_9,
    369.994_422_711_634_4,
    391.995_435_981_749_3,
    415.304_697_579_945_1,
    440.0,
    466.163_761_518_089_9,
    493.883_301_256_124_1,
];

fn letter_offset(letter: char) -> Option<i32> {
    match letter.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

fn accidental_offset(accidental: char) -> Option<i32> {
    match accidental {
        '#' | '♯' => Some(1),
        'b' | 'B' | '♭' => Some(-1),
        _ => None,
    }
}

/// Semitone offset from C of a spelled pitch name, before octave wrapping.
///
/// "Cb" yields -1 and "B#" yields 12; [`resolve`] carries those into the
/// neighbouring octave.
pub fn semitone_offset(name: &str) -> Option<i32> {
    let mut chars = name.trim().chars();
    let letter = letter_offset(chars.next()?)?;
    let accidental = match chars.next() {
        Some(c) => accidental_offset(c)?,
        None => 0,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(letter + accidental)
}

/// Resolve a note to Hz, or [`SILENT_FREQUENCY`] for an unknown name.
///
/// Octaves too far from the reference to give a finite frequency are
/// silent as well.
pub fn resolve(note: &Note) -> f64 {
    let Some(offset) = semitone_offset(&note.name) else {
        return SILENT_FREQUENCY;
    };

    let class = offset.rem_euclid(12) as usize;
    let Some(shift) = note
        .octave
        .checked_add(offset.div_euclid(12))
        .and_then(|octave| octave.checked_sub(REFERENCE_OCTAVE))
    else {
        return SILENT_FREQUENCY;
    };

    let frequency = PITCH_CLASS_FREQUENCIES[class] * 2_f64.powi(shift);
    if frequency.is_finite() {
        frequency
    } else {
        SILENT_FREQUENCY
    }
}

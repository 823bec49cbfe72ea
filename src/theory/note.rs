// Musical data model shared with the structured-data producer
//
// The JSON shape is the one produced upstream:
// [{ "name": "C Major", "notes": [{ "name": "C", "octave": 4 }, ...] }, ...]

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PlaybackError;

/// A pitch name plus octave. Octave 4 contains middle C.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub name: String,
    pub octave: i32,
}

impl Note {
    pub fn new(name: impl Into<String>, octave: i32) -> Self {
        Self {
            name: name.into(),
            octave,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// A display label plus the notes sounded together, in producer order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub name: String,
    pub notes: Vec<Note>,
}

impl Chord {
    pub fn new(name: impl Into<String>, notes: Vec<Note>) -> Self {
        Self {
            name: name.into(),
            notes,
        }
    }
}

/// Chords in playback order. Indices reported to callbacks are indices
/// into this sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChordProgression(Vec<Chord>);

impl ChordProgression {
    pub fn new(chords: Vec<Chord>) -> Self {
        Self(chords)
    }

    /// Parse the JSON array form of a progression
    pub fn from_json(json: &str) -> Result<Self, PlaybackError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn chords(&self) -> &[Chord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chord> {
        self.0.iter()
    }
}

impl From<Vec<Chord>> for ChordProgression {
    fn from(chords: Vec<Chord>) -> Self {
        Self(chords)
    }
}

impl<'a> IntoIterator for &'a ChordProgression {
    type Item = &'a Chord;
    type IntoIter = std::slice::Iter<'a, Chord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TheoryKind {
    Scale,
    Chord,
}

/// A single scale or chord description as returned for "show me X" requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTheoryInfo {
    #[serde(rename = "type")]
    pub kind: TheoryKind,
    pub name: String,
    pub root_note: String,
    pub quality: String,
    pub notes: Vec<Note>,
}

impl MusicTheoryInfo {
    pub fn from_json(json: &str) -> Result<Self, PlaybackError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Chords sound as one block; scales are played one degree per chord slot.
    pub fn to_progression(&self) -> ChordProgression {
        match self.kind {
            TheoryKind::Chord => {
                ChordProgression::new(vec![Chord::new(self.name.clone(), self.notes.clone())])
            }
            TheoryKind::Scale => self
                .notes
                .iter()
                .map(|note| Chord::new(note.to_string(), vec![note.clone()]))
                .collect::<Vec<_>>()
                .into(),
        }
    }
}

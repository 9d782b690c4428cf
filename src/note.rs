// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Definitions of what a note is.

use std::fmt;

/// A "note" is just an index on the piano keyboard.
/// This definition follows the MIDI standard where C4 corresponds to index 60.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Note(u8);

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    pub fn from_midi(midi_note: u8) -> Note {
        assert!(midi_note < 128, "MIDI only has notes 0 - 127");
        Note(midi_note)
    }

    pub fn try_from_midi(midi_note: i64) -> Option<Note> {
        if (0..128).contains(&midi_note) {
            Some(Note(midi_note as u8))
        } else {
            None
        }
    }
}

/// ```
/// use rag_rhythm::note::Note;
///
/// assert_eq!(Note::from_midi(60).to_string(), "C4");
/// assert_eq!(Note::from_midi(70).to_string(), "A#4");
/// ```
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let octave = i32::from(self.0) / 12 - 1;
        write!(f, "{}{}", NAMES[usize::from(self.0 % 12)], octave)
    }
}

/// What sounds at an onset: either a note or silence.
///
/// xmk files write rests as pitch `-1`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Pitch {
    Note(Note),
    Rest,
}

impl Pitch {
    /// Decode the pitch column of an xmk line.
    ///
    /// ```
    /// use rag_rhythm::note::{Note, Pitch};
    ///
    /// assert_eq!(Pitch::from_xmk(-1), Some(Pitch::Rest));
    /// assert_eq!(Pitch::from_xmk(62), Some(Pitch::Note(Note::from_midi(62))));
    /// assert_eq!(Pitch::from_xmk(128), None);
    /// ```
    pub fn from_xmk(value: i64) -> Option<Pitch> {
        if value == -1 {
            Some(Pitch::Rest)
        } else {
            Note::try_from_midi(value).map(Pitch::Note)
        }
    }

    pub fn is_rest(self) -> bool {
        self == Pitch::Rest
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pitch::Note(note) => fmt::Display::fmt(note, f),
            Pitch::Rest => f.write_str("rest"),
        }
    }
}

// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Decoding of the compact chord notation used in xmk files.
//!
//! A chord token is either `-1` (no chord is playing), a bare MIDI root
//! (a major triad on that root), or a root followed by bracketed modifier
//! flags, e.g. `55[m7]` for a minor seventh chord on G3.

use std::fmt;

use snafu::Snafu;

/// The chord sounding under an onset.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Chord {
    /// MIDI pitches of the chord, root first. Between 3 and 5 entries.
    Triad(Vec<i64>),
    /// Nothing is playing in the accompaniment.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ChordError {
    #[snafu(display("chord root {:?} is not an integer", root))]
    InvalidRoot { root: String },
}

impl Chord {
    /// Decode a chord token.
    ///
    /// Of the triad modifiers only the first present one in the order
    /// `m`, `2`, `4`, `d`, `a` is applied. `6` and `7` add extensions on top of
    /// any triad. Unknown flags are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use rag_rhythm::chord::Chord;
    ///
    /// assert_eq!(Chord::decode("60"), Ok(Chord::Triad(vec![60, 64, 67])));
    /// assert_eq!(Chord::decode("60[m]"), Ok(Chord::Triad(vec![60, 63, 67])));
    /// assert_eq!(Chord::decode("60[m7]"), Ok(Chord::Triad(vec![60, 63, 67, 70])));
    /// assert_eq!(Chord::decode("-1"), Ok(Chord::None));
    /// ```
    pub fn decode(token: &str) -> Result<Chord, ChordError> {
        if token == "-1" {
            return Ok(Chord::None);
        }

        let (root_str, modifiers) = match token.find('[') {
            Some(index) => (&token[..index], token[index + 1..].trim_end_matches(']')),
            None => (token, ""),
        };
        let root: i64 = root_str.parse().map_err(|_| ChordError::InvalidRoot {
            root: root_str.to_owned(),
        })?;

        let mut pitches = vec![root, root + 4, root + 7];
        let has = |flag: char| modifiers.contains(flag);

        if has('m') {
            pitches[1] = root + 3;
        } else if has('2') {
            pitches[1] = root + 2;
        } else if has('4') {
            pitches[1] = root + 5;
        } else if has('d') {
            pitches[1] = root + 3;
            pitches[2] = root + 6;
        } else if has('a') {
            pitches[2] = root + 8;
        }

        if has('6') {
            pitches.push(root + 8);
        }
        if has('7') {
            pitches.push(root + 10);
        }

        Ok(Chord::Triad(pitches))
    }

    pub fn is_none(&self) -> bool {
        *self == Chord::None
    }

    /// The pitches of the chord, empty if nothing is playing.
    pub fn pitches(&self) -> &[i64] {
        match self {
            Chord::Triad(pitches) => pitches,
            Chord::None => &[],
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chord::None => f.write_str("-"),
            Chord::Triad(pitches) => {
                let parts: Vec<String> = pitches.iter().map(|p| p.to_string()).collect();
                write!(f, "<{}>", parts.join(" "))
            }
        }
    }
}

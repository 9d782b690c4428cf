// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Binary onset patterns describing the rhythm of a single measure.
//!
//! The measure is split into a fixed number of equally long cells. A `1`
//! marks a cell where a note is struck, a `0` a cell where the previous note
//! is held or where nothing plays. `10101000` at eighth note resolution is
//! two quarter notes followed by a half note.

use std::{fmt, str::FromStr};

use snafu::Snafu;

use crate::config::PatternLength;
use crate::rational::Rational;

/// The rhythm of one measure, a string over `0` and `1` whose length is a
/// positive multiple of 8.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OnsetPattern(String);

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum PatternError {
    #[snafu(display("{:?} is not an onset pattern", text))]
    Invalid { text: String },
    #[snafu(display("note value {} cannot be evenly divided into {} cells", value, length))]
    DivisionMismatch { value: Rational, length: usize },
    #[snafu(display("note value {} does not last any time", value))]
    EmptyValue { value: Rational },
    #[snafu(display("note value {} is far longer than a measure", value))]
    TooLong { value: Rational },
    #[snafu(display(
        "onset pattern does not fit in {} characters ({} cells needed)",
        length,
        needed
    ))]
    Overflow { length: usize, needed: usize },
    #[snafu(display("cannot stretch a pattern of length {} to {}", from, to))]
    Stretch { from: usize, to: usize },
}

/// Encode one measure as onset pattern.
///
/// Each item is the note value of a note or rest together with whether it is a
/// rest. Rests produce no onset but still take up time, which matters when a
/// measure starts with one. Measures that do not fill the whole pattern are
/// padded with trailing zeros; measures that are too long are an error.
///
/// # Examples
///
/// ```
/// use rag_rhythm::config::PatternLength;
/// use rag_rhythm::pattern::encode;
/// use rag_rhythm::rational::Rational;
///
/// let measure = vec![
///     (Rational::nth(4), false),
///     (Rational::nth(4), true),
///     (Rational::new(2, 4), false),
/// ];
/// let pattern = encode(measure, PatternLength::EIGHTHS).unwrap();
/// assert_eq!(pattern.as_str(), "10001000");
/// ```
pub fn encode<I>(values: I, length: PatternLength) -> Result<OnsetPattern, PatternError>
where
    I: IntoIterator<Item = (Rational, bool)>,
{
    let length = length.get();
    let mut pattern = String::with_capacity(length);
    let mut needed: usize = 0;

    for (value, is_rest) in values {
        if !value.lands_on_grid(length as i64) {
            return Err(PatternError::DivisionMismatch { value, length });
        }
        let cells = value
            .cells(length as i64)
            .ok_or(PatternError::TooLong { value })?;
        if cells <= 0 {
            return Err(PatternError::EmptyValue { value });
        }
        let cells = cells as usize;

        needed = needed.saturating_add(cells);
        if needed > length {
            // keep counting so the error tells how far off the measure is
            continue;
        }
        pattern.push(if is_rest { '0' } else { '1' });
        pattern.extend(std::iter::repeat('0').take(cells - 1));
    }

    if needed > length {
        return Err(PatternError::Overflow { length, needed });
    }

    pattern.extend(std::iter::repeat('0').take(length - pattern.len()));
    Ok(OnsetPattern(pattern))
}

impl OnsetPattern {
    /// Validate a pattern written out as text.
    ///
    /// ```
    /// use rag_rhythm::pattern::OnsetPattern;
    ///
    /// assert!(OnsetPattern::parse("11010000").is_ok());
    /// assert!(OnsetPattern::parse("1101").is_err());
    /// assert!(OnsetPattern::parse("1101000x").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<OnsetPattern, PatternError> {
        let valid = !text.is_empty()
            && text.len() % 8 == 0
            && text.bytes().all(|b| b == b'0' || b == b'1');
        if valid {
            Ok(OnsetPattern(text.to_owned()))
        } else {
            Err(PatternError::Invalid {
                text: text.to_owned(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of notes struck in the measure.
    pub fn onset_count(&self) -> usize {
        self.0.bytes().filter(|&b| b == b'1').count()
    }

    /// Whether nothing is struck in the whole measure.
    pub fn is_silent(&self) -> bool {
        self.onset_count() == 0
    }

    /// Cell indices of all onsets, in ascending order.
    pub fn onset_positions(&self) -> Vec<usize> {
        self.0
            .bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'1')
            .map(|(i, _)| i)
            .collect()
    }

    /// Spread the pattern over `target` cells by inserting zeros after every cell.
    ///
    /// ```
    /// use rag_rhythm::config::PatternLength;
    /// use rag_rhythm::pattern::OnsetPattern;
    ///
    /// let p = OnsetPattern::parse("11010000").unwrap();
    /// let stretched = p.stretch(PatternLength::new(16).unwrap()).unwrap();
    /// assert_eq!(stretched.as_str(), "1010001000000000");
    /// ```
    pub fn stretch(&self, target: PatternLength) -> Result<OnsetPattern, PatternError> {
        let to = target.get();
        let from = self.len();
        if to % from != 0 {
            return Err(PatternError::Stretch { from, to });
        }
        let padding = to / from - 1;

        let mut stretched = String::with_capacity(to);
        for ch in self.0.chars() {
            stretched.push(ch);
            stretched.extend(std::iter::repeat('0').take(padding));
        }
        Ok(OnsetPattern(stretched))
    }

    /// Lengths in cells of the segments starting at every onset.
    ///
    /// Cells before the first onset form a segment of their own, which is
    /// where a leading rest goes. The last segment runs to the end of the
    /// measure.
    ///
    /// ```
    /// use rag_rhythm::pattern::OnsetPattern;
    ///
    /// let p = OnsetPattern::parse("00101000").unwrap();
    /// assert_eq!(p.note_lengths(), vec![2, 2, 4]);
    /// ```
    pub fn note_lengths(&self) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut held = 1;
        for b in self.0.bytes().skip(1) {
            if b == b'1' {
                lengths.push(held);
                held = 1;
            } else {
                held += 1;
            }
        }
        lengths.push(held);
        lengths
    }
}

/// How far the onsets of two patterns are apart.
///
/// The `i`-th onset of `x` is compared with the `i`-th onset of `y`, and the
/// distances are summed. Both patterns must have the same length and number of
/// onsets.
///
/// ```
/// use rag_rhythm::pattern::{onset_distance, OnsetPattern};
///
/// let x = OnsetPattern::parse("10101010").unwrap();
/// let y = OnsetPattern::parse("11001001").unwrap();
/// assert_eq!(onset_distance(&x, &y), 0 + 1 + 0 + 1);
/// ```
pub fn onset_distance(x: &OnsetPattern, y: &OnsetPattern) -> usize {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.onset_count(), y.onset_count());

    x.onset_positions()
        .into_iter()
        .zip(y.onset_positions())
        .map(|(a, b)| if a > b { a - b } else { b - a })
        .sum()
}

impl FromStr for OnsetPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OnsetPattern::parse(s)
    }
}

impl fmt::Display for OnsetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OnsetPattern {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

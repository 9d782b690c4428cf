// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Reader for xmk transcriptions.
//!
//! An xmk file starts with a header line (see [`Header`]), followed by the
//! measures of the song:
//!
//! ```text
//! =1
//! 1/4	67	55
//! 1/8	-1	55
//! 3/8	69	55[7]
//! =2
//! ...
//! =end
//! ```
//!
//! `=N` opens measure `N`, every other line is an onset consisting of the note
//! value, the MIDI pitch of the melody (`-1` for a rest) and the chord playing
//! underneath (see [`Chord::decode`]).

mod header;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use snafu::{ResultExt, Snafu};

use crate::chord::{Chord, ChordError};
use crate::config::PatternLength;
use crate::note::Pitch;
use crate::pattern::{self, OnsetPattern, PatternError};
use crate::rational::{Int, Rational, RationalError};

pub use header::Header;

/// Measures are numbered starting at 1, but files may skip numbers.
pub type MeasureNumber = u32;

/// A single line within a measure: a note or rest and the chord under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Onset {
    /// Fraction of a whole note the onset lasts.
    pub value: Rational,
    /// Denominator of the note value as written, before reduction. A `2/16`
    /// needs a grid of sixteenths even though it lasts an eighth.
    pub denominator: Int,
    pub pitch: Pitch,
    pub chord: Chord,
}

/// A parsed xmk file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    header: Header,
    measures: BTreeMap<MeasureNumber, Vec<Onset>>,
}

#[derive(Debug, Snafu)]
pub enum XmkError {
    #[snafu(display("could not read {}: {}", path.display(), source))]
    Io { source: io::Error, path: PathBuf },
    #[snafu(display("file is empty, expected a header line"))]
    MissingHeader,
    #[snafu(display("header field {:?} is not an integer", text))]
    HeaderField { text: String },
    #[snafu(display("header needs 3 bracketed fields, found {}", found))]
    MissingHeaderField { found: usize },
    #[snafu(display("line {}: {:?} is not a measure number", line, text))]
    BadMeasureNumber { line: usize, text: String },
    #[snafu(display("line {}: onset outside of any measure", line))]
    OrphanOnset { line: usize },
    #[snafu(display("line {}: missing {}", line, field))]
    MissingField { line: usize, field: &'static str },
    #[snafu(display("line {}: invalid note value: {}", line, source))]
    NoteValue { line: usize, source: RationalError },
    #[snafu(display("line {}: note value {} must be positive", line, value))]
    NonPositiveValue { line: usize, value: Rational },
    #[snafu(display("line {}: {:?} is not a MIDI pitch or -1", line, text))]
    InvalidPitch { line: usize, text: String },
    #[snafu(display("line {}: {}", line, source))]
    InvalidChord { line: usize, source: ChordError },
    #[snafu(display("measure {}: {}", measure, source))]
    MeasurePattern {
        measure: MeasureNumber,
        source: PatternError,
    },
}

/// Read and parse an xmk file.
pub fn read(path: &Path) -> Result<Song, XmkError> {
    let source = std::fs::read_to_string(path).context(Io { path })?;
    let song = parse(&source)?;
    debug!(
        "read {} ({}, {} measures)",
        path.display(),
        song.header,
        song.measures.len()
    );
    Ok(song)
}

/// Parse the contents of an xmk file.
pub fn parse(source: &str) -> Result<Song, XmkError> {
    let mut lines = source.lines().enumerate().map(|(index, text)| (index + 1, text));
    let header = match lines.next() {
        Some((_, text)) => Header::parse(text)?,
        None => return Err(XmkError::MissingHeader),
    };

    let mut measures: BTreeMap<MeasureNumber, Vec<Onset>> = BTreeMap::new();
    let mut current = None;
    for (line, text) in lines {
        let text = text.trim();
        if text.is_empty() || text.starts_with("=end") {
            continue;
        }
        if let Some(number) = text.strip_prefix('=') {
            let number = number
                .trim()
                .parse()
                .map_err(|_| XmkError::BadMeasureNumber {
                    line,
                    text: text.to_owned(),
                })?;
            measures.entry(number).or_default();
            current = Some(number);
        } else {
            let measure = current.ok_or(XmkError::OrphanOnset { line })?;
            let onset = parse_onset(line, text)?;
            measures.entry(measure).or_default().push(onset);
        }
    }

    Ok(Song { header, measures })
}

fn parse_onset(line: usize, text: &str) -> Result<Onset, XmkError> {
    let mut fields = text.split_whitespace();
    let mut field = |name: &'static str| {
        fields
            .next()
            .ok_or(XmkError::MissingField { line, field: name })
    };
    let value_str = field("note value")?;
    let pitch_str = field("pitch")?;
    let chord_str = field("chord")?;

    let (value, denominator) = parse_value(value_str).context(NoteValue { line })?;
    if !value.is_positive() || denominator < 0 {
        return Err(XmkError::NonPositiveValue { line, value });
    }
    let pitch = pitch_str
        .parse()
        .ok()
        .and_then(Pitch::from_xmk)
        .ok_or_else(|| XmkError::InvalidPitch {
            line,
            text: pitch_str.to_owned(),
        })?;
    let chord = Chord::decode(chord_str).context(InvalidChord { line })?;

    Ok(Onset {
        value,
        denominator,
        pitch,
        chord,
    })
}

/// Parse a note value, which must be written as `<int>/<int>`, together with
/// its unreduced denominator.
fn parse_value(text: &str) -> Result<(Rational, Int), RationalError> {
    let value: Rational = text.parse()?;
    match text.find('/').map(|index| text[index + 1..].parse()) {
        Some(Ok(denominator)) => Ok((value, denominator)),
        _ => Err(RationalError::Malformed {
            text: text.to_owned(),
        }),
    }
}

impl Onset {
    /// Check that the note value as written can be counted in cells of `length`.
    fn check_grid(&self, length: PatternLength) -> Result<(), PatternError> {
        if length.get() as Int % self.denominator == 0 {
            Ok(())
        } else {
            Err(PatternError::DivisionMismatch {
                value: self.value,
                length: length.get(),
            })
        }
    }
}

impl Song {
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of measures in the song.
    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn measure(&self, number: MeasureNumber) -> Option<&[Onset]> {
        self.measures.get(&number).map(Vec::as_slice)
    }

    /// All measures in ascending order of their number.
    pub fn measures(&self) -> impl Iterator<Item = (MeasureNumber, &[Onset])> + '_ {
        self.measures
            .iter()
            .map(|(number, onsets)| (*number, onsets.as_slice()))
    }

    /// The melody pitches of a measure.
    pub fn notes(&self, number: MeasureNumber) -> Option<Vec<Pitch>> {
        self.measure(number)
            .map(|onsets| onsets.iter().map(|onset| onset.pitch).collect())
    }

    /// The melody pitches of every measure.
    pub fn measure_notes(&self) -> BTreeMap<MeasureNumber, Vec<Pitch>> {
        self.measures()
            .map(|(number, onsets)| (number, onsets.iter().map(|o| o.pitch).collect()))
            .collect()
    }

    /// The chord progression of every measure.
    ///
    /// A chord held over several onsets is listed once; a chord that comes
    /// back after a different one is listed again.
    pub fn measure_chords(&self) -> BTreeMap<MeasureNumber, Vec<Chord>> {
        self.measures()
            .map(|(number, onsets)| {
                let mut chords: Vec<Chord> = Vec::new();
                for onset in onsets {
                    if chords.last() != Some(&onset.chord) {
                        chords.push(onset.chord.clone());
                    }
                }
                (number, chords)
            })
            .collect()
    }

    /// The rhythm of every measure, in ascending order of measure number.
    ///
    /// Every note value must be written with a denominator dividing `length`.
    pub fn measure_patterns(
        &self,
        length: PatternLength,
    ) -> Result<Vec<(MeasureNumber, OnsetPattern)>, XmkError> {
        self.encode_measures(length, |onset| onset.pitch.is_rest())
    }

    /// The rhythm of the accompaniment: an onset wherever a chord is struck,
    /// silence where the chord column is `-1`.
    pub fn accompaniment_patterns(
        &self,
        length: PatternLength,
    ) -> Result<Vec<OnsetPattern>, XmkError> {
        Ok(self
            .encode_measures(length, |onset| onset.chord.is_none())?
            .into_iter()
            .map(|(_, pattern)| pattern)
            .collect())
    }

    fn encode_measures<F>(
        &self,
        length: PatternLength,
        is_silent: F,
    ) -> Result<Vec<(MeasureNumber, OnsetPattern)>, XmkError>
    where
        F: Fn(&Onset) -> bool,
    {
        self.measures()
            .map(|(measure, onsets)| {
                onsets
                    .iter()
                    .try_for_each(|onset| onset.check_grid(length))
                    .and_then(|()| {
                        let values = onsets.iter().map(|o| (o.value, is_silent(o)));
                        pattern::encode(values, length)
                    })
                    .map(|pattern| (measure, pattern))
                    .context(MeasurePattern { measure })
            })
            .collect()
    }

    /// Like [`Song::measure_patterns`], without the measure numbers.
    pub fn onset_patterns(&self, length: PatternLength) -> Result<Vec<OnsetPattern>, XmkError> {
        Ok(self
            .measure_patterns(length)?
            .into_iter()
            .map(|(_, pattern)| pattern)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;
    use expect_test::{expect, Expect};
    use std::fmt::Write;

    const MAPLE: &str = "Maple Leaf Rag [2][4][96]
=1
1/16\t68\t-1
1/8\t75\t-1
1/16\t68\t56
1/8\t72\t56
1/8\t-1\t56
=2
1/8\t68\t56[7]
1/8\t75\t56[7]
1/16\t68\t51[m]
3/16\t72\t51[m]
=end
";

    fn check(source: &str, output: Expect) {
        let song = parse(source).unwrap();
        let mut dump = format!("{}\n", song.header());
        for (number, onsets) in song.measures() {
            writeln!(dump, "={}", number).unwrap();
            for onset in onsets {
                writeln!(dump, "{} {} {}", onset.value, onset.pitch, onset.chord).unwrap();
            }
        }
        output.assert_eq(&dump);
    }

    fn parse_err(source: &str) -> String {
        parse(source).unwrap_err().to_string()
    }

    #[test]
    fn parse_maple_leaf() {
        check(
            MAPLE,
            expect![[r#"
                2/4 at 96 bpm
                =1
                1/16 G#4 -
                1/8 D#5 -
                1/16 G#4 <56 60 63>
                1/8 C5 <56 60 63>
                1/8 rest <56 60 63>
                =2
                1/8 G#4 <56 60 63 66>
                1/8 D#5 <56 60 63 66>
                1/16 G#4 <51 54 58>
                3/16 C5 <51 54 58>
            "#]],
        );
    }

    #[test]
    fn measures_may_skip_numbers() {
        let song = parse("[4][4][120]\n=3\n1/1 60 60\n=7\n1/1 -1 -1\n").unwrap();
        let numbers: Vec<_> = song.measures().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![3, 7]);
        assert_eq!(song.notes(7), Some(vec![Pitch::Rest]));
        assert_eq!(song.notes(4), None);

        let notes = song.measure_notes();
        assert_eq!(notes.keys().copied().collect::<Vec<_>>(), vec![3, 7]);
        assert_eq!(notes[&3], vec![Pitch::Note(Note::from_midi(60))]);
    }

    #[test]
    fn chords_collapse_repeats() {
        let song = parse(MAPLE).unwrap();
        let chords = song.measure_chords();
        assert_eq!(
            chords[&1],
            vec![Chord::None, Chord::Triad(vec![56, 60, 63])]
        );
        assert_eq!(
            chords[&2],
            vec![
                Chord::Triad(vec![56, 60, 63, 66]),
                Chord::Triad(vec![51, 54, 58])
            ]
        );
    }

    #[test]
    fn patterns_of_maple_leaf() {
        let song = parse(MAPLE).unwrap();
        let patterns = song
            .onset_patterns(PatternLength::new(16).unwrap())
            .unwrap();
        let patterns: Vec<&str> = patterns.iter().map(|p| p.as_str()).collect();
        // 2/4 measures only fill the first half of the grid
        assert_eq!(patterns, vec!["1101100000000000", "1010110000000000"]);
    }

    #[test]
    fn sixteenths_do_not_fit_eighths() {
        let song = parse(MAPLE).unwrap();
        match song.onset_patterns(PatternLength::EIGHTHS) {
            Err(XmkError::MeasurePattern { measure, source }) => {
                assert_eq!(measure, 1);
                assert!(matches!(source, PatternError::DivisionMismatch { .. }));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn written_denominator_must_divide_the_grid() {
        let song = parse("[4][4][120]\n=1\n2/16 60 60\n3/4 62 60\n").unwrap();
        assert_eq!(song.measure(1).unwrap()[0].value, Rational::nth(8));
        match song.measure_patterns(PatternLength::EIGHTHS) {
            Err(XmkError::MeasurePattern { measure, source }) => {
                assert_eq!(measure, 1);
                assert_eq!(
                    source,
                    PatternError::DivisionMismatch {
                        value: Rational::nth(8),
                        length: 8
                    }
                );
            }
            other => panic!("unexpected result {:?}", other),
        }
        let patterns = song
            .onset_patterns(PatternLength::new(16).unwrap())
            .unwrap();
        assert_eq!(patterns[0].as_str(), "1010000000000000");
    }

    #[test]
    fn huge_note_values() {
        let song = parse("[4][4][120]\n=1\n9223372036854775807/1 60 60\n").unwrap();
        assert_eq!(
            song.measure_patterns(PatternLength::new(16).unwrap())
                .unwrap_err()
                .to_string(),
            "measure 1: note value 9223372036854775807/1 is far longer than a measure"
        );
    }

    #[test]
    fn accompaniment_follows_the_chord_column() {
        let song = parse(MAPLE).unwrap();
        let patterns = song
            .accompaniment_patterns(PatternLength::new(16).unwrap())
            .unwrap();
        let patterns: Vec<&str> = patterns.iter().map(|p| p.as_str()).collect();
        assert_eq!(patterns, vec!["0001101000000000", "1010110000000000"]);
    }

    #[test]
    fn format_errors() {
        assert_eq!(parse_err(""), "file is empty, expected a header line");
        assert_eq!(
            parse_err("[4][4][120]\n1/4 60 60\n"),
            "line 2: onset outside of any measure"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=1\n1/4 60\n"),
            "line 3: missing chord"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=1\nx/4 60 60\n"),
            "line 3: invalid note value: \"x\" is not an integer"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=1\n1 60 60\n"),
            "line 3: invalid note value: \"1\" is not of the form <int>/<int>"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=1\n-9223372036854775808/1 60 60\n"),
            "line 3: note value -9223372036854775808/1 must be positive"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=1\n0/4 60 60\n"),
            "line 3: note value 0/1 must be positive"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=1\n1/4 -5 60\n"),
            "line 3: \"-5\" is not a MIDI pitch or -1"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=1\n1/4 60 G[m]\n"),
            "line 3: chord root \"G\" is not an integer"
        );
        assert_eq!(
            parse_err("[4][4][120]\n=one\n"),
            "line 2: \"=one\" is not a measure number"
        );
    }
}

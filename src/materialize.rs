// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Turning a measure's pitches and a rhythm back into notes with durations.

use std::fmt;

use log::{debug, warn};
use snafu::Snafu;

use crate::chord::Chord;
use crate::note::Pitch;
use crate::pattern::OnsetPattern;
use crate::rational::Rational;
use crate::rules::RuleSet;
use crate::xmk::{Header, MeasureNumber, Song};

/// A note or rest of a generated melody.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MelodyEvent {
    pub pitch: Pitch,
    /// Fraction of a whole note.
    pub value: Rational,
}

/// One measure of a generated melody.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MelodyMeasure {
    pub number: MeasureNumber,
    /// The rhythm the measure was built from.
    pub pattern: OnsetPattern,
    pub events: Vec<MelodyEvent>,
}

/// The chords of one measure, without repetitions and without silent stretches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarmonyMeasure {
    pub number: MeasureNumber,
    pub chords: Vec<Chord>,
}

/// A song with substituted rhythms, ready to be handed to a renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedSong {
    pub header: Header,
    pub melody: Vec<MelodyMeasure>,
    pub harmony: Vec<HarmonyMeasure>,
    /// Rules that did not fit the notes of a measure. Those measures kept
    /// their own rhythm.
    pub unaligned: Vec<MaterializeError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum MaterializeError {
    #[snafu(display(
        "measure {}: {} notes cannot be placed on the {} segments of {}",
        measure,
        notes,
        segments,
        pattern
    ))]
    Unaligned {
        measure: MeasureNumber,
        pattern: OnsetPattern,
        notes: usize,
        segments: usize,
    },
    #[snafu(display("measure {} is not part of the song", measure))]
    MissingMeasure { measure: MeasureNumber },
}

/// Make room for rests a rhythm has no segment for.
///
/// Patterns only mark onsets, so a rest inside a measure usually shares its
/// segment with the note before it. When the number of segments does not
/// match the number of notes, every rest after the first note takes one cell
/// from the preceding segment. This only approximates where the rest really
/// falls, since neither the rhythm nor the onset distance used to choose it
/// know about rests.
pub fn reconcile_rests(notes: &[Pitch], lengths: &mut Vec<usize>) {
    if notes.len() == lengths.len() {
        return;
    }
    for i in 1..notes.len() {
        if !notes[i].is_rest() {
            continue;
        }
        match lengths.get(i - 1) {
            Some(&previous) if previous > 0 => {
                lengths.insert(i, 1);
                lengths[i - 1] -= 1;
            }
            _ => {}
        }
    }
}

/// Assign the pitches of a measure to the segments of `pattern`.
///
/// # Examples
///
/// ```
/// use rag_rhythm::materialize::materialize;
/// use rag_rhythm::note::{Note, Pitch};
/// use rag_rhythm::pattern::OnsetPattern;
/// use rag_rhythm::rational::Rational;
///
/// let notes = [Pitch::Note(Note::from_midi(67)), Pitch::Note(Note::from_midi(69))];
/// let pattern = OnsetPattern::parse("10010000").unwrap();
/// let measure = materialize(1, &notes, &pattern).unwrap();
/// assert_eq!(measure.events[0].value, Rational::new(3, 8));
/// assert_eq!(measure.events[1].value, Rational::new(5, 8));
/// ```
pub fn materialize(
    measure: MeasureNumber,
    notes: &[Pitch],
    pattern: &OnsetPattern,
) -> Result<MelodyMeasure, MaterializeError> {
    let mut lengths = pattern.note_lengths();
    if lengths.len() != notes.len() {
        debug!(
            "measure {}: placing {} notes on {} segments of {}",
            measure,
            notes.len(),
            lengths.len(),
            pattern
        );
        reconcile_rests(notes, &mut lengths);
    }
    if lengths.len() < notes.len() {
        return Err(MaterializeError::Unaligned {
            measure,
            pattern: pattern.clone(),
            notes: notes.len(),
            segments: lengths.len(),
        });
    }

    let cells = pattern.len() as i64;
    let events = notes
        .iter()
        .zip(lengths)
        .map(|(&pitch, length)| MelodyEvent {
            pitch,
            value: Rational::new(length as i64, cells),
        })
        .collect();

    Ok(MelodyMeasure {
        number: measure,
        pattern: pattern.clone(),
        events,
    })
}

/// Rebuild a whole song, replacing the rhythm of every measure that has a rule.
///
/// `patterns` are the measure patterns of `song` the rules were generated from.
/// A measure whose notes cannot be placed on its replacement rhythm keeps its
/// own rhythm and is listed in [`GeneratedSong::unaligned`]. Only a measure
/// that does not fit its own rhythm either fails the whole song.
pub fn generate_song(
    song: &Song,
    patterns: &[(MeasureNumber, OnsetPattern)],
    rules: &RuleSet,
) -> Result<GeneratedSong, MaterializeError> {
    let mut melody = Vec::with_capacity(patterns.len());
    let mut unaligned = Vec::new();
    for (number, pattern) in patterns {
        let notes = song
            .notes(*number)
            .ok_or(MaterializeError::MissingMeasure { measure: *number })?;
        let target = rules.apply(pattern);
        let measure = match materialize(*number, &notes, target) {
            Err(err) if target != pattern => {
                warn!("{}, keeping {}", err, pattern);
                unaligned.push(err);
                materialize(*number, &notes, pattern)?
            }
            result => result?,
        };
        melody.push(measure);
    }

    let harmony = song
        .measure_chords()
        .into_iter()
        .map(|(number, chords)| HarmonyMeasure {
            number,
            chords: chords.into_iter().filter(|chord| !chord.is_none()).collect(),
        })
        .collect();

    Ok(GeneratedSong {
        header: *song.header(),
        melody,
        harmony,
        unaligned,
    })
}

impl fmt::Display for GeneratedSong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for measure in &self.melody {
            write!(f, "={} {} |", measure.number, measure.pattern)?;
            for event in &measure.events {
                write!(f, " {} {}", event.pitch, event.value)?;
            }
            if let Some(harmony) = self.harmony.iter().find(|h| h.number == measure.number) {
                write!(f, " |")?;
                for chord in &harmony.chords {
                    write!(f, " {}", chord)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

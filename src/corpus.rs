// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The reference corpus of ragtime rhythms.
//!
//! A corpus is anything that can list the measure patterns of a collection of
//! songs. From it a [`PatternTable`] is built which tells, for every number of
//! onsets, how often each pattern with that many onsets occurs.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use snafu::{ResultExt, Snafu};

use crate::config::PatternLength;
use crate::pattern::{OnsetPattern, PatternError};
use crate::xmk::{self, XmkError};

/// The measure rhythms of one song of the corpus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongPatterns {
    pub title: String,
    pub melody: Vec<OnsetPattern>,
    /// Rhythm of the accompaniment, if the corpus has it. Measure `i` of the
    /// bass belongs to measure `i` of the melody.
    pub bass: Option<Vec<OnsetPattern>>,
}

#[derive(Debug, Snafu)]
pub enum CorpusError {
    #[snafu(display("could not list {}: {}", path.display(), source))]
    ListDirectory { source: io::Error, path: PathBuf },
    #[snafu(display("{}: {}", path.display(), source))]
    ReadSong { source: XmkError, path: PathBuf },
    #[snafu(display("{}: {}", title, source))]
    StretchPattern { source: PatternError, title: String },
}

/// Read-only access to a collection of songs.
pub trait CorpusSource {
    /// The measure patterns of every song, in a stable order.
    fn songs(&self) -> Result<Vec<SongPatterns>, CorpusError>;
}

/// A corpus whose patterns are already known.
#[derive(Clone, Debug, Default)]
pub struct PatternCorpus {
    songs: Vec<SongPatterns>,
}

impl PatternCorpus {
    pub fn new(songs: Vec<SongPatterns>) -> Self {
        PatternCorpus { songs }
    }

    /// Add a song with only a melody line.
    pub fn push_melody(&mut self, title: impl Into<String>, melody: Vec<OnsetPattern>) {
        self.songs.push(SongPatterns {
            title: title.into(),
            melody,
            bass: None,
        });
    }
}

impl CorpusSource for PatternCorpus {
    fn songs(&self) -> Result<Vec<SongPatterns>, CorpusError> {
        Ok(self.songs.clone())
    }
}

/// All `.xmk` files in a directory, in file name order.
///
/// The chord column of the files serves as bass line.
#[derive(Clone, Debug)]
pub struct XmkDirectory {
    path: PathBuf,
    length: PatternLength,
}

impl XmkDirectory {
    /// Songs are encoded at `length` cells per measure; it must be fine enough
    /// for the shortest note value in any of the files.
    pub fn new(path: impl Into<PathBuf>, length: PatternLength) -> Self {
        XmkDirectory {
            path: path.into(),
            length,
        }
    }

    pub fn files(&self) -> Result<Vec<PathBuf>, CorpusError> {
        let path = &self.path;
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path).context(ListDirectory { path })? {
            let file = entry.context(ListDirectory { path })?.path();
            if file.extension().map_or(false, |ext| ext == "xmk") {
                files.push(file);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn title_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl CorpusSource for XmkDirectory {
    fn songs(&self) -> Result<Vec<SongPatterns>, CorpusError> {
        self.files()?
            .into_iter()
            .map(|path| {
                let (melody, bass) = xmk::read(&path)
                    .and_then(|song| {
                        Ok((
                            song.onset_patterns(self.length)?,
                            song.accompaniment_patterns(self.length)?,
                        ))
                    })
                    .context(ReadSong { path: &path })?;
                Ok(SongPatterns {
                    title: title_of(&path),
                    melody,
                    bass: Some(bass),
                })
            })
            .collect()
    }
}

/// A pattern of the corpus together with its share among all patterns with the
/// same number of onsets.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedPattern {
    pub weight: f64,
    pub pattern: OnsetPattern,
}

/// Corpus patterns grouped by their number of onsets.
///
/// Within a group the weights form a probability distribution: each pattern's
/// weight is its number of occurrences divided by the number of occurrences of
/// all patterns with the same onset count.
#[derive(Clone, Debug)]
pub struct PatternTable {
    length: PatternLength,
    groups: BTreeMap<usize, Vec<WeightedPattern>>,
}

impl PatternTable {
    /// Count the patterns of the given songs.
    ///
    /// Patterns shorter than `length` are stretched to it. Every occurrence
    /// counts, also repetitions within the same song. Within a group,
    /// patterns are listed in the order they were first seen.
    pub fn from_songs(songs: &[SongPatterns], length: PatternLength) -> Result<Self, CorpusError> {
        let mut first_seen: Vec<OnsetPattern> = Vec::new();
        let mut occurrences: HashMap<OnsetPattern, usize> = HashMap::new();
        let mut onset_totals: BTreeMap<usize, usize> = BTreeMap::new();

        for song in songs {
            for pattern in &song.melody {
                let pattern = pattern.stretch(length).context(StretchPattern {
                    title: song.title.as_str(),
                })?;
                *onset_totals.entry(pattern.onset_count()).or_insert(0) += 1;
                let count = occurrences.entry(pattern.clone()).or_insert(0);
                if *count == 0 {
                    first_seen.push(pattern);
                }
                *count += 1;
            }
        }

        let mut groups: BTreeMap<usize, Vec<WeightedPattern>> = BTreeMap::new();
        for pattern in first_seen {
            let onsets = pattern.onset_count();
            let weight = occurrences[&pattern] as f64 / onset_totals[&onsets] as f64;
            trace!("{} onsets: {} weighs {:.4}", onsets, pattern, weight);
            groups
                .entry(onsets)
                .or_default()
                .push(WeightedPattern { weight, pattern });
        }

        debug!(
            "pattern table from {} songs: {} distinct patterns in {} onset groups",
            songs.len(),
            occurrences.len(),
            groups.len()
        );
        Ok(PatternTable { length, groups })
    }

    /// Build the table from a corpus.
    pub fn from_corpus<C>(corpus: &C, length: PatternLength) -> Result<Self, CorpusError>
    where
        C: CorpusSource + ?Sized,
    {
        PatternTable::from_songs(&corpus.songs()?, length)
    }

    pub fn pattern_length(&self) -> PatternLength {
        self.length
    }

    /// The patterns with exactly `onsets` onsets.
    pub fn group(&self, onsets: usize) -> Option<&[WeightedPattern]> {
        self.groups.get(&onsets).map(Vec::as_slice)
    }

    /// All groups in ascending order of onset count.
    pub fn groups(&self) -> impl Iterator<Item = (usize, &[WeightedPattern])> + '_ {
        self.groups
            .iter()
            .map(|(onsets, group)| (*onsets, group.as_slice()))
    }

    /// Number of distinct patterns in the table.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

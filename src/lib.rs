// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

pub mod chord;
pub mod config;
pub mod corpus;
pub mod materialize;
pub mod note;
pub mod pattern;
pub mod rules;
pub mod syncopation;
pub mod xmk;

// Utility modules
pub mod rational;

use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snafu::{ResultExt, Snafu};

use crate::config::GeneratorConfig;
use crate::corpus::{PatternTable, XmkDirectory};
use crate::materialize::GeneratedSong;
use crate::rules::{RuleGenerator, RuleSet};
use crate::xmk::Song;

/// Errors of the complete analysis and generation pipeline.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}", source))]
    Config { source: config::ConfigError },
    #[snafu(display("{}", source))]
    Xmk { source: xmk::XmkError },
    #[snafu(display("{}", source))]
    Corpus { source: corpus::CorpusError },
    #[snafu(display("{}", source))]
    Materialize {
        source: materialize::MaterializeError,
    },
    #[snafu(display("could not write output: {}", source))]
    WriteOutput { source: std::io::Error },
}

impl From<config::ConfigError> for Error {
    fn from(source: config::ConfigError) -> Self {
        Error::Config { source }
    }
}

impl From<xmk::XmkError> for Error {
    fn from(source: xmk::XmkError) -> Self {
        Error::Xmk { source }
    }
}

impl From<corpus::CorpusError> for Error {
    fn from(source: corpus::CorpusError) -> Self {
        Error::Corpus { source }
    }
}

/// Give a song the rhythms of the corpus ("Algorithm 1").
///
/// Rules are drawn for every distinct measure rhythm of `song` at the
/// resolution of `table`, then every measure is rebuilt with its replacement
/// rhythm. Measures whose rhythm got no rule keep it, as do measures whose
/// notes do not fit their replacement (see [`materialize::generate_song`]).
///
/// Fails if the song cannot be encoded at the table's resolution, or if a
/// measure does not even fit its own rhythm.
pub fn rephrase<R>(
    song: &Song,
    table: &PatternTable,
    rng: &mut R,
) -> Result<(RuleSet, GeneratedSong), Error>
where
    R: Rng + ?Sized,
{
    let patterns = song.measure_patterns(table.pattern_length())?;
    let melody: Vec<_> = patterns.iter().map(|(_, pattern)| pattern.clone()).collect();
    let rules = RuleGenerator::new(table).generate(&melody, rng);
    let generated = materialize::generate_song(song, &patterns, &rules).context(Materialize)?;
    Ok((rules, generated))
}

/// Read a song and a corpus directory and [`rephrase`] the song.
///
/// Without a seed in `config` a random one is drawn and logged, so a run can
/// be repeated.
pub fn rephrase_files(
    config: &GeneratorConfig,
    song: &Path,
    corpus: &Path,
) -> Result<(RuleSet, GeneratedSong), Error> {
    let song = xmk::read(song)?;
    let corpus = XmkDirectory::new(corpus, config.corpus_length);
    let table = PatternTable::from_corpus(&corpus, config.pattern_length)?;

    let seed = config.seed.unwrap_or_else(rand::random);
    info!("using seed {}", seed);
    rephrase(&song, &table, &mut StdRng::seed_from_u64(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternLength;
    use crate::corpus::PatternCorpus;
    use crate::pattern::OnsetPattern;

    #[test]
    fn rephrase_keeps_pitches() {
        let song = xmk::parse(
            "[2][4][80]\n=1\n1/8 67 55\n1/8 69 55\n1/4 71 55\n=2\n1/8 67 55\n1/8 69 55\n1/4 71 55\n",
        )
        .unwrap();
        let mut corpus = PatternCorpus::default();
        corpus.push_melody(
            "ragged",
            ["11010000", "11100000", "11010000"]
                .iter()
                .map(|text| OnsetPattern::parse(text).unwrap())
                .collect(),
        );
        let table = PatternTable::from_corpus(&corpus, PatternLength::EIGHTHS).unwrap();

        let (rules, generated) =
            rephrase(&song, &table, &mut StdRng::seed_from_u64(1902)).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(generated.melody.len(), 2);
        for measure in &generated.melody {
            assert_eq!(measure.pattern.as_str(), "11010000");
            let pitches: Vec<String> = measure.events.iter().map(|e| e.pitch.to_string()).collect();
            assert_eq!(pitches, vec!["G4", "A4", "B4"]);
        }
    }

    #[test]
    fn rephrase_reports_unencodable_songs() {
        let song = xmk::parse("[4][4][80]\n=1\n1/16 67 55\n").unwrap();
        let table = PatternTable::from_corpus(&PatternCorpus::default(), PatternLength::EIGHTHS)
            .unwrap();
        let result = rephrase(&song, &table, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(Error::Xmk { .. })));
    }

    #[test]
    fn rephrase_from_files() {
        let dir = std::env::temp_dir().join(format!("rag-rhythm-files-{}", std::process::id()));
        let corpus = dir.join("corpus");
        std::fs::create_dir_all(&corpus).unwrap();
        std::fs::write(
            corpus.join("rag.xmk"),
            "[2][4][100]\n=1\n1/8 60 48\n1/4 62 48\n1/8 64 48\n=2\n1/8 60 48\n1/4 62 48\n1/8 64 48\n",
        )
        .unwrap();
        let song = dir.join("song.xmk");
        std::fs::write(&song, "[2][4][100]\n=1\n1/4 67 55\n1/8 69 55\n1/8 71 55\n").unwrap();

        let config = GeneratorConfig {
            seed: Some(42),
            ..GeneratorConfig::default()
        };
        let result = rephrase_files(&config, &song, &corpus);
        std::fs::remove_dir_all(&dir).unwrap();

        let (rules, generated) = result.unwrap();
        assert_eq!(rules.len(), 1);
        let values: Vec<String> = generated.melody[0]
            .events
            .iter()
            .map(|e| e.value.to_string())
            .collect();
        assert_eq!(values, vec!["1/8", "1/4", "5/8"]);
    }
}

// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Settings shared by the analysis and generation passes.

use std::{fmt, str::FromStr};

use snafu::Snafu;

/// Number of cells one measure is split into when encoding onset patterns.
///
/// Always a positive multiple of 8, so the coarsest grid resolves eighth notes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PatternLength(usize);

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ConfigError {
    #[snafu(display("pattern length must be a positive multiple of 8, got {}", length))]
    InvalidPatternLength { length: usize },
    #[snafu(display("{:?} is not a valid pattern length", text))]
    UnparsablePatternLength { text: String },
}

impl PatternLength {
    /// Eighth note resolution, what the reference corpus is stored in.
    pub const EIGHTHS: PatternLength = PatternLength(8);

    /// ```
    /// use rag_rhythm::config::PatternLength;
    ///
    /// assert!(PatternLength::new(16).is_ok());
    /// assert!(PatternLength::new(12).is_err());
    /// assert!(PatternLength::new(0).is_err());
    /// ```
    pub fn new(length: usize) -> Result<PatternLength, ConfigError> {
        if length > 0 && length % 8 == 0 {
            Ok(PatternLength(length))
        } else {
            Err(ConfigError::InvalidPatternLength { length })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// The largest onset distance a substitute rhythm may have.
    pub fn max_distance(self) -> usize {
        self.0 / 2
    }
}

impl Default for PatternLength {
    fn default() -> Self {
        PatternLength::EIGHTHS
    }
}

impl fmt::Display for PatternLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PatternLength {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let length = s
            .parse()
            .map_err(|_| ConfigError::UnparsablePatternLength { text: s.to_owned() })?;
        PatternLength::new(length)
    }
}

/// Parameters of one generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Resolution the song and the corpus are compared at.
    pub pattern_length: PatternLength,
    /// Resolution the xmk files of a corpus directory are encoded at before
    /// being stretched to `pattern_length`.
    pub corpus_length: PatternLength,
    /// Seed for the rule sampler. A fresh one is drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            pattern_length: PatternLength::default(),
            corpus_length: PatternLength::default(),
            seed: None,
        }
    }
}

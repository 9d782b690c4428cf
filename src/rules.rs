// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Choosing ragtime rhythms to replace the rhythms of a song.
//!
//! For every distinct measure pattern `x` of the song a replacement `y` is
//! drawn from the corpus patterns with the same number of onsets, weighted by
//! how common they are. `y` must differ from `x` and its onsets may be at most
//! half a measure away from those of `x` in total (see [`onset_distance`]).
//!
//! Only qualifying candidates are drawn from, so generation either finds a
//! rule in one draw or knows right away that there is none.

use std::collections::{HashMap, HashSet};

use log::{info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use snafu::Snafu;

use crate::config::PatternLength;
use crate::corpus::PatternTable;
use crate::pattern::{onset_distance, OnsetPattern};

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum RuleError {
    #[snafu(display("no corpus pattern has {} onsets, needed for {}", onsets, pattern))]
    MissingOnsetGroup { pattern: OnsetPattern, onsets: usize },
    #[snafu(display(
        "no rule found for {}: no other corpus pattern within distance {}",
        pattern,
        max_distance
    ))]
    NoCandidate {
        pattern: OnsetPattern,
        max_distance: usize,
    },
    #[snafu(display(
        "{} has {} cells but the corpus patterns have {}",
        pattern,
        pattern.len(),
        length
    ))]
    LengthMismatch {
        pattern: OnsetPattern,
        length: PatternLength,
    },
}

/// The substitutions chosen for one song.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: HashMap<OnsetPattern, OnsetPattern>,
    /// Song patterns in the order their rules were generated.
    order: Vec<OnsetPattern>,
    failures: Vec<RuleError>,
}

impl RuleSet {
    /// The pattern replacing `pattern`, if there is a rule for it.
    pub fn get(&self, pattern: &OnsetPattern) -> Option<&OnsetPattern> {
        self.rules.get(pattern)
    }

    /// The pattern a measure with rhythm `pattern` is played with.
    pub fn apply<'a>(&'a self, pattern: &'a OnsetPattern) -> &'a OnsetPattern {
        self.get(pattern).unwrap_or(pattern)
    }

    /// All rules in the order they were generated.
    pub fn iter(&self) -> impl Iterator<Item = (&OnsetPattern, &OnsetPattern)> + '_ {
        self.order.iter().map(move |x| (x, &self.rules[x]))
    }

    /// Song patterns no rule could be generated for. They keep their rhythm.
    pub fn failures(&self) -> &[RuleError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, from: OnsetPattern, to: OnsetPattern) {
        self.order.push(from.clone());
        self.rules.insert(from, to);
    }
}

/// Generates substitution rules from a shared corpus table.
#[derive(Clone, Copy, Debug)]
pub struct RuleGenerator<'a> {
    table: &'a PatternTable,
}

impl<'a> RuleGenerator<'a> {
    pub fn new(table: &'a PatternTable) -> Self {
        RuleGenerator { table }
    }

    pub fn pattern_length(&self) -> PatternLength {
        self.table.pattern_length()
    }

    /// The corpus patterns `pattern` may be replaced with, and their weights.
    pub fn candidates(
        &self,
        pattern: &OnsetPattern,
    ) -> Result<Vec<(&'a OnsetPattern, f64)>, RuleError> {
        let length = self.pattern_length();
        if pattern.len() != length.get() {
            return Err(RuleError::LengthMismatch {
                pattern: pattern.clone(),
                length,
            });
        }

        let onsets = pattern.onset_count();
        let group = self
            .table
            .group(onsets)
            .ok_or_else(|| RuleError::MissingOnsetGroup {
                pattern: pattern.clone(),
                onsets,
            })?;

        let max_distance = length.max_distance();
        Ok(group
            .iter()
            .filter(|entry| {
                entry.pattern != *pattern && onset_distance(pattern, &entry.pattern) <= max_distance
            })
            .map(|entry| (&entry.pattern, entry.weight))
            .collect())
    }

    /// Draw the replacement for a single pattern.
    pub fn rule_for<R>(&self, pattern: &OnsetPattern, rng: &mut R) -> Result<OnsetPattern, RuleError>
    where
        R: Rng + ?Sized,
    {
        let candidates = self.candidates(pattern)?;
        let no_candidate = || RuleError::NoCandidate {
            pattern: pattern.clone(),
            max_distance: self.pattern_length().max_distance(),
        };
        if candidates.is_empty() {
            return Err(no_candidate());
        }

        // the candidate weights still add up to the share of the whole group,
        // the distribution renormalizes them
        let distribution = WeightedIndex::new(candidates.iter().map(|(_, weight)| *weight))
            .map_err(|_| no_candidate())?;
        Ok(candidates[distribution.sample(rng)].0.clone())
    }

    /// Generate rules for every distinct pattern of a song.
    ///
    /// Patterns are visited in the order of their first occurrence. Patterns
    /// without a rule are recorded in [`RuleSet::failures`].
    pub fn generate<R>(&self, song_patterns: &[OnsetPattern], rng: &mut R) -> RuleSet
    where
        R: Rng + ?Sized,
    {
        let mut rules = RuleSet::default();
        let mut seen = HashSet::new();
        for x in song_patterns {
            if !seen.insert(x) {
                continue;
            }
            match self.rule_for(x, rng) {
                Ok(y) => {
                    info!("rule added: {} -> {}", x, y);
                    rules.insert(x.clone(), y);
                }
                Err(err) => {
                    warn!("{}", err);
                    rules.failures.push(err);
                }
            }
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::PatternCorpus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn p(text: &str) -> OnsetPattern {
        OnsetPattern::parse(text).unwrap()
    }

    fn corpus_table(melody: &[&str]) -> PatternTable {
        let mut corpus = PatternCorpus::default();
        corpus.push_melody("corpus", melody.iter().map(|text| p(text)).collect());
        PatternTable::from_corpus(&corpus, PatternLength::EIGHTHS).unwrap()
    }

    #[test]
    fn candidates_are_near_and_different() {
        let table = corpus_table(&["10101010", "11011000", "10110100", "11110000", "10101010"]);
        let generator = RuleGenerator::new(&table);
        let candidates: Vec<&str> = generator
            .candidates(&p("10101010"))
            .unwrap()
            .into_iter()
            .map(|(pattern, _)| pattern.as_str())
            .collect();
        // 11110000 is 0 + 1 + 2 + 3 = 6 away, more than half a measure
        assert_eq!(candidates, vec!["11011000", "10110100"]);
    }

    #[test]
    fn rules_respect_constraints() {
        let table = corpus_table(&[
            "10101010", "11011000", "10110100", "10011010", "11010000", "10100010", "10001000",
            "10000010", "11010000",
        ]);
        let generator = RuleGenerator::new(&table);
        let song = vec![
            p("10101010"),
            p("11010000"),
            p("10101010"),
            p("10001000"),
            p("11010000"),
        ];
        let mut rng = StdRng::seed_from_u64(1899);
        let rules = generator.generate(&song, &mut rng);

        assert_eq!(rules.len(), 3);
        assert!(rules.failures().is_empty());
        for (x, y) in rules.iter() {
            assert_ne!(x, y);
            assert_eq!(x.onset_count(), y.onset_count());
            assert!(onset_distance(x, y) <= 4);
        }
        let order: Vec<&str> = rules.iter().map(|(x, _)| x.as_str()).collect();
        assert_eq!(order, vec!["10101010", "11010000", "10001000"]);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let table = corpus_table(&["10101010", "11011000", "10110100", "10011010", "11101000"]);
        let generator = RuleGenerator::new(&table);
        let song = vec![p("10101010"), p("11011000")];
        let draw = |seed| {
            let rules = generator.generate(&song, &mut StdRng::seed_from_u64(seed));
            rules
                .iter()
                .map(|(x, y)| (x.clone(), y.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(7), draw(7));
    }

    #[test]
    fn single_candidate_is_always_chosen() {
        let table = corpus_table(&["10101010", "10101001"]);
        let generator = RuleGenerator::new(&table);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10 {
            assert_eq!(
                generator.rule_for(&p("10101010"), &mut rng).unwrap(),
                p("10101001")
            );
        }
    }

    #[test]
    fn missing_group_fails_only_that_pattern() {
        let table = corpus_table(&["10101010", "11011000"]);
        let generator = RuleGenerator::new(&table);
        let song = vec![p("10101010"), p("11111000")];
        let rules = generator.generate(&song, &mut StdRng::seed_from_u64(3));

        assert_eq!(rules.get(&p("10101010")), Some(&p("11011000")));
        assert_eq!(
            rules.failures(),
            &[RuleError::MissingOnsetGroup {
                pattern: p("11111000"),
                onsets: 5
            }]
        );
        // no rule, the measure keeps its rhythm
        assert_eq!(rules.apply(&p("11111000")), &p("11111000"));
    }

    #[test]
    fn no_candidate_terminates() {
        // the only other pattern with one onset is too far away
        let table = corpus_table(&["10000000", "00000001"]);
        let generator = RuleGenerator::new(&table);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generator.rule_for(&p("10000000"), &mut rng),
            Err(RuleError::NoCandidate {
                pattern: p("10000000"),
                max_distance: 4
            })
        );
        // a pattern never maps to itself
        let table = corpus_table(&["10000000"]);
        let generator = RuleGenerator::new(&table);
        assert!(matches!(
            generator.rule_for(&p("10000000"), &mut rng),
            Err(RuleError::NoCandidate { .. })
        ));
    }

    #[test]
    fn pattern_length_must_match_table() {
        let table = corpus_table(&["10101010"]);
        let generator = RuleGenerator::new(&table);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generator.rule_for(&p("1010101010101010"), &mut rng),
            Err(RuleError::LengthMismatch { .. })
        ));
    }
}

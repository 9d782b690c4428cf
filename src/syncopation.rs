// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Detection of the "121" figure, the short-long-short syncopation typical for
//! ragtime (sixteenth, eighth, sixteenth).
//!
//! Counting works on eighth note patterns. Each half of a measure can hold one
//! untied 121 (`1101` on a beat); a tied 121 starts off the beat and is either
//! in the middle of the measure or crosses the bar line. The augmented figure
//! is the same rhythm at twice the length.

use crate::pattern::OnsetPattern;

/// Number of 121 figures found in a song.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncopationCount {
    /// Measures that were examined.
    pub bars: usize,
    pub untied: usize,
    pub tied: usize,
    pub untied_augmented: usize,
    pub tied_augmented: usize,
}

impl SyncopationCount {
    /// Count the figures in the melody of a song.
    ///
    /// Measures not at eighth note resolution are skipped. If the bass line is
    /// given, measures where both melody and bass are silent are skipped as
    /// well.
    ///
    /// # Examples
    ///
    /// ```
    /// use rag_rhythm::pattern::OnsetPattern;
    /// use rag_rhythm::syncopation::SyncopationCount;
    ///
    /// let melody = vec![OnsetPattern::parse("11011101").unwrap()];
    /// let count = SyncopationCount::of_song(&melody, None);
    /// assert_eq!(count.untied, 2);
    /// ```
    pub fn of_song(melody: &[OnsetPattern], bass: Option<&[OnsetPattern]>) -> SyncopationCount {
        let mut count = SyncopationCount::default();

        for (index, pattern) in melody.iter().enumerate() {
            let bar = pattern.as_str();
            if let Some(bass) = bass.and_then(|bass| bass.get(index)) {
                if pattern.is_silent() && bass.is_silent() {
                    continue;
                }
            }
            if bar.len() != 8 {
                continue;
            }
            // a missing next bar never matches
            let next_bar = melody
                .get(index + 1)
                .map(OnsetPattern::as_str)
                .unwrap_or("XXXXXXXX");

            count.bars += 1;

            if &bar[0..4] == "1101" {
                count.untied += 1;
            }
            if &bar[4..8] == "1101" {
                count.untied += 1;
            }
            if &bar[2..6] == "1101" {
                count.tied += 1;
            }
            if &bar[6..8] == "11" && next_bar.starts_with("01") {
                count.tied += 1;
            }

            if bar == "10100010" {
                count.untied_augmented += 1;
            }
            if &bar[4..8] == "1010" && next_bar.starts_with("0010") {
                count.tied_augmented += 1;
            }
        }

        count
    }

    /// Merge the counts of two songs.
    pub fn add(self, other: SyncopationCount) -> SyncopationCount {
        SyncopationCount {
            bars: self.bars + other.bars,
            untied: self.untied + other.untied,
            tied: self.tied + other.tied,
            untied_augmented: self.untied_augmented + other.untied_augmented,
            tied_augmented: self.tied_augmented + other.tied_augmented,
        }
    }

    fn per_bar(&self, count: usize) -> Option<f64> {
        if self.bars == 0 {
            None
        } else {
            Some(count as f64 / self.bars as f64)
        }
    }

    /// Untied figures per examined measure, `None` if no measure was examined.
    pub fn untied_ratio(&self) -> Option<f64> {
        self.per_bar(self.untied)
    }

    pub fn tied_ratio(&self) -> Option<f64> {
        self.per_bar(self.tied)
    }

    pub fn untied_augmented_ratio(&self) -> Option<f64> {
        self.per_bar(self.untied_augmented)
    }

    pub fn tied_augmented_ratio(&self) -> Option<f64> {
        self.per_bar(self.tied_augmented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(texts: &[&str]) -> Vec<OnsetPattern> {
        texts
            .iter()
            .map(|text| OnsetPattern::parse(text).unwrap())
            .collect()
    }

    #[test]
    fn tied_across_bar_line() {
        let melody = song(&["10101011", "01101000"]);
        let count = SyncopationCount::of_song(&melody, None);
        assert_eq!(count.tied, 1);
        assert_eq!(count.untied, 0);
        assert_eq!(count.bars, 2);
    }

    #[test]
    fn tied_in_the_middle() {
        let count = SyncopationCount::of_song(&song(&["10110110"]), None);
        assert_eq!(count.tied, 1);
        assert_eq!(count.untied, 0);
    }

    #[test]
    fn augmented_figures() {
        let melody = song(&["10100010", "10101010", "00101000"]);
        let count = SyncopationCount::of_song(&melody, None);
        assert_eq!(count.untied_augmented, 1);
        assert_eq!(count.tied_augmented, 1);
    }

    #[test]
    fn last_bar_has_no_successor() {
        let count = SyncopationCount::of_song(&song(&["10101011"]), None);
        assert_eq!(count.tied, 0);
    }

    #[test]
    fn silent_bars_are_skipped_with_bass() {
        let melody = song(&["00000000", "11011000", "00000000"]);
        let bass = song(&["00000000", "10001000", "10001000"]);
        let count = SyncopationCount::of_song(&melody, Some(&bass));
        assert_eq!(count.bars, 2);
        assert_eq!(count.untied, 1);
        assert_eq!(count.untied_ratio(), Some(0.5));

        let count = SyncopationCount::of_song(&melody, None);
        assert_eq!(count.bars, 3);
    }

    #[test]
    fn finer_patterns_are_skipped() {
        let count = SyncopationCount::of_song(&song(&["1101000000000000"]), None);
        assert_eq!(count, SyncopationCount::default());
        assert_eq!(count.tied_ratio(), None);
    }

    #[test]
    fn counts_add_up() {
        let a = SyncopationCount::of_song(&song(&["11011101"]), None);
        let b = SyncopationCount::of_song(&song(&["10100010"]), None);
        let total = a.add(b);
        assert_eq!(total.bars, 2);
        assert_eq!(total.untied, 2);
        assert_eq!(total.untied_augmented, 1);
    }
}

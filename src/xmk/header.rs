// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The first line of an xmk file, holding the time signature and tempo.

use std::fmt;

use super::XmkError;

/// Time signature and tempo of a song.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Upper number of the time signature.
    pub beats_per_measure: i64,
    /// Lower number of the time signature; one beat lasts `1 / beat_unit`.
    pub beat_unit: i64,
    pub beats_per_minute: i64,
}

impl Header {
    /// Parse the header line.
    ///
    /// The three numbers are the first three integers enclosed in square
    /// brackets, anything outside of brackets is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use rag_rhythm::xmk::Header;
    ///
    /// let header = Header::parse("maple leaf [2][4][96]").unwrap();
    /// assert_eq!(header.beats_per_measure, 2);
    /// assert_eq!(header.beat_unit, 4);
    /// assert_eq!(header.beats_per_minute, 96);
    /// ```
    pub fn parse(line: &str) -> Result<Header, XmkError> {
        let mut numbers = Vec::with_capacity(3);
        for chunk in line.split('[').skip(1) {
            let text = chunk.split(']').next().unwrap_or("").trim();
            let number: i64 = text.parse().map_err(|_| XmkError::HeaderField {
                text: text.to_owned(),
            })?;
            numbers.push(number);
        }

        match numbers.as_slice() {
            [beats_per_measure, beat_unit, beats_per_minute, ..] => Ok(Header {
                beats_per_measure: *beats_per_measure,
                beat_unit: *beat_unit,
                beats_per_minute: *beats_per_minute,
            }),
            _ => Err(XmkError::MissingHeaderField {
                found: numbers.len(),
            }),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} at {} bpm",
            self.beats_per_measure, self.beat_unit, self.beats_per_minute
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_time() {
        assert_eq!(
            Header::parse("...[4][4][120]...").unwrap(),
            Header {
                beats_per_measure: 4,
                beat_unit: 4,
                beats_per_minute: 120
            }
        );
    }

    #[test]
    fn too_few_fields() {
        match Header::parse("[2][4]") {
            Err(XmkError::MissingHeaderField { found }) => assert_eq!(found, 2),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn field_must_be_integer() {
        match Header::parse("[2][x][100]") {
            Err(XmkError::HeaderField { text }) => assert_eq!(text, "x"),
            other => panic!("unexpected result {:?}", other),
        }
    }
}

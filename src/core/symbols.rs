// symbols.rs - Gap and unknown symbol classification

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Gap symbol
pub const GAP: u8 = b'-';

/// Symbols skipped by every distance and by substitution counting
pub const UNKNOWN: [u8; 2] = [b'N', b'X'];

/// Residue alphabet of an alignment. `N` and `X` are unknown in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alphabet {
    #[default]
    Nucleotide,
    Protein,
}

impl FromStr for Alphabet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nucleotide" | "nt" | "dna" => Ok(Alphabet::Nucleotide),
            "protein" | "aa" | "amino-acid" => Ok(Alphabet::Protein),
            _ => Err(format!("Invalid alphabet: {}. Use: nucleotide, protein", s)),
        }
    }
}

impl Alphabet {
    #[inline]
    pub fn is_unknown(self, symbol: u8) -> bool {
        UNKNOWN.contains(&symbol)
    }

    /// Neither a gap nor an unknown symbol
    #[inline]
    pub fn is_informative(self, symbol: u8) -> bool {
        symbol != GAP && !self.is_unknown(symbol)
    }

    /// Both symbols can be compared at this column
    #[inline]
    pub fn is_comparable(self, a: u8, b: u8) -> bool {
        self.is_informative(a) && self.is_informative(b)
    }

    pub fn name(self) -> &'static str {
        match self {
            Alphabet::Nucleotide => "nucleotide",
            Alphabet::Protein => "protein",
        }
    }
}

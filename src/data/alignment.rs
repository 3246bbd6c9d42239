// alignment.rs - Multiple sequence alignment container and FASTA I/O

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::Path;

use bio::io::fasta;
use regex::Regex;

use crate::data::partitions::PartitionList;
use crate::error::{MsaError, Result};
use crate::output::OutputFile;

/// A multiple sequence alignment: N rows of exactly L symbols each.
///
/// Row order is the canonical index space for every matrix built from the
/// alignment. Editing operations replace all rows at once so that every row
/// always has the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    ids: Vec<String>,
    rows: Vec<Vec<u8>>,
}

/// A set of rows whose sequences are identical
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdenticalGroup {
    pub representative: String,
    pub duplicates: Vec<String>,
}

impl Alignment {
    /// Build an alignment from ids and rows, validating its shape
    pub fn new(ids: Vec<String>, rows: Vec<Vec<u8>>) -> Result<Self> {
        if ids.len() != rows.len() {
            return Err(MsaError::invalid_alignment(format!(
                "{} identifiers supplied for {} rows",
                ids.len(),
                rows.len()
            )));
        }
        if rows.is_empty() {
            return Err(MsaError::invalid_alignment(
                "There are no sequences in this alignment",
            ));
        }

        let expected = rows[0].len();
        if expected == 0 {
            return Err(MsaError::invalid_alignment(format!(
                "Sequence '{}' is empty",
                ids[0]
            )));
        }
        for (id, row) in ids.iter().zip(rows.iter()) {
            if row.len() != expected {
                return Err(MsaError::invalid_alignment(format!(
                    "The alignments must be the same length: '{}' has {} columns, expected {}",
                    id,
                    row.len(),
                    expected
                )));
            }
        }

        Ok(Self { ids, rows })
    }

    /// Convenience constructor from string slices (ids are numbered)
    pub fn from_strs(rows: &[&str]) -> Result<Self> {
        let ids = (0..rows.len()).map(|i| format!("seq{}", i + 1)).collect();
        let rows = rows.iter().map(|r| r.as_bytes().to_ascii_uppercase()).collect();
        Self::new(ids, rows)
    }

    /// Load and validate an alignment from a FASTA file
    pub fn from_fasta(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| MsaError::Fasta {
            path: path.to_path_buf(),
            message: format!("Unable to open the alignment for reading: {}", e),
        })?;
        Self::from_fasta_reader(BufReader::new(file), path)
    }

    /// Load and validate an alignment from any FASTA reader.
    /// `source` is only used in error messages.
    pub fn from_fasta_reader<R: Read>(reader: R, source: &Path) -> Result<Self> {
        let reader = fasta::Reader::new(reader);
        let mut ids = Vec::new();
        let mut rows = Vec::new();

        for record_result in reader.records() {
            let record = record_result.map_err(|e| MsaError::Fasta {
                path: source.to_path_buf(),
                message: format!("Invalid FASTA record: {}", e),
            })?;
            ids.push(parse_row_id(record.id()));
            rows.push(record.seq().to_ascii_uppercase());
        }

        if rows.is_empty() {
            return Err(MsaError::Fasta {
                path: source.to_path_buf(),
                message: "File contains no sequences".to_string(),
            });
        }

        Self::new(ids, rows)
    }

    /// Write the alignment as FASTA (one line per sequence).
    ///
    /// Failure leaves the alignment untouched and is reported to the caller.
    pub fn write_fasta(&self, path: &Path) -> Result<()> {
        let mut out = OutputFile::create(path)?;
        {
            let mut writer = fasta::Writer::new(&mut out);
            for (id, row) in self.ids.iter().zip(self.rows.iter()) {
                writer.write(id, None, row)?;
            }
            writer.flush()?;
        }
        out.commit()
    }

    /// Number of rows (sequences)
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (alignment length)
    pub fn len(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[u8] {
        &self.rows[index]
    }

    /// Symbols of one column, in row order
    pub fn column(&self, index: usize) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().map(move |row| row[index])
    }

    /// Copy of the column range `range` for every row
    pub fn sub_alignment(&self, range: Range<usize>) -> Result<Self> {
        if range.start >= range.end || range.end > self.len() {
            return Err(MsaError::invalid_input(format!(
                "Column range {}..{} is not inside an alignment of length {}",
                range.start,
                range.end,
                self.len()
            )));
        }
        let rows = self
            .rows
            .iter()
            .map(|row| row[range.clone()].to_vec())
            .collect();
        Ok(Self {
            ids: self.ids.clone(),
            rows,
        })
    }

    /// Keep rows whose id matches `include` (if given) and does not match `exclude`
    pub fn select_rows(&self, include: Option<&Regex>, exclude: Option<&Regex>) -> Result<Self> {
        let mut ids = Vec::new();
        let mut rows = Vec::new();
        for (id, row) in self.ids.iter().zip(self.rows.iter()) {
            if let Some(re) = include {
                if !re.is_match(id) {
                    continue;
                }
            }
            if let Some(re) = exclude {
                if re.is_match(id) {
                    continue;
                }
            }
            ids.push(id.clone());
            rows.push(row.clone());
        }
        Self::new(ids, rows)
    }

    /// Swap in a new set of rows. Every row must share one length.
    pub(crate) fn replace_rows(&mut self, rows: Vec<Vec<u8>>) {
        debug_assert_eq!(rows.len(), self.ids.len());
        debug_assert!(rows.windows(2).all(|w| w[0].len() == w[1].len()));
        self.rows = rows;
    }

    /// Concatenate alignments column-wise (gene alignments into one
    /// concatenated alignment). Rows are matched by position and every input
    /// must list the same ids in the same order. Returns the partition end
    /// offsets of each input in the result.
    pub fn concatenate(alignments: &[Alignment]) -> Result<(Self, PartitionList)> {
        let first = alignments
            .first()
            .ok_or_else(|| MsaError::invalid_input("No alignments to concatenate"))?;

        let mut rows: Vec<Vec<u8>> = vec![Vec::new(); first.num_rows()];
        let mut ends = Vec::with_capacity(alignments.len());
        let mut total = 0;

        for (k, alignment) in alignments.iter().enumerate() {
            if alignment.ids != first.ids {
                return Err(MsaError::invalid_alignment(format!(
                    "Alignment {} does not list the same sequences as alignment 1 ({} vs {} rows)",
                    k + 1,
                    alignment.num_rows(),
                    first.num_rows()
                )));
            }
            for (dest, src) in rows.iter_mut().zip(alignment.rows.iter()) {
                dest.extend_from_slice(src);
            }
            total += alignment.len();
            ends.push(total);
        }

        let concatenated = Self::new(first.ids.clone(), rows)?;
        let partitions = PartitionList::new(ends)?;
        Ok((concatenated, partitions))
    }

    /// Group rows carrying identical sequences, in order of first appearance
    pub fn identical_row_groups(&self) -> Vec<IdenticalGroup> {
        let mut group_of: HashMap<&[u8], usize> = HashMap::new();
        let mut groups: Vec<IdenticalGroup> = Vec::new();

        for (id, row) in self.ids.iter().zip(self.rows.iter()) {
            match group_of.get(row.as_slice()) {
                Some(&g) => groups[g].duplicates.push(id.clone()),
                None => {
                    group_of.insert(row.as_slice(), groups.len());
                    groups.push(IdenticalGroup {
                        representative: id.clone(),
                        duplicates: Vec::new(),
                    });
                }
            }
        }

        groups
    }
}

/// Strip an `accn|` prefix from a FASTA id
fn parse_row_id(raw: &str) -> String {
    match raw.find("accn|") {
        Some(pos) => raw[pos + 5..].to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_new_rejects_unequal_rows() {
        let result = Alignment::new(
            vec!["a".to_string(), "b".to_string()],
            vec![b"ACGT".to_vec(), b"ACG".to_vec()],
        );
        assert!(matches!(result, Err(MsaError::InvalidAlignment { .. })));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(Alignment::new(Vec::new(), Vec::new()).is_err());
        assert!(Alignment::new(vec!["a".to_string()], vec![Vec::new()]).is_err());
    }

    #[test]
    fn test_fasta_reader_uppercases_and_strips_accn() {
        let fasta = b">accn|genome1 some description\nac-gt\nAA\n>genome2\nACTGTAA\n";
        let alignment = Alignment::from_fasta_reader(&fasta[..], Path::new("mem")).unwrap();
        assert_eq!(alignment.ids(), &["genome1".to_string(), "genome2".to_string()]);
        assert_eq!(alignment.row(0), b"AC-GTAA");
        assert_eq!(alignment.len(), 7);
    }

    #[test]
    fn test_fasta_reader_rejects_empty_input() {
        let result = Alignment::from_fasta_reader(&b""[..], Path::new("empty.fa"));
        assert!(matches!(result, Err(MsaError::Fasta { .. })));
    }

    #[test]
    fn test_fasta_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.fasta");
        let alignment = Alignment::from_strs(&["AC-GT", "AC-GA", "TC-GA"]).unwrap();
        alignment.write_fasta(&path).unwrap();

        let reloaded = Alignment::from_fasta(&path).unwrap();
        assert_eq!(reloaded, alignment);
    }

    #[test]
    fn test_write_to_unwritable_path_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        File::create(&blocker).unwrap().write_all(b"x").unwrap();

        let alignment = Alignment::from_strs(&["ACGT", "ACGA"]).unwrap();
        let result = alignment.write_fasta(&blocker.join("out.fasta"));
        assert!(matches!(result, Err(MsaError::Io(_))));
        assert_eq!(alignment.len(), 4);
    }

    #[test]
    fn test_sub_alignment() {
        let alignment = Alignment::from_strs(&["AC-GT", "AC-GA"]).unwrap();
        let sub = alignment.sub_alignment(3..5).unwrap();
        assert_eq!(sub.row(0), b"GT");
        assert_eq!(sub.row(1), b"GA");
        assert!(alignment.sub_alignment(4..6).is_err());
    }

    #[test]
    fn test_select_rows() {
        let alignment = Alignment::new(
            vec!["ecoli_1".into(), "ecoli_2".into(), "kpneu_1".into()],
            vec![b"AC".to_vec(), b"AG".to_vec(), b"TT".to_vec()],
        )
        .unwrap();
        let include = Regex::new("^ecoli").unwrap();
        let exclude = Regex::new("_2$").unwrap();
        let selected = alignment.select_rows(Some(&include), Some(&exclude)).unwrap();
        assert_eq!(selected.ids(), &["ecoli_1".to_string()]);
    }

    #[test]
    fn test_concatenate_records_partitions() {
        let a = Alignment::from_strs(&["ACG", "ACT"]).unwrap();
        let b = Alignment::from_strs(&["GG", "GA"]).unwrap();
        let (concat, partitions) = Alignment::concatenate(&[a, b]).unwrap();
        assert_eq!(concat.row(0), b"ACGGG");
        assert_eq!(concat.row(1), b"ACTGA");
        assert_eq!(partitions.ends(), &[3, 5]);
    }

    #[test]
    fn test_concatenate_requires_matching_rows() {
        let a = Alignment::from_strs(&["ACG", "ACT"]).unwrap();
        let b = Alignment::from_strs(&["GG", "GA", "TT"]).unwrap();
        assert!(Alignment::concatenate(&[a, b]).is_err());
    }

    #[test]
    fn test_identical_row_groups() {
        let alignment = Alignment::from_strs(&["ACGT", "ACGA", "ACGT", "ACGT"]).unwrap();
        let groups = alignment.identical_row_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].representative, "seq1");
        assert_eq!(groups[0].duplicates, vec!["seq3".to_string(), "seq4".to_string()]);
        assert!(groups[1].duplicates.is_empty());
    }
}

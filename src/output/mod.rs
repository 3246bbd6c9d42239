// mod.rs - Output formatters module

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::substitution::{SubstitutionModel, AMINO_ACIDS};
use crate::core::{DistanceMatrix, WindowScore};
use crate::data::{IdenticalGroup, PartitionList};
use crate::error::{MsaError, Result};

/// Supported distance matrix formats
pub const MATRIX_FORMATS: &[&str] = &["tsv", "csv", "phylip", "nexus", "json"];

mod file;

pub use file::OutputFile;

fn create_output(file_path: &str) -> Result<OutputFile> {
    OutputFile::create(file_path)
}

fn generated_at() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// `# Command`, `# Generated` and version lines, each wrapped in `open`/`close`
fn write_header<W: Write>(writer: &mut W, command_line: &str, open: &str, close: &str) -> Result<()> {
    writeln!(writer, "{}Command: {}{}", open, command_line, close)?;
    writeln!(writer, "{}Generated: {}{}", open, generated_at(), close)?;
    writeln!(writer, "{}msadist v{}{}", open, env!("CARGO_PKG_VERSION"), close)?;
    Ok(())
}

/// Write a labelled square matrix with `separator` between cells
fn write_delimited(
    file_path: &str,
    matrix: &DistanceMatrix,
    command_line: &str,
    separator: char,
) -> Result<()> {
    let mut writer = create_output(file_path)?;
    write_header(&mut writer, command_line, "# ", "")?;
    writeln!(writer, "# Distance: {}", matrix.kind().name())?;

    write!(writer, "Sample")?;
    for label in matrix.labels() {
        write!(writer, "{}{}", separator, label)?;
    }
    writeln!(writer)?;

    for (i, label) in matrix.labels().iter().enumerate() {
        write!(writer, "{}", label)?;
        for value in matrix.row(i) {
            write!(writer, "{}{}", separator, value)?;
        }
        writeln!(writer)?;
    }

    writer.commit()?;
    Ok(())
}

/// Write distance matrix in TSV format
pub fn write_tsv(file_path: &str, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    write_delimited(file_path, matrix, command_line, '\t')?;
    println!("✅ Distance matrix written to: {}", file_path);
    Ok(())
}

/// Write distance matrix in CSV format
pub fn write_csv(file_path: &str, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    write_delimited(file_path, matrix, command_line, ',')?;
    println!("✅ Distance matrix written to: {}", file_path);
    Ok(())
}

/// Write distance matrix in PHYLIP format (lower triangle).
/// PHYLIP has no comment syntax, so no header is written.
pub fn write_phylip(file_path: &str, matrix: &DistanceMatrix) -> Result<()> {
    let mut writer = create_output(file_path)?;

    writeln!(writer, "    {}", matrix.len())?;
    for (i, label) in matrix.labels().iter().enumerate() {
        write!(writer, "{:<10}", label)?;
        for value in &matrix.row(i)[..=i] {
            write!(writer, "  {}", value)?;
        }
        writeln!(writer)?;
    }

    writer.commit()?;
    println!("✅ Distance matrix written to: {} (PHYLIP format)", file_path);
    Ok(())
}

/// Write distance matrix in NEXUS format (lower triangle)
pub fn write_nexus(file_path: &str, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    let mut writer = create_output(file_path)?;

    writeln!(writer, "#NEXUS")?;
    write_header(&mut writer, command_line, "[", "]")?;
    writeln!(writer, "BEGIN DISTANCES;")?;
    writeln!(writer, "    DIMENSIONS NTAX={};", matrix.len())?;
    writeln!(writer, "    FORMAT LABELS LOWER DIAGONAL;")?;
    writeln!(writer, "    MATRIX")?;
    for (i, label) in matrix.labels().iter().enumerate() {
        write!(writer, "        {}", label)?;
        for value in &matrix.row(i)[..i] {
            write!(writer, " {}", value)?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "    ;")?;
    writeln!(writer, "END;")?;

    writer.commit()?;
    println!("✅ Distance matrix written to: {} (NEXUS format)", file_path);
    Ok(())
}

/// Serialize any report as pretty JSON
pub fn write_json<T: Serialize + ?Sized>(file_path: &str, value: &T) -> Result<()> {
    let mut writer = create_output(file_path)?;
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| MsaError::Io(std::io::Error::other(e)))?;
    writeln!(writer)?;
    writer.commit()?;
    println!("✅ JSON written to: {}", file_path);
    Ok(())
}

/// Write distance matrix in the specified format
pub fn write_matrix(file_path: &str, format: &str, matrix: &DistanceMatrix, command_line: &str) -> Result<()> {
    match format.to_lowercase().as_str() {
        "tsv" => write_tsv(file_path, matrix, command_line),
        "csv" => write_csv(file_path, matrix, command_line),
        "phylip" => write_phylip(file_path, matrix),
        "nexus" => write_nexus(file_path, matrix, command_line),
        "json" => write_json(file_path, matrix),
        _ => Err(MsaError::config(format!(
            "Unsupported output format: {}. Use: {}",
            format,
            MATRIX_FORMATS.join(", ")
        ))),
    }
}

/// Path of the k-th (1-based) partition matrix: `out.tsv` → `out.partition_1.tsv`
pub fn partition_output_path(file_path: &str, index: usize) -> PathBuf {
    let path = Path::new(file_path);
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}.partition_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}.partition_{}", stem, index),
    };
    path.with_file_name(name)
}

/// Write one matrix file per partition, returning the written paths
pub fn write_partition_matrices(
    file_path: &str,
    format: &str,
    matrices: &[DistanceMatrix],
    command_line: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(matrices.len());
    for (k, matrix) in matrices.iter().enumerate() {
        let path = partition_output_path(file_path, k + 1);
        write_matrix(&path.to_string_lossy(), format, matrix, command_line)?;
        written.push(path);
    }
    Ok(written)
}

/// Write partition end offsets as one comma-separated line
pub fn write_partitions(file_path: &str, partitions: &PartitionList) -> Result<()> {
    let mut writer = create_output(file_path)?;
    let ends: Vec<String> = partitions.ends().iter().map(|e| e.to_string()).collect();
    writeln!(writer, "{}", ends.join(","))?;
    writer.commit()?;
    println!("✅ Partition offsets written to: {}", file_path);
    Ok(())
}

/// Write window quality scores as a tab-separated table
pub fn write_window_scores(file_path: &str, scores: &[WindowScore], command_line: &str) -> Result<()> {
    let mut writer = create_output(file_path)?;
    write_header(&mut writer, command_line, "# ", "")?;

    {
        let mut table = csv::WriterBuilder::new().delimiter(b'\t').from_writer(&mut writer);
        for score in scores {
            table
                .serialize(score)
                .map_err(|e| MsaError::Io(std::io::Error::other(e)))?;
        }
        table.flush()?;
    }
    writer.commit()?;

    println!("✅ Window quality scores written to: {}", file_path);
    Ok(())
}

/// Write the 20×20 substitution matrix followed by marginal symbol counts
pub fn write_substitution_matrix(file_path: &str, model: &SubstitutionModel, command_line: &str) -> Result<()> {
    let mut writer = create_output(file_path)?;
    write_header(&mut writer, command_line, "# ", "")?;
    writeln!(writer, "# State: {:?}", model.state())?;

    write!(writer, "Symbol")?;
    for &symbol in AMINO_ACIDS.iter() {
        write!(writer, "\t{}", symbol as char)?;
    }
    writeln!(writer)?;

    for (i, row) in model.cells().iter().enumerate() {
        write!(writer, "{}", AMINO_ACIDS[i] as char)?;
        for value in row {
            write!(writer, "\t{}", value)?;
        }
        writeln!(writer)?;
    }

    write!(writer, "Marginal")?;
    for count in model.marginals() {
        write!(writer, "\t{}", count)?;
    }
    writeln!(writer)?;

    writer.commit()?;
    println!("✅ Substitution matrix written to: {}", file_path);
    Ok(())
}

/// Write groups of identical sequences: representative, then its duplicates
pub fn write_identical_groups(file_path: &str, groups: &[IdenticalGroup], command_line: &str) -> Result<()> {
    let mut writer = create_output(file_path)?;
    write_header(&mut writer, command_line, "# ", "")?;
    writeln!(writer, "Representative\tDuplicates")?;
    for group in groups.iter().filter(|g| !g.duplicates.is_empty()) {
        writeln!(writer, "{}\t{}", group.representative, group.duplicates.join(","))?;
    }
    writer.commit()?;
    println!("✅ Identical sequence groups written to: {}", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CancelToken, DistanceEngine, DistanceKind};
    use crate::core::symbols::Alphabet;
    use crate::data::Alignment;
    use std::fs;

    fn example_matrix() -> DistanceMatrix {
        let alignment = Alignment::from_strs(&["AC-GT", "AC-GA", "TC-GA"]).unwrap();
        DistanceEngine::new(DistanceKind::Raw, Alphabet::Nucleotide)
            .compute_distance_matrix(&alignment, &CancelToken::new())
            .unwrap()
    }

    fn data_lines(content: &str) -> Vec<&str> {
        content.lines().filter(|l| !l.starts_with('#')).collect()
    }

    #[test]
    fn test_write_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.tsv");
        let path = path.to_str().unwrap();
        write_matrix(path, "tsv", &example_matrix(), "msadist --task distance").unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("# Command: msadist --task distance"));
        let lines = data_lines(&content);
        assert_eq!(lines[0], "Sample\tseq1\tseq2\tseq3");
        assert_eq!(lines[1], "seq1\t0\t1\t2");
        assert_eq!(lines[3], "seq3\t2\t1\t0");
    }

    #[test]
    fn test_write_phylip_lower_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.phy");
        let path = path.to_str().unwrap();
        write_matrix(path, "phylip", &example_matrix(), "cmd").unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0].trim(), "3");
        assert_eq!(lines[3], format!("{:<10}  2  1  0", "seq3"));
        // nothing after the matrix rows
        assert_eq!(lines.len(), 4);
        assert!(!content.contains('#'));
    }

    #[test]
    fn test_write_json_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let path = path.to_str().unwrap();
        write_matrix(path, "json", &example_matrix(), "cmd").unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["kind"], "Raw");
        assert_eq!(value["labels"][2], "seq3");
        assert_eq!(value["values"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_unsupported_format() {
        let result = write_matrix("unused.out", "xlsx", &example_matrix(), "cmd");
        assert!(matches!(result, Err(MsaError::Config { .. })));
    }

    #[test]
    fn test_partition_output_path() {
        assert_eq!(partition_output_path("out/dist.tsv", 2), PathBuf::from("out/dist.partition_2.tsv"));
        assert_eq!(partition_output_path("dist", 1), PathBuf::from("dist.partition_1"));
    }

    #[test]
    fn test_write_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.partitions");
        let path = path.to_str().unwrap();
        write_partitions(path, &PartitionList::new(vec![3, 5, 9]).unwrap()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "3,5,9\n");

        let parsed = PartitionList::parse(fs::read_to_string(path).unwrap().trim()).unwrap();
        assert_eq!(parsed.ends(), &[3, 5, 9]);
    }

    #[test]
    fn test_filtered_partitions_read_back() {
        use crate::core::{distances_per_partition, filter_columns, ColumnFilter, DiversityPolicy};

        let mut alignment = Alignment::from_strs(&["AC-GT", "AC-GA", "TC-GA"]).unwrap();
        let mut partitions = PartitionList::new(vec![2, 4, 5]).unwrap();
        let filter = ColumnFilter::new(0.0, 1, DiversityPolicy::MinorAlleles).unwrap();
        let cancel = CancelToken::new();
        filter_columns(&mut alignment, &filter, Some(&mut partitions), &cancel).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.fasta.partitions");
        let path = path.to_str().unwrap();
        write_partitions(path, &partitions).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "1,1,2\n");

        let parsed = PartitionList::parse(fs::read_to_string(path).unwrap().trim()).unwrap();
        assert_eq!(parsed, partitions);
        let mut engine = DistanceEngine::new(DistanceKind::Raw, Alphabet::Nucleotide);
        let matrices = distances_per_partition(&alignment, &mut engine, &parsed, &cancel).unwrap();
        assert_eq!(matrices.len(), 3);
        assert!(matrices[1].row(0).iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_write_window_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("windows.tsv");
        let path = path.to_str().unwrap();
        let scores = vec![
            WindowScore { start: 0, end: 3, min_distance: 0.5 },
            WindowScore { start: 1, end: 4, min_distance: 1.0 },
        ];
        write_window_scores(path, &scores, "cmd").unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines = data_lines(&content);
        assert_eq!(lines, vec!["start\tend\tmin_distance", "0\t3\t0.5", "1\t4\t1.0"]);
    }

    #[test]
    fn test_write_identical_groups_skips_singletons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identical.tsv");
        let path = path.to_str().unwrap();
        let groups = vec![
            IdenticalGroup { representative: "a".into(), duplicates: vec!["b".into(), "c".into()] },
            IdenticalGroup { representative: "d".into(), duplicates: vec![] },
        ];
        write_identical_groups(path, &groups, "cmd").unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert_eq!(data_lines(&content), vec!["Representative\tDuplicates", "a\tb,c"]);
    }
}

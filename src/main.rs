// main.rs - CLI entry point

use std::path::Path;
use std::time::Instant;

use msadist::cli::Task;
use msadist::cli::Config;
use msadist::output::{
    write_identical_groups, write_partition_matrices, write_partitions, write_substitution_matrix,
    write_window_scores,
};
use msadist::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    println!("🚀 msadist v{}", env!("CARGO_PKG_VERSION"));

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("🧵 Threads: {}", n);
    } else {
        let num_threads = rayon::current_num_threads();
        println!("🧵 Threads: {} (auto-detected)", num_threads);
    }

    // Validate all arguments
    let validation = validate_args(&args)?;
    println!("🎯 Task: {}", validation.task.description());

    let total_start = Instant::now();
    let cancel = CancelToken::new();

    let mut alignments = Vec::with_capacity(validation.alignment_paths.len());
    for path in &validation.alignment_paths {
        alignments.push(load_alignment(path, &validation)?);
    }

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        return Ok(());
    }

    let output = args.output.as_deref();
    let ctx = TaskContext {
        args: &args,
        validation: &validation,
        cancel: &cancel,
        command_line: &command_line,
    };

    match validation.task {
        Task::Distance => run_distance(&ctx, &alignments[0], require_output(output)?)?,
        Task::Filter => run_filter(&ctx, alignments.remove(0), require_output(output)?)?,
        Task::RemoveGaps => run_remove_gaps(&ctx, alignments.remove(0), require_output(output)?)?,
        Task::DeletePartitions => run_delete_partitions(&ctx, alignments.remove(0), require_output(output)?)?,
        Task::PartitionDistances => run_partition_distances(&ctx, &alignments[0], require_output(output)?)?,
        Task::QualityScores => run_quality_scores(&ctx, &alignments[0], require_output(output)?)?,
        Task::SubstitutionMatrix => run_substitution_matrix(&ctx, &alignments, require_output(output)?)?,
        Task::Identical => run_identical(&ctx, &alignments[0], output)?,
        Task::Concatenate => run_concatenate(&alignments, require_output(output)?)?,
    }

    println!("\n🎉 Completed in {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

struct TaskContext<'a> {
    args: &'a Args,
    validation: &'a ValidationResult,
    cancel: &'a CancelToken,
    command_line: &'a str,
}

impl TaskContext<'_> {
    fn engine(&self) -> DistanceEngine {
        DistanceEngine::new(self.validation.distance_kind, self.validation.alphabet)
            .with_progress(!self.args.no_progress)
    }
}

fn require_output(output: Option<&str>) -> Result<&str, String> {
    output.ok_or_else(|| "--output is required".to_string())
}

/// Load a FASTA alignment and apply the sequence id filters
fn load_alignment(path: &str, validation: &ValidationResult) -> Result<Alignment, String> {
    let start = Instant::now();
    let alignment = Alignment::from_fasta(Path::new(path))?;
    println!(
        "📊 Loaded {} sequences × {} columns from {} ({:.2}s)",
        alignment.num_rows(),
        alignment.len(),
        path,
        start.elapsed().as_secs_f64()
    );

    if validation.include_regex.is_none() && validation.exclude_regex.is_none() {
        return Ok(alignment);
    }

    let selected = alignment.select_rows(validation.include_regex.as_ref(), validation.exclude_regex.as_ref())?;
    println!(
        "🔍 Sequence filter kept {} of {} sequences",
        selected.num_rows(),
        alignment.num_rows()
    );
    Ok(selected)
}

fn run_distance(ctx: &TaskContext, alignment: &Alignment, output: &str) -> Result<(), String> {
    let matrix = if ctx.args.core {
        println!("🧬 Core genome: gap-free columns with at least one substitution, shared distance");
        core_genome_distance_matrix(alignment, ctx.validation.alphabet, ctx.cancel)?
    } else {
        println!(
            "📏 Distance: {} ({})",
            ctx.validation.distance_kind.name(),
            ctx.validation.distance_kind.description()
        );
        let mut engine = ctx.engine();
        engine.prime(alignment, ctx.cancel)?;
        engine.compute_distance_matrix(alignment, ctx.cancel)?
    };

    if let Some(min) = matrix.min_off_diagonal() {
        println!("📉 Smallest pairwise distance: {}", min);
    }
    write_matrix(output, &ctx.args.format, &matrix, ctx.command_line)?;
    Ok(())
}

fn run_filter(ctx: &TaskContext, mut alignment: Alignment, output: &str) -> Result<(), String> {
    let filter = &ctx.validation.column_filter;
    println!(
        "🧹 Column filter: max gap fraction {}, min substitutions {} ({:?})",
        filter.max_gap_fraction, filter.min_substitutions, filter.policy
    );

    let mut partitions = ctx.validation.partitions.clone();
    let report = filter_columns(&mut alignment, filter, partitions.as_mut(), ctx.cancel)?;
    println!("✅ Kept {} columns, removed {}", report.retained, report.removed);

    alignment.write_fasta(Path::new(output))?;
    println!("✅ Filtered alignment written to: {}", output);

    if let Some(partitions) = partitions {
        write_partitions(&format!("{}.partitions", output), &partitions)?;
    }
    Ok(())
}

fn run_remove_gaps(ctx: &TaskContext, mut alignment: Alignment, output: &str) -> Result<(), String> {
    let removed = remove_gap_columns(&mut alignment, ctx.cancel)?;
    println!("✅ Removed {} gap columns, {} remain", removed, alignment.len());

    alignment.write_fasta(Path::new(output))?;
    println!("✅ Gap-free alignment written to: {}", output);
    Ok(())
}

fn run_delete_partitions(ctx: &TaskContext, mut alignment: Alignment, output: &str) -> Result<(), String> {
    let (starts, ends) = ctx
        .validation
        .delete_ranges
        .as_ref()
        .ok_or("--delete-starts and --delete-ends are required")?;

    let removed = delete_partitions(&mut alignment, starts, ends, ctx.cancel)?;
    println!(
        "✅ Deleted {} ranges ({} columns), {} remain",
        starts.len(),
        removed,
        alignment.len()
    );

    alignment.write_fasta(Path::new(output))?;
    println!("✅ Edited alignment written to: {}", output);
    Ok(())
}

fn run_partition_distances(ctx: &TaskContext, alignment: &Alignment, output: &str) -> Result<(), String> {
    let partitions = ctx
        .validation
        .partitions
        .as_ref()
        .ok_or("--partitions is required for partition-distances")?;
    println!(
        "📐 {} partitions, {} distance",
        partitions.len(),
        ctx.validation.distance_kind.name()
    );

    let mut engine = ctx.engine();
    let matrices = distances_per_partition(alignment, &mut engine, partitions, ctx.cancel)?;
    let written = write_partition_matrices(output, &ctx.args.format, &matrices, ctx.command_line)?;
    println!("✅ Wrote {} partition matrices", written.len());
    Ok(())
}

fn run_quality_scores(ctx: &TaskContext, alignment: &Alignment, output: &str) -> Result<(), String> {
    println!(
        "🪟 Sliding window: size {}, step {}, {} distance",
        ctx.args.window,
        ctx.args.step,
        ctx.validation.distance_kind.name()
    );

    let mut engine = ctx.engine();
    let scores = sliding_window_quality(alignment, &mut engine, ctx.args.step, ctx.args.window, ctx.cancel)?;
    if scores.is_empty() {
        eprintln!(
            "⚠️  Warning: window size {} is larger than the alignment ({} columns)",
            ctx.args.window,
            alignment.len()
        );
    }
    println!("✅ Scored {} windows", scores.len());
    write_window_scores(output, &scores, ctx.command_line)?;
    Ok(())
}

fn run_substitution_matrix(ctx: &TaskContext, alignments: &[Alignment], output: &str) -> Result<(), String> {
    println!(
        "🧮 Substitution matrix from {} alignments ({:?})",
        alignments.len(),
        ctx.validation.transform
    );
    let model = build_substitution_matrix(alignments, ctx.validation.transform, ctx.validation.alphabet, ctx.cancel)?;
    write_substitution_matrix(output, &model, ctx.command_line)?;
    Ok(())
}

fn run_identical(ctx: &TaskContext, alignment: &Alignment, output: Option<&str>) -> Result<(), String> {
    let groups = alignment.identical_row_groups();
    let duplicated = groups.iter().filter(|g| !g.duplicates.is_empty()).count();
    println!(
        "🔁 {} distinct sequences, {} with identical copies",
        groups.len(),
        duplicated
    );

    match output {
        Some(path) => write_identical_groups(path, &groups, ctx.command_line)?,
        None => {
            for group in groups.iter().filter(|g| !g.duplicates.is_empty()) {
                println!("  • {}: {}", group.representative, group.duplicates.join(", "));
            }
        }
    }
    Ok(())
}

fn run_concatenate(alignments: &[Alignment], output: &str) -> Result<(), String> {
    let (concatenated, partitions) = Alignment::concatenate(alignments)?;
    println!(
        "🔗 Concatenated {} alignments into {} columns",
        alignments.len(),
        concatenated.len()
    );

    concatenated.write_fasta(Path::new(output))?;
    println!("✅ Concatenated alignment written to: {}", output);
    write_partitions(&format!("{}.partitions", output), &partitions)?;
    Ok(())
}

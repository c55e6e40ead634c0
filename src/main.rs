use clap::Parser;
use phylotraj_tools::cli::{Args, Commands};
use phylotraj_tools::commands;

fn main() {
    let args = Args::parse();

    let result = match args.command {
        Commands::Split {
            json,
            output,
            strategy,
            test_proportion,
            mutations_back,
            max_clade_proportion,
            gene,
            seed,
            tolerance,
            trim_begin,
            trim_end,
        } => commands::split::run(
            json,
            output,
            strategy,
            test_proportion,
            mutations_back,
            max_clade_proportion,
            gene,
            seed,
            tolerance,
            trim_begin,
            trim_end,
        ),
        Commands::Branches {
            json,
            alignment,
            output,
            strip_prefix,
        } => commands::branches::run(json, alignment, output, strip_prefix),
        Commands::Alignment {
            json,
            output,
            gene,
            tips_only,
            strip_prefix,
        } => commands::alignment::run(json, output, gene, tips_only, strip_prefix),
        Commands::Trim {
            input_alignment,
            output_alignment,
            begin,
            end,
        } => commands::trim::run(input_alignment, output_alignment, begin, end),
        Commands::Sample {
            input,
            output,
            fraction,
            include_nodes,
            seed,
        } => commands::sample::run(input, output, fraction, include_nodes, seed),
        Commands::Trajectory {
            branches,
            alignment,
            output_dir,
            compress,
            summary,
            dataset,
            url,
        } => commands::trajectory::run(
            branches, alignment, output_dir, compress, summary, dataset, url,
        ),
        Commands::Pairwise {
            branches,
            alignment,
            output_dir,
            train_limit,
            test_limit,
            seed,
            summary,
            dataset,
            url,
        } => commands::pairwise::run(
            branches,
            alignment,
            output_dir,
            train_limit,
            test_limit,
            seed,
            summary,
            dataset,
            url,
        ),
        Commands::Colors { json, output } => commands::colors::run(json, output),
        Commands::Metadata {
            json,
            output,
            strip_prefix,
        } => commands::metadata::run(json, output, strip_prefix),
        Commands::Package {
            input_dir,
            output_dir,
            shard_size,
            shuffle,
            seed,
        } => commands::package::run(input_dir, output_dir, shard_size, shuffle, seed),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// How the test partition is picked by the split command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SplitStrategyArg {
    /// Randomly seeded clades, capped in size, until the target is reached
    RandomClades,
    /// One contiguous subtree whose size best matches the target
    Monophyletic,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mark entire clades as test data in an Auspice JSON tree
    Split {
        /// Input Auspice JSON file
        #[arg(long)]
        json: String,
        /// Output Auspice JSON file
        #[arg(long)]
        output: String,
        /// Clade selection strategy
        #[arg(long, value_enum, default_value = "random-clades")]
        strategy: SplitStrategyArg,
        /// Target proportion of tips held out as test (0.0-1.0)
        #[arg(long, default_value = "0.1")]
        test_proportion: f64,
        /// Mutations to walk back from each seed tip
        #[arg(long, default_value = "5")]
        mutations_back: u64,
        /// Max size of any single test clade as a proportion of total tips
        #[arg(long, default_value = "0.1")]
        max_clade_proportion: f64,
        /// Gene key for counting mutations
        #[arg(long, default_value = "nuc")]
        gene: String,
        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
        /// Clade size tolerance around the target (monophyletic strategy)
        #[arg(long, default_value = "0.5")]
        tolerance: f64,
        /// First position counted when walking back (1-based, inclusive)
        #[arg(long)]
        trim_begin: Option<usize>,
        /// Last position counted when walking back (1-based, inclusive)
        #[arg(long)]
        trim_end: Option<usize>,
    },

    /// Export parent/child branches with Hamming distances as TSV
    Branches {
        /// Input Auspice JSON file
        #[arg(long)]
        json: String,
        /// FASTA alignment with per-node sequences
        #[arg(long)]
        alignment: String,
        /// Output TSV file
        #[arg(long, default_value = "branches.tsv")]
        output: String,
        /// Prefix stripped from node names before matching and writing
        #[arg(long)]
        strip_prefix: Option<String>,
    },

    /// Reconstruct per-node sequences from branch mutations as FASTA
    Alignment {
        /// Input Auspice JSON file
        #[arg(long)]
        json: String,
        /// Output FASTA file
        #[arg(long, default_value = "alignment.fasta")]
        output: String,
        /// Gene to reconstruct; 'nuc' yields the full nucleotide sequence
        #[arg(long, default_value = "nuc")]
        gene: String,
        /// Only include tip (leaf) sequences
        #[arg(long)]
        tips_only: bool,
        /// Prefix stripped from node names before writing
        #[arg(long)]
        strip_prefix: Option<String>,
    },

    /// Trim every alignment record to a position window
    Trim {
        /// Input alignment in FASTA format
        #[arg(long)]
        input_alignment: String,
        /// Output path for the trimmed alignment
        #[arg(long, default_value = "data/trimmed.fasta")]
        output_alignment: String,
        /// Start position (1-based, inclusive)
        #[arg(long)]
        begin: Option<usize>,
        /// End position (1-based, inclusive)
        #[arg(long)]
        end: Option<usize>,
    },

    /// Sample a subset of FASTA records for faster experiments
    Sample {
        /// Input FASTA file
        #[arg(long)]
        input: String,
        /// Output FASTA file
        #[arg(long)]
        output: String,
        /// Fraction of records to keep (0.0-1.0)
        #[arg(long, default_value = "0.1")]
        fraction: f64,
        /// Also sample internal NODE_* records, not just tips
        #[arg(long)]
        include_nodes: bool,
        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Write per-tip trajectory FASTA files with cumulative distances
    Trajectory {
        /// Branch table TSV (parent, child, hamming, train_test)
        #[arg(long)]
        branches: String,
        /// FASTA alignment with per-node sequences
        #[arg(long)]
        alignment: String,
        /// Output directory for trajectory files
        #[arg(long)]
        output_dir: String,
        /// Compress output files with zstd (.fasta.zst)
        #[arg(long)]
        compress: bool,
        /// Path to a summary statistics JSON file to update
        #[arg(long)]
        summary: Option<String>,
        /// Dataset name used as the key in the summary JSON
        #[arg(long)]
        dataset: Option<String>,
        /// Dataset source URL recorded in the summary JSON
        #[arg(long)]
        url: Option<String>,
    },

    /// Write pairwise FASTA files annotated with Hamming distances
    Pairwise {
        /// Branch table TSV (parent, child, hamming, train_test)
        #[arg(long)]
        branches: String,
        /// FASTA alignment with per-node sequences
        #[arg(long)]
        alignment: String,
        /// Output directory for pairwise files
        #[arg(long)]
        output_dir: String,
        /// Max training pairs (default: all)
        #[arg(long)]
        train_limit: Option<u64>,
        /// Max test pairs (default: all)
        #[arg(long)]
        test_limit: Option<u64>,
        /// Random seed for pair sampling
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Path to a summary statistics JSON file to update
        #[arg(long)]
        summary: Option<String>,
        /// Dataset name used as the key in the summary JSON
        #[arg(long)]
        dataset: Option<String>,
        /// Dataset source URL recorded in the summary JSON
        #[arg(long)]
        url: Option<String>,
    },

    /// Extract categorical color mappings from an Auspice JSON file
    Colors {
        /// Input Auspice JSON file
        #[arg(long)]
        json: String,
        /// Output colors JSON file
        #[arg(long)]
        output: String,
    },

    /// Export per-node categorical metadata as TSV
    Metadata {
        /// Input Auspice JSON file
        #[arg(long)]
        json: String,
        /// Output TSV file
        #[arg(long, default_value = "metadata.tsv")]
        output: String,
        /// Prefix stripped from node names before writing
        #[arg(long)]
        strip_prefix: Option<String>,
    },

    /// Package trajectory FASTA files into sharded tar.zst archives
    Package {
        /// Directory containing .fasta files
        #[arg(long)]
        input_dir: String,
        /// Output directory for tar.zst shards
        #[arg(long)]
        output_dir: String,
        /// Number of trajectories per shard
        #[arg(long, default_value = "10000")]
        shard_size: usize,
        /// Shuffle files before sharding
        #[arg(long)]
        shuffle: bool,
        /// Random seed for shuffling
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

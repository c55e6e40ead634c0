use crate::utils::progress;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::Path;

pub fn run(
    input_dir: String,
    output_dir: String,
    shard_size: usize,
    shuffle: bool,
    seed: u64,
) -> Result<()> {
    let input_dir = Path::new(&input_dir);
    let output_dir = Path::new(&output_dir);
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut files = fasta_files(input_dir)?;
    if files.is_empty() {
        println!("No .fasta files found in {}", input_dir.display());
        return Ok(());
    }
    println!("Found {} FASTA files", files.len());

    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        files.shuffle(&mut rng);
        println!("Shuffled files (seed={})", seed);
    }

    let shards: Vec<&[String]> = files.chunks(shard_size).collect();
    println!(
        "Creating {} shard(s) with up to {} files each",
        shards.len(),
        shard_size
    );

    let mut total_uncompressed: u64 = 0;
    let mut total_compressed: u64 = 0;
    let bar = progress::counted(shards.len() as u64, "Creating shards");
    for (shard_idx, shard_files) in shards.iter().enumerate() {
        bar.inc(1);
        let out_path = output_dir.join(format!("trajectories-{:03}.tar.zst", shard_idx));
        let (uncompressed, compressed) = create_shard(shard_files, input_dir, &out_path)?;
        total_uncompressed += uncompressed;
        total_compressed += compressed;
    }
    bar.finish_and_clear();

    let ratio = if total_compressed > 0 {
        total_uncompressed as f64 / total_compressed as f64
    } else {
        0.0
    };
    println!(
        "Done! Created {} shard(s) in {}",
        shards.len(),
        output_dir.display()
    );
    println!(
        "Total size: {:.1} MB (compression ratio: {:.1}x)",
        total_compressed as f64 / 1024.0 / 1024.0,
        ratio
    );
    Ok(())
}

fn fasta_files(input_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read {}", input_dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".fasta") && entry.file_type()?.is_file() {
            files.push(name);
        }
    }
    files.sort_unstable();
    Ok(files)
}

/// Tars a batch of files in memory, compresses the archive with zstd, and
/// writes it out. Returns (uncompressed, compressed) byte counts.
fn create_shard(files: &[String], input_dir: &Path, out_path: &Path) -> Result<(u64, u64)> {
    let mut tarball = tar::Builder::new(Vec::new());
    for name in files {
        tarball
            .append_path_with_name(input_dir.join(name), name)
            .with_context(|| format!("Failed to archive {}", name))?;
    }
    let tar_data = tarball.into_inner().context("Failed to finalize archive")?;

    let compressed = zstd::stream::encode_all(tar_data.as_slice(), 0)
        .context("Failed to compress archive")?;
    fs::write(out_path, &compressed)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    Ok((tar_data.len() as u64, compressed.len() as u64))
}

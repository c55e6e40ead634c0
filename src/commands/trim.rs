use crate::utils::fasta::{read_records, write_wrapped};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};

pub fn run(
    input_alignment: String,
    output_alignment: String,
    begin: Option<usize>,
    end: Option<usize>,
) -> Result<()> {
    let window = match (begin, end) {
        (Some(begin), Some(end)) => {
            if begin == 0 || end < begin {
                bail!("Trim window must satisfy 1 <= begin <= end");
            }
            Some((begin, end))
        }
        (None, None) => None,
        _ => bail!("--begin and --end must be given together"),
    };

    match window {
        Some((begin, end)) => println!("Trimming alignment from positions {} to {}...", begin, end),
        None => println!("No trimming specified, copying full sequences..."),
    }

    let records = read_records(&input_alignment)?;
    let file = File::create(&output_alignment)
        .with_context(|| format!("Failed to create {}", output_alignment))?;
    let mut writer = BufWriter::new(file);

    for (id, seq) in &records {
        let trimmed = match window {
            Some((begin, end)) => {
                let start = (begin - 1).min(seq.len());
                let stop = end.min(seq.len());
                &seq[start..stop]
            }
            None => seq.as_str(),
        };
        write_wrapped(&mut writer, id, trimmed)?;
    }
    writer.flush()?;

    println!("Output saved to {}", output_alignment);
    Ok(())
}

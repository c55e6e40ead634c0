use anyhow::{Context, Result};
use bio::io::fasta;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column width for sequence payloads in every FASTA this tool writes.
pub const LINE_WIDTH: usize = 60;

/// Opens a FASTA file through niffler so gzip/zstd inputs work transparently.
fn open_reader(path: &Path) -> Result<Box<dyn std::io::Read>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let (reader, _format) = niffler::get_reader(Box::new(file))
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(reader)
}

/// Reads all records in file order as `(id, sequence)` pairs.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let reader = fasta::Reader::new(open_reader(path)?);
    let mut records = Vec::new();
    for result in reader.records() {
        let record =
            result.with_context(|| format!("Malformed FASTA record in {}", path.display()))?;
        let seq = String::from_utf8_lossy(record.seq()).into_owned();
        records.push((record.id().to_string(), seq));
    }
    Ok(records)
}

/// Reads an alignment into an id -> sequence map, optionally uppercasing for
/// case-insensitive distance work.
pub fn load_sequences(path: impl AsRef<Path>, uppercase: bool) -> Result<HashMap<String, String>> {
    let records = read_records(path)?;
    Ok(records
        .into_iter()
        .map(|(id, seq)| {
            let seq = if uppercase { seq.to_ascii_uppercase() } else { seq };
            (id, seq)
        })
        .collect())
}

/// Writes one `>{header}` record with the sequence wrapped at 60 columns.
pub fn write_wrapped(writer: &mut dyn Write, header: &str, seq: &str) -> std::io::Result<()> {
    writeln!(writer, ">{}", header)?;
    let bytes = seq.as_bytes();
    for chunk in bytes.chunks(LINE_WIDTH) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

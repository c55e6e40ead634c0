pub mod fasta;
pub mod hamming;
pub mod progress;
pub mod sanitize;

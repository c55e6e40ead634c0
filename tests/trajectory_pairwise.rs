use phylotraj_tools::commands;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

const BRANCHES_TSV: &str = "parent\tchild\thamming\ttrain_test\n\
R\tP\t1\ttest\n\
P\tB\t2\ttest\n\
P\tC\t1\ttest\n\
R\tA\t1\t\n\
R\tD\t?\t\n";

const ALIGNMENT_FASTA: &str = ">R\nAAAAAAAA\n\
>P\nAAAAAAAT\n\
>B\nAAAAATTT\n\
>C\nAAAAAATT\n\
>A\nAAAAAAAC\n\
>D\nAAAAAAAA\n";

fn write_inputs(dir: &Path) -> (String, String) {
    let branches = dir.join("branches.tsv");
    let alignment = dir.join("alignment.fasta");
    fs::write(&branches, BRANCHES_TSV).expect("write branches");
    fs::write(&alignment, ALIGNMENT_FASTA).expect("write alignment");
    (
        branches.to_string_lossy().into_owned(),
        alignment.to_string_lossy().into_owned(),
    )
}

fn headers_of(text: &str) -> Vec<(String, u64)> {
    text.lines()
        .filter(|line| line.starts_with('>'))
        .map(|line| {
            let (name, dist) = line[1..].split_once('|').expect("header has a distance");
            (name.to_string(), dist.parse().expect("numeric distance"))
        })
        .collect()
}

#[test]
fn trajectories_split_into_train_and_test_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (branches, alignment) = write_inputs(dir.path());
    let out = dir.path().join("traj");

    commands::trajectory::run(
        branches,
        alignment,
        out.to_string_lossy().into_owned(),
        false,
        None,
        None,
        None,
    )
    .expect("trajectory run");

    assert!(out.join("forwards-train").join("A.fasta").exists());
    assert!(out.join("forwards-train").join("D.fasta").exists());
    assert!(out.join("forwards-test").join("B.fasta").exists());
    assert!(out.join("forwards-test").join("C.fasta").exists());
}

#[test]
fn test_trajectories_start_at_the_clade_boundary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (branches, alignment) = write_inputs(dir.path());
    let out = dir.path().join("traj");

    commands::trajectory::run(
        branches,
        alignment,
        out.to_string_lossy().into_owned(),
        false,
        None,
        None,
        None,
    )
    .expect("trajectory run");

    // B is test: its path is truncated at P, the first test node, so the
    // shared train ancestor R never appears.
    let text = fs::read_to_string(out.join("forwards-test").join("B.fasta")).expect("read B");
    let headers = headers_of(&text);
    assert_eq!(headers, [("P".to_string(), 0), ("B".to_string(), 2)]);

    // A is train: its path starts at the true root.
    let text = fs::read_to_string(out.join("forwards-train").join("A.fasta")).expect("read A");
    let headers = headers_of(&text);
    assert_eq!(headers, [("R".to_string(), 0), ("A".to_string(), 1)]);

    // D's branch distance is unknown ('?'), treated as zero; the terminal
    // frame is still written.
    let text = fs::read_to_string(out.join("forwards-train").join("D.fasta")).expect("read D");
    let headers = headers_of(&text);
    assert_eq!(headers, [("R".to_string(), 0), ("D".to_string(), 0)]);
}

#[test]
fn cumulative_distances_never_decrease() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (branches, alignment) = write_inputs(dir.path());
    let out = dir.path().join("traj");

    commands::trajectory::run(
        branches,
        alignment,
        out.to_string_lossy().into_owned(),
        false,
        None,
        None,
        None,
    )
    .expect("trajectory run");

    for sub in ["forwards-train", "forwards-test"] {
        for entry in fs::read_dir(out.join(sub)).expect("read dir") {
            let path = entry.expect("entry").path();
            let text = fs::read_to_string(&path).expect("read trajectory");
            let distances: Vec<u64> = headers_of(&text).into_iter().map(|(_, d)| d).collect();
            assert!(!distances.is_empty(), "{} is empty", path.display());
            assert!(
                distances.windows(2).all(|w| w[0] <= w[1]),
                "distances decrease in {}",
                path.display()
            );
        }
    }
}

#[test]
fn compressed_trajectories_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (branches, alignment) = write_inputs(dir.path());
    let out = dir.path().join("traj");

    commands::trajectory::run(
        branches,
        alignment,
        out.to_string_lossy().into_owned(),
        true,
        None,
        None,
        None,
    )
    .expect("trajectory run");

    let compressed =
        fs::read(out.join("forwards-test").join("B.fasta.zst")).expect("read compressed");
    let decoded = zstd::stream::decode_all(compressed.as_slice()).expect("decompress");
    let text = String::from_utf8(decoded).expect("utf8");
    assert_eq!(headers_of(&text), [("P".to_string(), 0), ("B".to_string(), 2)]);
}

#[test]
fn summary_collects_run_statistics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (branches, alignment) = write_inputs(dir.path());
    let out = dir.path().join("traj");
    let summary = dir.path().join("summary.json");

    commands::trajectory::run(
        branches.clone(),
        alignment.clone(),
        out.to_string_lossy().into_owned(),
        false,
        Some(summary.to_string_lossy().into_owned()),
        Some("toy".to_string()),
        Some("https://example.org/toy".to_string()),
    )
    .expect("trajectory run");

    commands::pairwise::run(
        branches,
        alignment,
        dir.path().join("pairs").to_string_lossy().into_owned(),
        None,
        None,
        42,
        Some(summary.to_string_lossy().into_owned()),
        Some("toy".to_string()),
        None,
    )
    .expect("pairwise run");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("read summary"))
            .expect("parse summary");
    let entry = &value["toy"];
    assert_eq!(entry["num_tips"], 4);
    assert_eq!(entry["train_tips"], 2);
    assert_eq!(entry["test_tips"], 2);
    assert_eq!(entry["url"], "https://example.org/toy");
    // Tip distances: A=1, D=0, B=2 (from P), C=1 (from P).
    assert_eq!(entry["hamming_from_root"]["max"], 2);
    assert_eq!(entry["hamming_from_root"]["mean"], 1.0);
    // Pairwise keys merge into the same entry without clobbering it.
    assert_eq!(entry["pairwise_train_pairs"], 1);
    assert_eq!(entry["pairwise_test_pairs"], 1);
    assert_eq!(entry["pairwise_test_clades"], 1);
}

#[test]
fn pairwise_writes_annotated_pairs_per_split() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (branches, alignment) = write_inputs(dir.path());
    let out = dir.path().join("pairs");

    commands::pairwise::run(
        branches,
        alignment,
        out.to_string_lossy().into_owned(),
        None,
        None,
        42,
        None,
        None,
        None,
    )
    .expect("pairwise run");

    // Train tips A and D form the single train pair.
    let text =
        fs::read_to_string(out.join("pairwise-train").join("A__D.fasta")).expect("read pair");
    let headers = headers_of(&text);
    // AAAAAAAC vs AAAAAAAA differ at one position.
    assert_eq!(headers, [("A".to_string(), 0), ("D".to_string(), 1)]);

    // Test tips B and C share clade root P and form the single test pair.
    let text =
        fs::read_to_string(out.join("pairwise-test").join("B__C.fasta")).expect("read pair");
    let headers = headers_of(&text);
    // AAAAATTT vs AAAAAATT differ at one position.
    assert_eq!(headers, [("B".to_string(), 0), ("C".to_string(), 1)]);
}

#[test]
fn sampled_train_pairs_are_distinct_and_reproducible() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Five train tips under one root, no test labels.
    let branches = dir.path().join("branches.tsv");
    let mut file = fs::File::create(&branches).expect("create branches");
    writeln!(file, "parent\tchild\thamming\ttrain_test").expect("write header");
    for tip in ["t1", "t2", "t3", "t4", "t5"] {
        writeln!(file, "R\t{}\t1\t", tip).expect("write row");
    }
    drop(file);

    let alignment = dir.path().join("alignment.fasta");
    let mut file = fs::File::create(&alignment).expect("create alignment");
    for (i, name) in ["R", "t1", "t2", "t3", "t4", "t5"].iter().enumerate() {
        let mut seq = vec![b'A'; 6];
        seq[i] = b'T';
        writeln!(file, ">{}\n{}", name, String::from_utf8(seq).expect("utf8"))
            .expect("write record");
    }
    drop(file);

    let run_once = |out: &Path| -> HashSet<String> {
        commands::pairwise::run(
            branches.to_string_lossy().into_owned(),
            alignment.to_string_lossy().into_owned(),
            out.to_string_lossy().into_owned(),
            Some(3),
            None,
            7,
            None,
            None,
            None,
        )
        .expect("pairwise run");
        fs::read_dir(out.join("pairwise-train"))
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect()
    };

    let first = run_once(&dir.path().join("pairs-a"));
    let second = run_once(&dir.path().join("pairs-b"));

    assert_eq!(first.len(), 3, "exactly the requested number of pairs");
    assert_eq!(first, second, "same seed, same sample");

    let tips: HashSet<&str> = ["t1", "t2", "t3", "t4", "t5"].into_iter().collect();
    for name in &first {
        let stem = name.strip_suffix(".fasta").expect("fasta file");
        let (a, b) = stem.split_once("__").expect("pair naming");
        assert!(tips.contains(a) && tips.contains(b), "unknown tips in {}", name);
        assert_ne!(a, b, "self-pair in {}", name);
    }
}

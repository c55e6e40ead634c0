use phylotraj_tools::commands;
use phylotraj_tools::utils::fasta::read_records;
use std::fs;

const LABELED_AUSPICE: &str = r##"{
    "meta": {"colorings": [
        {"key": "train_test", "title": "Train/Test Split", "type": "categorical",
         "scale": [["train", "#4C78A8"], ["test", "#E45756"]]},
        {"key": "num_date", "title": "Date", "type": "continuous"}
    ]},
    "tree": {
        "name": "R",
        "node_attrs": {"train_test": {"value": "train"}},
        "children": [
            {"name": "P", "node_attrs": {"train_test": {"value": "test"}}, "children": [
                {"name": "B", "node_attrs": {"train_test": {"value": "test"}, "country": {"value": "DK"}}},
                {"name": "C", "node_attrs": {"train_test": {"value": "test"}}}
            ]},
            {"name": "A", "node_attrs": {"train_test": {"value": "train"}, "country": {"value": "SE"}}}
        ]
    }
}"##;

#[test]
fn branches_exports_distances_labels_and_missing_markers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let json = dir.path().join("auspice.json");
    let alignment = dir.path().join("alignment.fasta");
    let output = dir.path().join("branches.tsv");
    fs::write(&json, LABELED_AUSPICE).expect("write json");
    // No sequence for C; lowercase input checks case-insensitive matching.
    fs::write(
        &alignment,
        ">R\nacgt\n>P\nacga\n>B\nACGA\n>A\nAC-T\n",
    )
    .expect("write alignment");

    commands::branches::run(
        json.to_string_lossy().into_owned(),
        alignment.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
        None,
    )
    .expect("branches run");

    let text = fs::read_to_string(&output).expect("read output");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("parent\tchild\thamming\ttrain_test"));

    let rows: Vec<Vec<&str>> = lines.map(|l| l.split('\t').collect()).collect();
    let row = |child: &str| {
        rows.iter()
            .find(|r| r[1] == child)
            .unwrap_or_else(|| panic!("no row for {}", child))
            .clone()
    };

    // R=ACGT vs P=ACGA: one substitution.
    assert_eq!(row("P"), ["R", "P", "1", "test"]);
    // P=ACGA vs B=ACGA: identical.
    assert_eq!(row("B"), ["P", "B", "0", "test"]);
    // C has no sequence: distance is unknown.
    assert_eq!(row("C"), ["P", "C", "?", "test"]);
    // R=ACGT vs A=AC-T: the gap position is ignored.
    assert_eq!(row("A"), ["R", "A", "0", "train"]);
}

#[test]
fn colors_extracts_only_categorical_scales() {
    let dir = tempfile::tempdir().expect("tempdir");
    let json = dir.path().join("auspice.json");
    let output = dir.path().join("colors.json");
    fs::write(&json, LABELED_AUSPICE).expect("write json");

    commands::colors::run(
        json.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    )
    .expect("colors run");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("read output"))
            .expect("parse output");
    let object = value.as_object().expect("object");
    assert_eq!(object.len(), 1, "continuous colorings are skipped");
    assert_eq!(value["train_test"]["title"], "Train/Test Split");
    assert_eq!(value["train_test"]["colors"]["train"], "#4C78A8");
    assert_eq!(value["train_test"]["colors"]["test"], "#E45756");
}

#[test]
fn metadata_discovers_categorical_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let json = dir.path().join("auspice.json");
    let output = dir.path().join("metadata.tsv");
    fs::write(&json, LABELED_AUSPICE).expect("write json");

    commands::metadata::run(
        json.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
        None,
    )
    .expect("metadata run");

    let text = fs::read_to_string(&output).expect("read output");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("name\tparent\tcountry\ttrain_test"));

    let rows: Vec<Vec<&str>> = lines.map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 5);
    let row = |name: &str| {
        rows.iter()
            .find(|r| r[0] == name)
            .unwrap_or_else(|| panic!("no row for {}", name))
            .clone()
    };
    assert_eq!(row("R"), ["R", "", "", "train"]);
    assert_eq!(row("B"), ["B", "P", "DK", "test"]);
    assert_eq!(row("A"), ["A", "R", "SE", "train"]);
}

#[test]
fn trim_cuts_an_inclusive_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.fasta");
    let output = dir.path().join("out.fasta");
    fs::write(&input, ">s1\nABCDEFGH\n>s2\nABC\n").expect("write input");

    commands::trim::run(
        input.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
        Some(2),
        Some(5),
    )
    .expect("trim run");

    let records = read_records(&output).expect("read output");
    assert_eq!(records[0], ("s1".to_string(), "BCDE".to_string()));
    // Short records clamp to their own length.
    assert_eq!(records[1], ("s2".to_string(), "BC".to_string()));

    // Half a window is rejected up front.
    assert!(commands::trim::run(
        input.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
        Some(2),
        None,
    )
    .is_err());
}

#[test]
fn sample_filters_internal_nodes_and_is_seeded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.fasta");
    fs::write(
        &input,
        ">tip1\nAAAA\n>NODE_0000001\nCCCC\n>tip2\nGGGG\n>tip3\nTTTT\n>NODE_0000002\nAAAA\n",
    )
    .expect("write input");

    let run = |out: &std::path::Path, fraction: f64, include_nodes: bool| {
        commands::sample::run(
            input.to_string_lossy().into_owned(),
            out.to_string_lossy().into_owned(),
            fraction,
            include_nodes,
            42,
        )
        .expect("sample run");
        read_records(out).expect("read output")
    };

    let tips_only = run(&dir.path().join("a.fasta"), 0.67, false);
    assert_eq!(tips_only.len(), 2);
    assert!(tips_only.iter().all(|(id, _)| !id.starts_with("NODE_")));

    let again = run(&dir.path().join("b.fasta"), 0.67, false);
    assert_eq!(tips_only, again, "same seed, same sample");

    let with_nodes = run(&dir.path().join("c.fasta"), 1.0, true);
    assert_eq!(with_nodes.len(), 5);
}

#[test]
fn package_shards_and_compresses_fasta_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input_dir = dir.path().join("traj");
    let output_dir = dir.path().join("shards");
    fs::create_dir_all(&input_dir).expect("mkdir");
    for i in 0..5 {
        fs::write(
            input_dir.join(format!("tip{}.fasta", i)),
            format!(">tip{}|0\nACGTACGT\n", i),
        )
        .expect("write fasta");
    }
    fs::write(input_dir.join("notes.txt"), "ignored").expect("write extra");

    commands::package::run(
        input_dir.to_string_lossy().into_owned(),
        output_dir.to_string_lossy().into_owned(),
        2,
        true,
        42,
    )
    .expect("package run");

    let mut shards: Vec<String> = fs::read_dir(&output_dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    shards.sort_unstable();
    assert_eq!(
        shards,
        [
            "trajectories-000.tar.zst",
            "trajectories-001.tar.zst",
            "trajectories-002.tar.zst"
        ]
    );

    // Each shard is a zstd-compressed tar holding only .fasta members.
    let mut members = Vec::new();
    for shard in &shards {
        let compressed = fs::read(output_dir.join(shard)).expect("read shard");
        let decoded = zstd::stream::decode_all(compressed.as_slice()).expect("decompress");
        let mut archive = tar::Archive::new(decoded.as_slice());
        for entry in archive.entries().expect("entries") {
            let entry = entry.expect("entry");
            members.push(entry.path().expect("path").to_string_lossy().into_owned());
        }
    }
    members.sort_unstable();
    assert_eq!(
        members,
        ["tip0.fasta", "tip1.fasta", "tip2.fasta", "tip3.fasta", "tip4.fasta"]
    );
}

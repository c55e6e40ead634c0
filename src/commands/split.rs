use crate::cli::SplitStrategyArg;
use crate::split::{add_split_coloring, annotate_nodes, SplitStrategy};
use crate::tree::{load_auspice, save_auspice, TreeIndex};
use crate::utils::progress;
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[allow(clippy::too_many_arguments)]
pub fn run(
    json: String,
    output: String,
    strategy: SplitStrategyArg,
    test_proportion: f64,
    mutations_back: u64,
    max_clade_proportion: f64,
    gene: String,
    seed: Option<u64>,
    tolerance: f64,
    trim_begin: Option<usize>,
    trim_end: Option<usize>,
) -> Result<()> {
    if !(0.0..=1.0).contains(&test_proportion) || test_proportion == 0.0 {
        bail!("Test proportion must be between 0.0 and 1.0");
    }
    if !(0.0..=1.0).contains(&max_clade_proportion) || max_clade_proportion == 0.0 {
        bail!("Max clade proportion must be between 0.0 and 1.0");
    }
    if !(0.0..=1.0).contains(&tolerance) || tolerance == 0.0 {
        bail!("Tolerance must be between 0.0 and 1.0");
    }
    let window = match (trim_begin, trim_end) {
        (Some(begin), Some(end)) => {
            if begin == 0 || end < begin {
                bail!("Trim window must satisfy 1 <= begin <= end");
            }
            Some((begin, end))
        }
        (None, None) => None,
        _ => bail!("--trim-begin and --trim-end must be given together"),
    };

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let progress = progress::spinner("Loading Auspice JSON...");
    let mut doc = load_auspice(&json)?;
    progress.set_message("Indexing tree...");
    let index = TreeIndex::build(&doc.tree);
    let total_tips = index.total_tips();
    progress.finish_with_message(format!("Indexed {} nodes, {} tips", index.len(), total_tips));

    let iterative = matches!(strategy, SplitStrategyArg::RandomClades);
    let strategy = match strategy {
        SplitStrategyArg::RandomClades => SplitStrategy::RandomClades {
            mutations_back,
            max_clade_proportion,
            gene,
            window,
        },
        SplitStrategyArg::Monophyletic => SplitStrategy::Monophyletic { tolerance },
    };

    let selection = strategy.select(&index, test_proportion, &mut rng)?;

    annotate_nodes(&mut doc.tree, &selection.test_nodes);
    add_split_coloring(doc.meta.get_or_insert_with(Default::default));
    save_auspice(&output, &doc)?;

    let test_tip_count = selection.test_tips.len();
    let train_tip_count = total_tips - test_tip_count;
    let achieved = if total_tips > 0 {
        test_tip_count as f64 / total_tips as f64
    } else {
        0.0
    };

    println!("Total tips: {}", total_tips);
    println!("Test tips: {} ({:.1}%)", test_tip_count, achieved * 100.0);
    println!(
        "Train tips: {} ({:.1}%)",
        train_tip_count,
        (1.0 - achieved) * 100.0
    );
    println!("Target proportion: {:.1}%", test_proportion * 100.0);
    if iterative && test_tip_count < selection.target_tip_count {
        // Only the iterative strategy can stop short; the monophyletic one
        // either satisfies its tolerance window or errors out.
        eprintln!(
            "Warning: reached {} of {} targeted test tips; every remaining candidate clade exceeded the size cap",
            test_tip_count, selection.target_tip_count
        );
    }
    println!("Output written to: {}", output);

    Ok(())
}

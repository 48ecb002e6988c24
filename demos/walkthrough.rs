use std::collections::HashMap;

use graph_feat::classify::DecisionTreeClassifier;
use graph_feat::{GraphModel, LexGraph, ModelConfig};

fn sentence(triples: &[(&str, &str, &str)]) -> LexGraph {
    let mut graph = LexGraph::new();
    let mut nodes = HashMap::new();
    for &(src, rel, dst) in triples {
        let s = *nodes
            .entry(src)
            .or_insert_with(|| graph.add_node(src.to_string()));
        let d = *nodes
            .entry(dst)
            .or_insert_with(|| graph.add_node(dst.to_string()));
        graph.add_edge(s, d, rel.to_string());
    }
    graph
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Subgraph Feature Walkthrough");
    println!("============================\n");

    let train = [
        ("t1", sentence(&[("cause", "nsubj", "smoking"), ("cause", "obj", "cancer")]), "CAUSE"),
        ("t2", sentence(&[("cause", "nsubj", "virus"), ("cause", "obj", "flu")]), "CAUSE"),
        ("t3", sentence(&[("lead", "nsubj", "stress"), ("lead", "obl", "illness")]), "CAUSE"),
        ("t4", sentence(&[("treat", "nsubj", "aspirin"), ("treat", "obj", "pain")]), "TREAT"),
        ("t5", sentence(&[("treat", "nsubj", "insulin"), ("treat", "obj", "diabetes")]), "TREAT"),
        ("t6", sentence(&[("cure", "nsubj", "rest"), ("cure", "obj", "flu")]), "TREAT"),
    ];

    let config = ModelConfig::default().with_max_edges(2)?;
    let tree = DecisionTreeClassifier::new().with_max_depth(4)?;
    let mut model = GraphModel::with_classifier(config, tree);

    for (id, graph, label) in &train {
        model.featurize(id, graph, label)?;
    }
    println!(
        "Extracted {} features from {} samples\n",
        model.vocabulary().len(),
        model.session().len()
    );

    let matrix = model.train_matrix()?;
    model.fit(&matrix)?;

    let selected = model.select_n_best(5)?.new_size();
    println!("Selected {} features:", selected);
    for name in model.selected_feature_names()? {
        println!("  {}", name);
    }

    let reduced = model.train_matrix()?;
    model.fit(&reduced)?;

    let test_graph = sentence(&[("treat", "nsubj", "antibiotic"), ("treat", "obj", "infection")]);
    let test = model.transform(&[(&test_graph, "TREAT")])?;
    let evaluation = model.evaluate(&test)?;
    let predicted = model.label_name(evaluation.predictions[0])?;
    println!("\nPrediction for unseen sample: {}", predicted);

    for scores in &evaluation.scores {
        println!(
            "  {}: precision={:.2} recall={:.2} f1={:.2} support={}",
            model.label_name(scores.label)?,
            scores.precision,
            scores.recall,
            scores.f_score,
            scores.support
        );
    }
    Ok(())
}

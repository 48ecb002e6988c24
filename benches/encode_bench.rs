use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graph_feat::classify::{Classifier, DecisionTreeClassifier, ImportanceRanker};
use graph_feat::{ExtractionSession, LexGraph, LexSubgraphs, MatrixBuilder};

const WORDS: &[&str] = &[
    "dog", "cat", "eat", "run", "bone", "fish", "park", "house", "sleep", "bark",
];
const RELATIONS: &[&str] = &["nsubj", "obj", "obl", "amod"];

fn chain(seed: usize, len: usize) -> LexGraph {
    let mut graph = LexGraph::new();
    let nodes: Vec<_> = (0..len)
        .map(|i| graph.add_node(WORDS[(seed + i * 3) % WORDS.len()].to_string()))
        .collect();
    for (i, pair) in nodes.windows(2).enumerate() {
        graph.add_edge(
            pair[0],
            pair[1],
            RELATIONS[(seed + i) % RELATIONS.len()].to_string(),
        );
    }
    graph
}

fn extract_all(graphs: &[LexGraph], max_edges: usize) -> ExtractionSession<String> {
    let enumerator = LexSubgraphs::default();
    let mut session = ExtractionSession::new();
    for (i, graph) in graphs.iter().enumerate() {
        let label = if i % 2 == 0 { "even" } else { "odd" };
        session
            .extract(&enumerator, &i.to_string(), graph, label, max_edges)
            .unwrap();
    }
    session
}

fn criterion_benchmark(c: &mut Criterion) {
    let graphs: Vec<LexGraph> = (0..200).map(|i| chain(i, 6)).collect();

    let mut group = c.benchmark_group("encode");
    group.bench_function("extract", |b| {
        b.iter(|| extract_all(black_box(&graphs), 2));
    });

    let session = extract_all(&graphs, 2);
    group.bench_function("build_matrix", |b| {
        b.iter(|| MatrixBuilder::new().build(black_box(&session), None).unwrap());
    });

    let matrix = MatrixBuilder::new().build(&session, None).unwrap();
    let mut tree = DecisionTreeClassifier::new();
    tree.fit(&matrix.x, &matrix.y).unwrap();
    let ranking = tree.rank_importance().unwrap();
    group.bench_function("select_and_rebuild", |b| {
        b.iter(|| {
            let relabeling = session.select_top(black_box(50), &ranking).unwrap();
            MatrixBuilder::new()
                .build(&session, Some(&relabeling))
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use criterion::measurement::WallTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion};

use rand::rngs::StdRng;
use rand::SeedableRng;

use snowdag::avalanche::source::NoSource;
use snowdag::avalanche::{Consensus, Quorum, Transaction};
use snowdag::graph::DAG;
use snowdag::id::{NodeId, TxId};
use snowdag::params::Parameters;

pub fn run_dag_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag_benchmark");
    let sizes = vec![100, 1000, 10000];

    insert_into_dag_benchmark(&mut group, sizes.clone());
    ancestors_in_dag_benchmark(&mut group, sizes);

    group.finish();
}

pub fn run_consensus_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus_benchmark");
    let sizes = vec![10, 100, 500];

    record_quorum_benchmark(&mut group, sizes.clone());
    select_parents_benchmark(&mut group, sizes);

    group.finish();
}

/// A DAG in which every vertex has the two previous ones as parents.
fn build_dag(size: u64) -> (DAG<u64>, u64) {
    let mut dag = DAG::new();
    dag.insert_vx(0, vec![]).unwrap();
    for i in 1..size {
        let parents = if i == 1 { vec![0] } else { vec![i - 1, i - 2] };
        dag.insert_vx(i, parents).unwrap();
    }
    (dag, size - 1)
}

fn insert_into_dag_benchmark(group: &mut BenchmarkGroup<WallTime>, sizes: Vec<u64>) {
    for size in sizes.iter() {
        group.bench_with_input(BenchmarkId::new("insert", size), size, |b, size| {
            b.iter(|| build_dag(black_box(*size)))
        });
    }
}

fn ancestors_in_dag_benchmark(group: &mut BenchmarkGroup<WallTime>, sizes: Vec<u64>) {
    for size in sizes.iter() {
        group.bench_with_input(BenchmarkId::new("ancestors", size), size, |b, size| {
            b.iter_batched(
                || build_dag(*size),
                |(mut dag, tip)| {
                    let _ = dag.ancestors(&tip).unwrap().len();
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
}

/// A consensus view holding a chain of `size` transactions on top of the genesis.
fn build_chain(size: u64) -> (Consensus, Vec<TxId>) {
    let genesis = Transaction::genesis(-1);
    let mut consensus = Consensus::new(NodeId(0), genesis.clone(), Parameters::default()).unwrap();
    let mut ids = vec![];
    let mut parent = genesis.id;
    for i in 0..size {
        let tx = Transaction::new(NodeId(1), i, i as i64, vec![parent]);
        let _ = consensus.receive(&tx, &NoSource).unwrap();
        parent = tx.id;
        ids.push(tx.id);
    }
    (consensus, ids)
}

fn successful_quorum() -> Quorum {
    let mut quorum = Quorum::new();
    for i in 1..6 {
        quorum.insert(NodeId(i), true);
    }
    quorum
}

fn record_quorum_benchmark(group: &mut BenchmarkGroup<WallTime>, sizes: Vec<u64>) {
    let quorum = successful_quorum();
    for size in sizes.iter() {
        group.bench_with_input(BenchmarkId::new("record_quorum", size), size, |b, size| {
            b.iter_batched(
                || build_chain(*size),
                |(mut consensus, ids)| {
                    for id in ids.iter() {
                        let _ = consensus.record_quorum(id, &quorum, 5).unwrap();
                    }
                    let _ = consensus.compute_accepted().unwrap();
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
}

fn select_parents_benchmark(group: &mut BenchmarkGroup<WallTime>, sizes: Vec<u64>) {
    let quorum = successful_quorum();
    for size in sizes.iter() {
        let (mut consensus, ids) = build_chain(*size);
        // Query the lower half of the chain
        for id in ids.iter().take(ids.len() / 2) {
            let _ = consensus.record_quorum(id, &quorum, 5).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        group.bench_function(BenchmarkId::new("select_parents", size), |b| {
            b.iter(|| consensus.select_parents(&mut rng).unwrap())
        });
    }
}

criterion_group!(benches, run_dag_benchmark, run_consensus_benchmark);
criterion_main!(benches);

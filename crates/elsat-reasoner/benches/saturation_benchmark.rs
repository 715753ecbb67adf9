use criterion::{black_box, criterion_group, criterion_main, Criterion};
use elsat_core::{Axiom, Concept, OntologyStore, Role};
use elsat_reasoner::{classify, OrderPolicy, ReasonerConfig, SaturationEngine, TBoxIndex};

fn class(i: usize) -> Concept {
    Concept::named(&format!("http://example.org/Class{}", i))
}

fn create_test_ontology(size: usize) -> OntologyStore {
    let r = Role::new("http://example.org/hasPart");
    let mut axioms = Vec::new();

    // Class_i ⊑ Class_{i-1}, every third class also has a part and a defined parent
    for i in 1..size {
        axioms.push(Axiom::inclusion(class(i), class(i - 1)));

        if i % 3 == 0 {
            let part = Concept::named(&format!("http://example.org/Part{}", i));
            axioms.push(Axiom::inclusion(class(i), Concept::existential(r.clone(), part.clone())));
            axioms.push(Axiom::inclusion(
                Concept::conjunction(class(i - 1), Concept::existential(r.clone(), part)),
                Concept::named(&format!("http://example.org/Assembly{}", i)),
            ));
        }
    }

    OntologyStore::from_axioms(axioms)
}

fn benchmark_rule_orders(c: &mut Criterion) {
    let store = create_test_ontology(300);
    let index = TBoxIndex::from_store(&store);
    let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());
    let query = class(299);

    let orders = [
        ("forward", "0,1,2,3,4"),
        ("reverse", "4,3,2,1,0"),
        ("inclusion_first", "4,0,1,2,3"),
        ("random", "random:42"),
    ];

    for (label, order) in orders {
        let policy: OrderPolicy = order.parse().unwrap();
        c.bench_function(&format!("saturate_300_classes_{}", label), |b| {
            b.iter(|| engine.find_subsumers(black_box(&query), &policy).unwrap());
        });
    }
}

fn benchmark_deep_hierarchy(c: &mut Criterion) {
    let axioms = (1..101).map(|i| Axiom::inclusion(class(i), class(i - 1)));
    let store = OntologyStore::from_axioms(axioms);
    let index = TBoxIndex::from_store(&store);
    let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());

    c.bench_function("saturate_hierarchy_100_levels", |b| {
        b.iter(|| {
            engine
                .find_subsumers(black_box(&class(100)), &OrderPolicy::default())
                .unwrap()
        });
    });
}

fn benchmark_classification(c: &mut Criterion) {
    let store = create_test_ontology(100);
    let index = TBoxIndex::from_store(&store);
    let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());

    c.bench_function("classify_100_classes", |b| {
        b.iter(|| classify(black_box(&engine), &OrderPolicy::default(), None).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_rule_orders,
    benchmark_deep_hierarchy,
    benchmark_classification
);
criterion_main!(benches);

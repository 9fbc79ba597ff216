use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use arbor::construct::{Database, Unfired};
use arbor::query::Query;
use arbor::sentence::Sentence;
use arbor::unify::unify;

// every speaker knows every other speaker
fn populate(speakers: usize) -> Database {
    let mut db = Database::new();
    for s in 0..speakers {
        for o in 0..speakers {
            let reputation = (s as i64 * 7 + o as i64 * 13) % 100 - 50;
            db.insert(&format!("s{s}.relationships.s{o}.reputation!{reputation}"))
                .unwrap();
        }
    }
    db
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("insert 10k", |b| b.iter(|| black_box(populate(100))));

    let sentence = Sentence::parse("?speaker.relationships.?other.reputation!?r").unwrap();
    for speakers in [10, 100] {
        let mut db = populate(speakers);
        c.bench_function(&format!("unify {}", speakers * speakers), |b| {
            b.iter(|| unify(&mut db, black_box(&sentence), &mut Unfired::default()))
        });
    }

    let mut db = populate(30);
    let query = Query::from_clauses([
        "?speaker.relationships.?other.reputation!?r0",
        "gt ?r0 40",
        "?other.relationships.?speaker.reputation!?r1",
        "lt ?r1 -40",
    ]);
    c.bench_function("join 900", |b| b.iter(|| query.run(black_box(&mut db))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

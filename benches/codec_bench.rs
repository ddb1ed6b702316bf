use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mathdoku_save::revision::CURRENT_REVISION;
use mathdoku_save::{MoveRecord, PuzzleFile};

fn nine_by_nine() -> String {
    let mut lines = vec!["SAVED_WITH_REVISION:600".to_string(), "GRID:true:false".to_string()];
    for id in 0..81 {
        lines.push(format!("CELL:{}::{}:0:1,2,3,4,:false:false:false", id, id % 9 + 1));
    }
    for cage in 0..27 {
        let base = cage * 3;
        lines.push(format!("CAGE:{}:1:12:{},{},{},:false", cage, base, base + 1, base + 2));
    }
    for id in 0..200 {
        lines.push(format!("CELL_CHANGE:[{}:0:1,2,:[{}:3::],]", id % 81, (id + 1) % 81));
    }
    lines.join("\n") + "\n"
}

fn deep_move(depth: usize) -> MoveRecord {
    let mut m = MoveRecord::new(0, Some(1));
    for d in 0..depth {
        let mut parent = MoveRecord::new(d % 81, None);
        parent.related.push(m);
        m = parent;
    }
    m
}

fn bench_file(c: &mut Criterion) {
    let text = nine_by_nine();
    let puzzle = PuzzleFile::parse(&text, 9).unwrap();

    c.bench_function("parse_9x9_200_moves", |b| b.iter(|| PuzzleFile::parse(black_box(&text), 9).unwrap()));
    c.bench_function("write_9x9_200_moves", |b| b.iter(|| black_box(&puzzle).to_text()));
}

fn bench_moves(c: &mut Criterion) {
    let line = deep_move(60).encode();

    c.bench_function("decode_move_depth_60", |b| {
        b.iter(|| MoveRecord::decode(black_box(&line), CURRENT_REVISION).unwrap())
    });
}

criterion_group!(benches, bench_file, bench_moves);
criterion_main!(benches);

use align_core::{
    AlignAssignments, AlignConfig, AlignmentEngine, EditorSession, Position, TextBuffer,
};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

/// `line_count` lines in blocks of `block_len` assignments separated by a blank line.
fn large_text(line_count: usize, block_len: usize) -> String {
    let mut out = String::with_capacity(line_count * 32);
    for i in 0..line_count {
        if i % (block_len + 1) == block_len {
            out.push('\n');
            continue;
        }
        let name = "x".repeat(1 + i % 17);
        out.push_str(&format!("\t{name} = {i}; // align-core benchmark line\n"));
    }
    out.pop();
    out
}

fn bench_detect_block(c: &mut Criterion) {
    let text = large_text(50_000, 2_000);
    let snapshot = TextBuffer::new(&text).snapshot();
    let engine = AlignmentEngine::default();

    c.bench_function("find_block/2k_lines", |b| {
        b.iter(|| {
            let block = engine.find_alignable_block(black_box(&snapshot), 25_000, None);
            black_box(block.map(|block| block.len()));
        })
    });
}

fn bench_align_command(c: &mut Criterion) {
    let text = large_text(50_000, 200);
    let command = AlignAssignments::default();

    c.bench_function("align_command/200_line_block", |b| {
        b.iter_batched(
            || {
                let mut session = EditorSession::new(&text, AlignConfig::default());
                session.set_caret(Position::new(25_000, 0));
                session
            },
            |mut session| {
                black_box(command.execute(&mut session));
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_detect_block, bench_align_command);
criterion_main!(benches);

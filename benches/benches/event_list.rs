use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use clap_event_list::{forward, EventSource, FixedSizeEventList, Record};

const SLOTS: usize = 1024;
const MAX_EVENT_SIZE: usize = 64;

fn encoded_events(count: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..count)
        .map(|_| {
            let size = rng.gen_range(16..=MAX_EVENT_SIZE);
            let mut buf: Vec<u8> = (0..size).map(|_| rng.gen()).collect();
            Record::init(&mut buf).expect("record");
            buf
        })
        .collect()
}

fn fill_read_clear(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_list");
    let events = encoded_events(SLOTS);
    let records: Vec<&Record> = events
        .iter()
        .map(|bytes| Record::from_bytes(bytes).expect("record"))
        .collect();

    group.bench_function("push_1024_mixed", |b| {
        let mut list = FixedSizeEventList::<SLOTS, MAX_EVENT_SIZE>::new();
        b.iter(|| {
            for record in &records {
                let _ = list.try_push(black_box(record));
            }
            list.clear();
        });
    });

    group.bench_function("allocate_in_place_1024", |b| {
        let mut list = FixedSizeEventList::<SLOTS, MAX_EVENT_SIZE>::new();
        b.iter(|| {
            for i in 0..SLOTS {
                if let Ok(slot) = list.try_allocate(black_box(24)) {
                    slot.payload_mut()[0] = i as u8;
                }
            }
            list.clear();
        });
    });

    group.bench_function("read_1024_via_source", |b| {
        let mut list = FixedSizeEventList::<SLOTS, MAX_EVENT_SIZE>::new();
        for record in &records {
            let _ = list.try_push(record);
        }
        b.iter(|| {
            let source = list.input_events();
            let mut total = 0usize;
            for i in 0..source.count() {
                if let Some(record) = source.at(i) {
                    total += record.len();
                }
            }
            black_box(total)
        });
    });

    group.bench_function("forward_1024", |b| {
        let mut input = FixedSizeEventList::<SLOTS, MAX_EVENT_SIZE>::new();
        for record in &records {
            let _ = input.try_push(record);
        }
        let mut output = FixedSizeEventList::<SLOTS, MAX_EVENT_SIZE>::new();
        b.iter(|| {
            let forwarded = forward(&input.input_events(), &mut output.output_events());
            output.clear();
            black_box(forwarded)
        });
    });

    group.finish();
}

criterion_group!(benches, fill_read_clear);
criterion_main!(benches);

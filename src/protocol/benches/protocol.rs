//! Frame codec benchmarks.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use protocol::command::CommandRequest;
use protocol::frame::{checksum, Command, Frame};

fn bench_serialize(c: &mut Criterion) {
    let command = Command::with_data(
        CommandRequest::WriteIsoTag,
        vec![0x00; 64],
    );
    c.bench_function("serialize 64-byte payload", |b| {
        b.iter(|| black_box(&command).serialize());
    });
}

fn bench_decode(c: &mut Criterion) {
    let bytes = Command::with_data(CommandRequest::InventoryIsoContinue, vec![0x00; 32]).serialize();
    c.bench_function("decode 32-byte payload", |b| {
        b.iter(|| Frame::decode(black_box(&bytes)).unwrap());
    });
}

fn bench_checksum(c: &mut Criterion) {
    let data = vec![0xA5u8; 256];
    c.bench_function("checksum 256 bytes", |b| {
        b.iter(|| checksum(black_box(&data)));
    });
}

criterion_group!(benches, bench_serialize, bench_decode, bench_checksum);
criterion_main!(benches);

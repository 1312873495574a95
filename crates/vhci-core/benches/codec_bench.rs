//! Criterion benchmarks for the vhci-core packet codec.
//!
//! Measures encode and decode latency for the packet shapes the relay sees
//! most, plus hex rendering used for every comm-log line.
//!
//! Run with:
//! ```bash
//! cargo bench --package vhci-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vhci_core::protocol::messages::MAX_BYTES_LEN;
use vhci_core::{decode_packet, encode_packet, to_hex, CommandPacket, MessageId};

// ── Packet fixtures ───────────────────────────────────────────────────────────

fn make_ping() -> CommandPacket {
    CommandPacket::message(MessageId::Ping)
}

fn make_hci_command() -> CommandPacket {
    // HCI_Reset
    CommandPacket::hci_data(vec![0x01, 0x03, 0x0c, 0x00])
}

fn make_acl_frame() -> CommandPacket {
    let mut frame = vec![0x02, 0x40, 0x20, 0x1b, 0x00];
    frame.extend(std::iter::repeat(0x5a).take(27));
    CommandPacket::hci_data(frame)
}

fn make_max_frame() -> CommandPacket {
    CommandPacket::hci_data(vec![0x02; MAX_BYTES_LEN])
}

fn make_data_error() -> CommandPacket {
    CommandPacket::hci_data_error(0)
}

fn fixtures() -> Vec<(&'static str, CommandPacket)> {
    vec![
        ("Ping", make_ping()),
        ("HciCommand", make_hci_command()),
        ("AclFrame", make_acl_frame()),
        ("MaxFrame", make_max_frame()),
        ("HciDataError", make_data_error()),
    ]
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_packet");
    for (name, packet) in fixtures() {
        group.bench_with_input(BenchmarkId::new("packet", name), &packet, |b, packet| {
            b.iter(|| encode_packet(black_box(packet)).expect("encode must succeed"))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_packet");
    for (name, packet) in fixtures() {
        let bytes = encode_packet(&packet).expect("encode must succeed for benchmark setup");
        group.bench_with_input(BenchmarkId::new("packet", name), &bytes, |b, bytes| {
            b.iter(|| decode_packet(black_box(bytes)).expect("decode must succeed"))
        });
    }
    group.finish();
}

/// Hex rendering runs once per relayed frame while comm logging is on.
fn bench_hex(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_hex");
    for len in [4usize, 64, MAX_BYTES_LEN] {
        let bytes = vec![0xA5; len];
        group.bench_with_input(BenchmarkId::new("bytes", len), &bytes, |b, bytes| {
            b.iter(|| to_hex(black_box(bytes)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_hex);
criterion_main!(benches);

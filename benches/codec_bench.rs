//! Criterion micro-benchmarks for the encode/decode hot paths.
//!
//! Run with: `cargo bench --bench codec_bench`

use bytes::Bytes;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kafkawire::prelude::*;

const LOREM: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. Donec a diam \
lectus. Sed sit amet ipsum mauris. Maecenas congue ligula ac quam viverra nec consectetur ante \
hendrerit. Donec et mollis dolor. Praesent et diam eget libero egestas mattis sit amet vitae \
augue. Nam tincidunt congue enim, ut porta lorem lacinia consectetur.";

fn produce_request(message_count: usize) -> ProduceReq {
    let messages = (0..message_count)
        .map(|i| Message {
            offset: i as i64,
            key: None,
            value: Some(Bytes::from_static(LOREM)),
            ..Message::default()
        })
        .collect();

    ProduceReq {
        correlation_id: 241,
        client_id: "test".to_string(),
        required_acks: REQUIRED_ACKS_ALL,
        timeout_ms: 1000,
        topics: vec![ProduceReqTopic {
            name: "foo".to_string(),
            partitions: vec![ProduceReqPartition { id: 0, messages }],
        }],
    }
}

fn fetch_response(message_count: usize) -> FetchResp {
    let messages = (0..message_count)
        .map(|i| Message {
            offset: i as i64,
            key: None,
            value: Some(Bytes::from_static(LOREM)),
            topic: "foo".to_string(),
            partition: 0,
            ..Message::default()
        })
        .collect();

    FetchResp {
        correlation_id: 241,
        topics: vec![FetchRespTopic {
            name: "foo".to_string(),
            partitions: vec![
                FetchRespPartition {
                    id: 0,
                    err: None,
                    tip_offset: 444,
                    messages,
                },
                FetchRespPartition {
                    id: 123,
                    err: Some(KafkaCode::BrokerNotAvailable),
                    tip_offset: -1,
                    messages: vec![],
                },
            ],
        }],
    }
}

fn bench_produce_request_marshal(c: &mut Criterion) {
    let req = produce_request(1000);
    let size = req.to_bytes().unwrap().len();

    let mut group = c.benchmark_group("produce_request_marshal");
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("1000_messages", |b| {
        b.iter(|| black_box(&req).to_bytes().unwrap());
    });
    group.finish();
}

fn bench_produce_response_unmarshal(c: &mut Criterion) {
    let resp = ProduceResp {
        correlation_id: 241,
        topics: vec![ProduceRespTopic {
            name: "foo".to_string(),
            partitions: vec![ProduceRespPartition {
                id: 0,
                err: None,
                offset: 1,
            }],
        }],
    };
    let raw = resp.to_bytes().unwrap();

    c.bench_function("produce_response_unmarshal", |b| {
        b.iter(|| read_produce_resp(&mut black_box(&raw[..])).unwrap());
    });
}

fn bench_fetch_request_marshal(c: &mut Criterion) {
    let req = FetchReq {
        correlation_id: 241,
        client_id: "test".to_string(),
        max_wait_ms: 2000,
        min_bytes: 12454,
        topics: vec![FetchReqTopic {
            name: "foo".to_string(),
            partitions: vec![
                FetchReqPartition {
                    id: 421,
                    fetch_offset: 529,
                    max_bytes: 4921,
                },
                FetchReqPartition {
                    id: 0,
                    fetch_offset: 11,
                    max_bytes: 92,
                },
            ],
        }],
        ..FetchReq::default()
    };

    c.bench_function("fetch_request_marshal", |b| {
        b.iter(|| black_box(&req).to_bytes().unwrap());
    });
}

fn bench_fetch_response_unmarshal(c: &mut Criterion) {
    let raw = fetch_response(100).to_bytes().unwrap();

    let mut group = c.benchmark_group("fetch_response_unmarshal");
    group.throughput(Throughput::Bytes(raw.len() as u64));
    group.bench_function("100_messages", |b| {
        b.iter(|| read_fetch_resp(&mut black_box(&raw[..])).unwrap());
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_produce_request_marshal,
    bench_produce_response_unmarshal,
    bench_fetch_request_marshal,
    bench_fetch_response_unmarshal,
);
criterion_main!(benches);

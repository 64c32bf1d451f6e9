use autoping::{build_echo_request, AddressRange, FairScheduler};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::net::Ipv4Addr;

fn benchmark_range_traversal(c: &mut Criterion) {
    c.bench_function("range_traversal_/16", |b| {
        b.iter(|| {
            let range =
                AddressRange::new(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 255, 255))
                    .unwrap();
            black_box(range.fold(0u32, |acc, addr| acc ^ u32::from(addr)))
        })
    });
}

fn benchmark_scheduler_mixed_sizes(c: &mut Criterion) {
    c.bench_function("scheduler_mixed_sizes", |b| {
        b.iter(|| {
            let scheduler: FairScheduler = [
                AddressRange::parse("10.0.0.0", "10.0.0.255").unwrap(),
                AddressRange::parse("10.1.0.0", "10.1.15.255").unwrap(),
                AddressRange::parse("192.0.2.0", "192.0.2.9").unwrap(),
                AddressRange::parse("198.51.100.0", "198.51.103.255").unwrap(),
            ]
            .into_iter()
            .collect();
            black_box(scheduler.count())
        })
    });
}

fn benchmark_echo_request(c: &mut Criterion) {
    c.bench_function("build_echo_request", |b| {
        let mut id = 0u16;
        b.iter(|| {
            id = id.wrapping_add(1);
            black_box(build_echo_request(black_box(id)))
        })
    });
}

criterion_group!(
    benches,
    benchmark_range_traversal,
    benchmark_scheduler_mixed_sizes,
    benchmark_echo_request
);
criterion_main!(benches);

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ptp_timestamping::TimestampClass;
use ptp_timestamping::net::parse_ancillary;
use ptp_timestamping::protocol::ptp::PtpHeaderView;
use ptp_timestamping::tc::{ETH_HLEN, MetaDataFrame, reconstruct_rx_timestamp};
use ptp_timestamping::testing::{ControlBuilder, meta_frame, ptp_frame, ts};

fn ancillary_benchmark(c: &mut Criterion) {
    // Hardware receive: SO_TIMESTAMPING plus the SO_TIMESTAMPNS fallback
    let control = ControlBuilder::new()
        .timestamping([ts(1, 0), ts(0, 0), ts(1_700_000_000, 123_456_789)])
        .timestamp_ns(ts(1_700_000_000, 123_000_000))
        .build();

    c.bench_function("parse_ancillary_hw_and_sw", |b| {
        b.iter(|| {
            parse_ancillary(black_box(&control))
                .unwrap()
                .select(TimestampClass::Hardware)
        })
    });

    let empty: Vec<u8> = Vec::new();
    c.bench_function("parse_ancillary_empty", |b| {
        b.iter(|| parse_ancillary(black_box(&empty)).unwrap())
    });
}

fn transparent_clock_benchmark(c: &mut Criterion) {
    let meta = meta_frame(3, 0x00AB_CDEF);
    c.bench_function("meta_frame_decode_and_reconstruct", |b| {
        b.iter(|| {
            let frame = MetaDataFrame::from_frame(black_box(&meta)).unwrap();
            reconstruct_rx_timestamp(ts(1_700_000_000, 0), frame.rx_ts_low(), 8)
        })
    });

    let mut frame = ptp_frame(0x8, 42);
    c.bench_function("follow_up_correction_patch", |b| {
        b.iter(|| {
            let mut header = PtpHeaderView::new(&mut frame[ETH_HLEN..]).unwrap();
            header.set_correction_field(black_box(5_000_000_250));
        })
    });
}

criterion_group!(benches, ancillary_benchmark, transparent_clock_benchmark);
criterion_main!(benches);

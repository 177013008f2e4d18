//! Demonstrates each of the five streaming primitives over a tiny
//! synthetic stream.

use streaming_algorithms::{CountMinSketch, P2Quantile, RunningStats, TimeSeries};

fn main() {
    let samples = [0.02, 0.15, 0.74, 3.39, 0.83, 22.37, 10.15, 15.43, 38.62, 15.92];

    let mut stats = RunningStats::new();
    let mut median = P2Quantile::new(0.5).expect("p in (0,1)");
    let mut sketch = CountMinSketch::new(0.01, 0.01).expect("valid epsilon/delta");
    let mut series = TimeSeries::new(1_000_000_000, 60).expect("valid series params");

    for (i, x) in samples.iter().enumerate() {
        stats.add(*x);
        median.add(*x);
        sketch.update(format!("bucket-{}", i % 3).as_bytes(), 1);
        series.add(i as u64 * 1_000_000_000, *x as i32);
    }

    println!("mean = {:.4}, sd = {:.4}", stats.mean(), stats.sd());
    println!("median estimate = {:?}", median.estimate(2));
    println!("bucket-0 count  = {}", sketch.point_query(b"bucket-0"));
    println!("latest value    = {:?}", series.get(9_000_000_000));
}

use afl::*;

use streaming_algorithms::{CountMinSketch, P2Quantile, RunningStats, TimeSeries};

fn main() {
    fuzz!(|data: &[u8]| {
        // Every deserialize() must either succeed or return an Err; it must
        // never panic on arbitrary bytes.
        let mut rs = RunningStats::new();
        let _ = rs.deserialize(data);

        let mut q = P2Quantile::new(0.5).unwrap();
        let _ = q.deserialize(data);

        let mut ts = TimeSeries::new(1, 16).unwrap();
        let _ = ts.deserialize(data);

        // Feed the raw bytes as a stream of CMS updates and time-series
        // writes; nothing here should panic regardless of content.
        let mut cms = CountMinSketch::new(0.1, 0.1).unwrap();
        let mut ts2 = TimeSeries::new(1, 16).unwrap();
        for chunk in data.chunks(5) {
            if chunk.len() < 5 {
                break;
            }
            let n = i64::from(chunk[0] as i8);
            cms.update(&chunk[1..], n);

            let ns = u32::from_le_bytes([chunk[1], chunk[2], chunk[3], chunk[4]]) as u64;
            ts2.add(ns, chunk[0] as i32);
        }
    })
}

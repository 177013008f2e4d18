use streaming_algorithms::{
    CountMinSketch, Error, MergeOp, P2Histogram, P2Quantile, RunningStats, TimeSeries,
};

const DATA: [f64; 20] = [
    0.02, 0.15, 0.74, 3.39, 0.83, 22.37, 10.15, 15.43, 38.62, 15.92, 34.60, 10.28, 1.47, 0.40,
    0.05, 11.39, 0.27, 0.42, 0.09, 11.37,
];

#[test]
fn running_stats_ignores_non_finite_samples() {
    let mut rs = RunningStats::new();
    for x in [1.0, 2.0, 3.0] {
        rs.add(x);
    }
    assert_eq!(rs.count(), 3.0);
    assert_eq!(rs.mean(), 2.0);
    assert_eq!(rs.variance(), 1.0);
    assert_eq!(rs.sd(), 1.0);
    assert!((rs.uncorrected_sd() - 0.816497).abs() < 1e-5);

    let snapshot = rs;
    rs.add(f64::INFINITY);
    rs.add(f64::NAN);
    rs.add(f64::NEG_INFINITY);
    assert_eq!(rs, snapshot);
}

#[test]
fn p2_quantile_and_histogram_agree_on_the_same_stream() {
    let mut q = P2Quantile::new(0.5).unwrap();
    let mut h = P2Histogram::new(4).unwrap();
    for x in DATA {
        q.add(x);
        h.add(x);
    }
    for i in 0..5 {
        assert!((q.estimate(i).unwrap() - h.estimate(i).unwrap()).abs() < 1e-9);
        assert_eq!(q.count(i).unwrap(), h.count(i).unwrap());
    }
}

#[test]
fn cms_add_remove_round_trip() {
    let mut cms = CountMinSketch::new(0.1, 0.1).unwrap();
    cms.update(b"c", 6);
    cms.update(b"a", 1);
    cms.update(b"b", 2);
    cms.update(b"c", -3);
    cms.update(&5i32.to_le_bytes(), 1);

    assert_eq!(cms.item_count(), 7);
    assert_eq!(cms.unique_count(), 4);
    assert_eq!(cms.point_query(b"a"), 1);
    assert_eq!(cms.point_query(b"b"), 2);
    assert_eq!(cms.point_query(b"c"), 3);

    cms.update(b"c", -4);
    assert_eq!(cms.point_query(b"c"), 0);
    assert_eq!(cms.item_count(), 4);
    assert_eq!(cms.unique_count(), 3);
}

#[test]
fn time_series_add_set_get_sequence() {
    let mut ts = TimeSeries::new(1, 2).unwrap();
    assert_eq!(ts.timestamp(), 1);

    ts.add(0, 10);
    ts.add(0, -3);
    ts.set(0, 99);
    ts.add(1, -1);
    assert_eq!(ts.get(0), Some(99));
    assert_eq!(ts.get(1), Some(-1));

    ts.add(2, 11);
    assert_eq!(ts.get(2), Some(11));
    assert_eq!(ts.get(1), Some(-1));

    ts.add(4, 22);
    assert_eq!(ts.get(4), Some(22));
    assert_eq!(ts.get(3), Some(0));

    ts.add(10, 66);
    assert_eq!(ts.get(10), Some(66));
    assert_eq!(ts.get(9), Some(0));
    assert_eq!(ts.get(1), None);

    assert_eq!(ts.add(0, 1), None);
}

#[test]
fn time_series_deserialize_reports_distinct_mismatches() {
    let ts = TimeSeries::new(1, 2).unwrap();
    let buf = ts.serialize();

    let mut wrong_resolution = TimeSeries::new(2, 2).unwrap();
    let err = wrong_resolution.deserialize(&buf).unwrap_err();
    assert_eq!(err, Error::MismatchedNsPerRow);
    assert_eq!(wrong_resolution, TimeSeries::new(2, 2).unwrap());

    let mut wrong_rows = TimeSeries::new(1, 3).unwrap();
    let err = wrong_rows.deserialize(&buf).unwrap_err();
    assert_eq!(err, Error::MismatchedRows);
    assert_eq!(wrong_rows, TimeSeries::new(1, 3).unwrap());
}

#[test]
fn time_series_merge_between_different_resolutions() {
    let mut coarse = TimeSeries::new(2, 4).unwrap();
    for i in 0..4u64 {
        coarse.set(i * 2, (i + 1) as i32).unwrap();
    }

    let mut fine = TimeSeries::new(1, 8).unwrap();
    fine.merge(&mut coarse, MergeOp::Set).unwrap();
    for i in 0..4u64 {
        assert_eq!(fine.get(i * 2), Some((i + 1) as i32));
    }
}

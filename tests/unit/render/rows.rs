use super::*;

#[test]
fn workers_never_exceed_rows() {
    assert_eq!(worker_count(3, 8, false), 3);
    assert_eq!(worker_count(100, 8, false), 8);
    assert_eq!(worker_count(0, 8, false), 1);
    assert_eq!(worker_count(100, 8, true), 1);
}

#[test]
fn ranges_cover_every_row_once() {
    let ranges = row_ranges(10, 3);
    assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    let ranges = row_ranges(2, 5);
    assert_eq!(ranges, vec![0..1, 1..2]);
    assert_eq!(row_ranges(7, 1), vec![0..7]);
}

#[test]
fn range_sizes_differ_by_at_most_one() {
    for rows in 1..40u32 {
        for workers in 1..9 {
            let ranges = row_ranges(rows, workers);
            let lens: Vec<u32> = ranges.iter().map(|r| r.len() as u32).collect();
            assert_eq!(lens.iter().sum::<u32>(), rows);
            let (min, max) = (lens.iter().min().unwrap(), lens.iter().max().unwrap());
            assert!(max - min <= 1);
            assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
        }
    }
}

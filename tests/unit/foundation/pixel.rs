use super::*;

#[test]
fn gray_reads_channel_zero_everywhere() {
    let p = Pixel::gray(0.25);
    assert!(!p.is_color());
    assert_eq!(p.len(), 1);
    assert_eq!(p.get(0), 0.25);
    assert_eq!(p.get(2), 0.25);
    assert_eq!(p.samples(), &[0.25]);
}

#[test]
fn to_color_replicates() {
    let p = Pixel::gray(0.5).to_color();
    assert!(p.is_color());
    assert_eq!(p.samples(), &[0.5, 0.5, 0.5]);
    let q = Pixel::rgb(0.1, 0.2, 0.3);
    assert_eq!(q.to_color(), q);
}

#[test]
fn logical_tests_follow_channel() {
    let p = Pixel::rgb(0.0, 1.0, 0.0);
    assert!(p.is_logical_zero(0));
    assert!(p.is_logical_one(1));
    assert!(Pixel::gray(2.0).is_logical_one(2));
}

#[test]
fn set_ignores_missing_channels() {
    let mut p = Pixel::gray(1.0);
    p.set(2, 7.0);
    assert_eq!(p, Pixel::gray(1.0));
    let mut q = Pixel::rgb(0.0, 0.0, 0.0);
    q.set(2, 7.0);
    assert_eq!(q.get(2), 7.0);
}

#[test]
fn display_matches_literal_syntax() {
    assert_eq!(Pixel::gray(0.5).to_string(), "{0.5}");
    assert_eq!(Pixel::rgb(1.0, 0.5, 0.25).to_string(), "{1, 0.5, 0.25}");
}

#[test]
fn serde_accepts_one_or_three_samples() {
    let p: Pixel = serde_json::from_str("[0.2, 0.4, 0.6]").unwrap();
    assert_eq!(p, Pixel::rgb(0.2, 0.4, 0.6));
    let g: Pixel = serde_json::from_str("[3]").unwrap();
    assert_eq!(g, Pixel::gray(3.0));
    assert!(serde_json::from_str::<Pixel>("[1, 2]").is_err());
    assert_eq!(serde_json::to_string(&g).unwrap(), "[3.0]");
}

use super::*;

fn ramp() -> Raster {
    Raster::from_samples(
        4,
        1,
        false,
        false,
        vec![0.0, 1.0, 2.0, 3.0],
    )
    .unwrap()
}

#[test]
fn layout_is_pixel_interleaved() {
    let mut r = Raster::new(2, 2, true, true).unwrap();
    assert_eq!(r.channels(), 4);
    assert_eq!(r.nominal_channels(), 3);
    assert!(r.has_alpha());
    r.set_sample(1, 1, 2, 0.5);
    assert_eq!(r.data()[(2 + 1) * 4 + 2], 0.5);
    assert_eq!(r.pixel(1, 1), Pixel::rgb(0.0, 0.0, 0.5));
}

#[test]
fn from_samples_checks_length() {
    assert!(Raster::from_samples(2, 2, false, false, vec![0.0; 3]).is_err());
}

#[test]
fn basic_statistics() {
    let r = ramp();
    assert_eq!(r.statistic(StatKind::Minimum, 0), 0.0);
    assert_eq!(r.statistic(StatKind::Maximum, 0), 3.0);
    assert_eq!(r.statistic(StatKind::Mean, 0), 1.5);
    assert_eq!(r.statistic(StatKind::Median, 0), 1.5);
    assert_eq!(r.statistic(StatKind::SumSquares, 0), 14.0);
    assert_eq!(r.statistic(StatKind::MeanSquares, 0), 3.5);
    assert_eq!(r.statistic(StatKind::Modulus, 0), 6.0);
    let var = r.statistic(StatKind::Variance, 0);
    assert!((var - 5.0 / 3.0).abs() < 1e-12);
}

#[test]
fn median_odd_count() {
    assert_eq!(StatKind::Median.compute(&[5.0, 1.0, 3.0]), 3.0);
    assert_eq!(StatKind::Median.compute(&[]), 0.0);
}

#[test]
fn robust_deviations_are_scaled() {
    let v = [1.0, 2.0, 3.0, 4.0, 5.0];
    // median 3, |dev| = 2 1 0 1 2
    assert!((StatKind::MedianDev.compute(&v) - 1.4826).abs() < 1e-12);
    assert!((StatKind::AvgDev.compute(&v) - 1.2533 * 1.2).abs() < 1e-12);
}

#[test]
fn statistic_pixel_shapes() {
    let rgb = Raster::from_samples(1, 1, true, false, vec![0.1, 0.2, 0.3]).unwrap();
    assert_eq!(
        rgb.statistic_pixel(StatKind::Mean, None).unwrap(),
        Pixel::rgb(0.1, 0.2, 0.3)
    );
    assert_eq!(
        rgb.statistic_pixel(StatKind::Mean, Some(1)).unwrap(),
        Pixel::gray(0.2)
    );
    assert!(rgb.statistic_pixel(StatKind::Mean, Some(3)).is_err());
}

#[test]
fn rescale_and_truncate() {
    let mut r = ramp();
    r.rescale(0.0, 1.0);
    assert_eq!(r.data(), &[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);

    let mut t = ramp();
    t.truncate(0.5, 2.0);
    assert_eq!(t.data(), &[0.5, 1.0, 2.0, 2.0]);

    let mut flat = Raster::from_samples(2, 1, false, false, vec![0.7, 0.7]).unwrap();
    flat.rescale(0.25, 1.0);
    assert_eq!(flat.data(), &[0.25, 0.25]);
}

#[test]
fn fingerprint_tracks_content() {
    let a = ramp();
    let mut b = ramp();
    assert_eq!(a.fingerprint(), b.fingerprint());
    b.set_sample(0, 0, 0, 9.0);
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn dynamic_image_round_trip_keeps_shape() {
    let r = Raster::from_samples(2, 1, true, false, vec![0.0, 0.5, 1.0, 1.0, 0.5, 0.0]).unwrap();
    let img = r.to_dynamic().unwrap();
    let back = Raster::from_dynamic(&img).unwrap();
    assert!(back.is_color());
    assert!(!back.has_alpha());
    for (a, b) in r.data().iter().zip(back.data()) {
        assert!((a - b).abs() < 1e-4);
    }
}

use super::*;

#[test]
fn kernel_weights_sum_to_one() {
    for t in [0.0, 0.25, 0.5, 0.9] {
        let s: f64 = weights(t).iter().sum();
        assert!((s - 1.0).abs() < 1e-12, "t={t} sum={s}");
    }
}

#[test]
fn integer_coordinates_reproduce_samples() {
    let r = Raster::from_samples(3, 2, false, false, vec![0.0, 0.5, 1.0, 0.2, 0.4, 0.6]).unwrap();
    let it = BicubicInterpolator::new(&r, 0);
    for y in 0..2u32 {
        for x in 0..3u32 {
            let v = it.sample(f64::from(x), f64::from(y));
            assert!((v - r.sample(x, y, 0)).abs() < 1e-12);
        }
    }
}

#[test]
fn constant_image_interpolates_to_constant() {
    let r = Raster::from_samples(4, 4, false, false, vec![0.3; 16]).unwrap();
    let it = BicubicInterpolator::new(&r, 0);
    assert!((it.sample(1.37, 2.81) - 0.3).abs() < 1e-12);
    assert!((it.sample(-3.0, 9.0) - 0.3).abs() < 1e-12);
}

#[test]
fn colour_images_interpolate_every_channel() {
    let r = Raster::from_samples(1, 1, true, false, vec![0.1, 0.2, 0.3]).unwrap();
    let interp = ImageInterpolation::new(&r);
    let p = interp.pixel(0.5, 0.5);
    assert!(p.is_color());
    assert!((p.get(2) - 0.3).abs() < 1e-12);
}

use super::*;
use crate::expression::generators::GeneratorArgs;
use crate::expression::instr::ImageOperand;
use crate::expression::node::Expr;
use crate::expression::registry::FunctionId;
use crate::expression::vm::{Alias, EvalCtx, EvalError, invoke};
use crate::foundation::core::Canvas;
use crate::foundation::error::PixelMathError;
use crate::imaging::raster::Raster;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

fn run_ops(name: &str, ops: &mut [Operand<'_>], rng: &mut StdRng) -> Result<Pixel, EvalError> {
    let mut ctx = EvalCtx {
        x: 1,
        y: 0,
        canvas: Canvas::new(4, 1).unwrap(),
        vars: &mut [],
        rng,
    };
    invoke(FunctionId::named(name).unwrap(), ops, &mut ctx)
}

fn call(name: &str, args: &[Pixel]) -> Pixel {
    let mut ops: Vec<Operand<'_>> = args.iter().map(|p| Operand::value(*p)).collect();
    run_ops(name, &mut ops, &mut StdRng::seed_from_u64(0)).unwrap()
}

fn g(v: f64) -> Pixel {
    Pixel::gray(v)
}

fn image(raster: Raster) -> ImageOperand {
    ImageOperand {
        id: "img".to_string(),
        raster: Arc::new(raster),
        channel: None,
        by_reference: true,
        interp: None,
    }
}

fn by_ref(img: &ImageOperand) -> Operand<'_> {
    Operand {
        value: Pixel::gray(0.0),
        alias: Some(Alias::Image(img)),
    }
}

#[test]
fn arithmetic_and_comparison_operators() {
    assert_eq!(call("^", &[g(2.0), g(3.0)]), g(8.0));
    assert_eq!(call("--", &[g(1.0), g(4.0)]), g(3.0));
    assert_eq!(call("%", &[g(7.0), g(4.0)]), g(3.0));
    assert_eq!(call("~", &[g(0.25)]), g(0.75));
    assert_eq!(call("!", &[g(0.0)]), g(1.0));
    assert_eq!(call("neg", &[g(2.0)]), g(-2.0));
    assert_eq!(call("<", &[g(1.0), g(2.0)]), g(1.0));
    assert_eq!(call(">=", &[g(1.0), g(2.0)]), g(0.0));
    assert_eq!(call("!=", &[g(1.0), g(2.0)]), g(1.0));
    assert_eq!(
        call("<", &[Pixel::rgb(0.0, 1.0, 2.0), g(1.0)]),
        Pixel::rgb(1.0, 0.0, 0.0)
    );
}

#[test]
fn bitwise_operators_truncate_to_integers() {
    assert_eq!(call("&", &[g(6.0), g(3.0)]), g(2.0));
    assert_eq!(call("|", &[g(6.0), g(3.0)]), g(7.0));
    assert_eq!(call("&|", &[g(6.9), g(3.0)]), g(5.0));
    assert_eq!(call("!|", &[g(0.0), g(0.0)]), g(-1.0));
}

#[test]
fn math_functions() {
    assert_eq!(call("mtf", &[g(0.5), g(0.3)]), g(0.3));
    assert_eq!(call("mtf", &[g(0.2), g(0.2)]), g(0.5));
    assert_eq!(call("mtf", &[g(0.2), g(1.5)]), g(1.0));
    assert_eq!(call("round", &[g(1.2345), g(2.0)]), g(1.23));
    assert_eq!(call("round", &[g(-2.5)]), g(-3.0));
    assert_eq!(call("clamp", &[g(2.0), g(0.0), g(1.0)]), g(1.0));
    assert_eq!(call("rescale", &[g(0.5), g(0.0), g(2.0)]), g(0.25));
    assert_eq!(call("rescale", &[g(0.5), g(1.0), g(1.0)]), g(0.0));
    assert_eq!(call("sign", &[g(-4.0)]), g(-1.0));
    assert_eq!(call("frac", &[g(2.75)]), g(0.75));
    assert_eq!(call("pi", &[]), g(std::f64::consts::PI));
}

#[test]
fn statistics_over_arguments_work_per_channel() {
    assert_eq!(call("mean", &[g(1.0), g(2.0), g(3.0), g(6.0)]), g(3.0));
    assert_eq!(call("median", &[g(1.0), g(5.0), g(2.0)]), g(2.0));
    assert_eq!(call("sum", &[g(1.0), g(5.0)]), g(6.0));
    assert_eq!(
        call("max", &[Pixel::rgb(0.0, 1.0, 2.0), g(1.5)]),
        Pixel::rgb(1.5, 1.5, 2.0)
    );
    assert_eq!(call("maxsample", &[Pixel::rgb(0.1, 0.9, 0.3), g(0.5)]), g(0.9));
    assert_eq!(call("minsample", &[Pixel::rgb(0.1, 0.9, 0.3), g(0.5)]), g(0.1));
}

#[test]
fn a_single_image_reference_aggregates_the_whole_image() {
    let img = image(Raster::from_samples(2, 2, false, false, vec![0.0, 1.0, 0.5, 0.5]).unwrap());
    let mut rng = StdRng::seed_from_u64(0);
    let mean = run_ops("mean", &mut [by_ref(&img)], &mut rng).unwrap();
    assert_eq!(mean, g(0.5));
    let max = run_ops("max", &mut [by_ref(&img)], &mut rng).unwrap();
    assert_eq!(max, g(1.0));
    let maxsample = run_ops("maxsample", &mut [by_ref(&img)], &mut rng).unwrap();
    assert_eq!(maxsample, g(1.0));
}

#[test]
fn pixel_lookup_reads_absolute_coordinates() {
    let img = image(
        Raster::from_samples(2, 1, true, false, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap(),
    );
    let mut rng = StdRng::seed_from_u64(0);
    let inside = run_ops(
        "pixel",
        &mut [by_ref(&img), Operand::value(g(1.0)), Operand::value(g(0.0))],
        &mut rng,
    )
    .unwrap();
    assert_eq!(inside, Pixel::rgb(0.4, 0.5, 0.6));
    let channel = run_ops(
        "pixel",
        &mut [
            by_ref(&img),
            Operand::value(g(0.4)),
            Operand::value(g(0.0)),
            Operand::value(g(2.0)),
        ],
        &mut rng,
    )
    .unwrap();
    assert_eq!(channel, g(0.3));
    let outside = run_ops(
        "pixel",
        &mut [by_ref(&img), Operand::value(g(5.0)), Operand::value(g(0.0))],
        &mut rng,
    )
    .unwrap();
    assert_eq!(outside, g(0.0));
    assert!(
        run_ops(
            "pixel",
            &mut [
                by_ref(&img),
                Operand::value(g(0.0)),
                Operand::value(g(0.0)),
                Operand::value(g(3.0)),
            ],
            &mut rng,
        )
        .is_err()
    );
    assert_eq!(run_ops("n", &mut [by_ref(&img)], &mut rng).unwrap(), g(2.0));
    assert_eq!(run_ops("iscolor", &mut [by_ref(&img)], &mut rng).unwrap(), g(1.0));
}

#[test]
fn conditionals_select_per_channel() {
    assert_eq!(
        call("iif", &[Pixel::rgb(1.0, 0.0, 1.0), g(5.0), g(7.0)]),
        Pixel::rgb(5.0, 7.0, 5.0)
    );
    assert_eq!(
        call("iswitch", &[g(0.0), g(1.0), g(1.0), g(2.0), g(3.0)]),
        g(2.0)
    );
    assert_eq!(call("iswitch", &[g(0.0), g(1.0), g(3.0)]), g(3.0));
}

#[test]
fn geometry_uses_the_current_position() {
    assert_eq!(call("x", &[]), g(1.0 / 3.0));
    assert_eq!(call("y", &[]), g(0.0));
    assert_eq!(call("xpos", &[]), g(1.0));
    assert_eq!(call("w", &[]), g(4.0));
    assert_eq!(call("area", &[]), g(4.0));
    assert_eq!(call("rdist", &[]), g(0.5));
    assert_eq!(call("rdist", &[g(4.0), g(4.0)]), g(5.0));
    assert_eq!(call("inrect", &[g(1.0), g(0.0), g(1.0), g(1.0)]), g(1.0));
    assert_eq!(call("inrect", &[g(2.0), g(0.0), g(1.0), g(1.0)]), g(0.0));
    assert_eq!(call("inellipse", &[g(0.0), g(0.0), g(1.0), g(1.0)]), g(1.0));
}

#[test]
fn random_functions_follow_the_generator_seed() {
    let draw = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..4)
            .map(|_| run_ops("random", &mut [], &mut rng).unwrap().get(0))
            .collect::<Vec<_>>()
    };
    assert_eq!(draw(3), draw(3));
    assert_ne!(draw(3), draw(4));
    assert!(draw(5).iter().all(|v| (0.0..1.0).contains(v)));
    assert_eq!(call("gauss", &[g(2.0), g(0.0)]), g(2.0));
}

#[test]
fn generators_transform_whole_images() {
    let src = Raster::from_fn(3, 2, false, |x, _| Pixel::gray(f64::from(x))).unwrap();
    let canvas = Canvas::new(3, 2).unwrap();
    let run = |name: &str, params: &[f64]| {
        let generate = FunctionId::named(name).unwrap().def().generate.unwrap();
        generate(&GeneratorArgs {
            image: &src,
            params,
            canvas,
        })
    };
    let mirrored = run("hmirror", &[]).unwrap();
    assert_eq!(mirrored.sample(0, 0, 0), 2.0);
    assert_eq!(mirrored.sample(2, 1, 0), 0.0);
    let moved = run("translate", &[1.0, 0.0]).unwrap();
    assert_eq!(moved.sample(0, 0, 0), 0.0);
    assert_eq!(moved.sample(1, 0, 0), 0.0);
    assert_eq!(moved.sample(2, 0, 0), 1.0);

    let flat = Raster::from_fn(4, 4, true, |_, _| Pixel::rgb(0.0, 0.25, 0.5)).unwrap();
    for name in ["bconv", "gconv"] {
        let generate = FunctionId::named(name).unwrap().def().generate.unwrap();
        let out = generate(&GeneratorArgs {
            image: &flat,
            params: &[],
            canvas: Canvas::new(4, 4).unwrap(),
        })
        .unwrap();
        for c in 0..3 {
            assert!((out.sample(2, 1, c) - 0.25 * c as f64).abs() < 1e-12);
        }
    }
    assert!(run("bconv", &[4.0]).is_err());
}

#[test]
fn oversized_filters_fail_with_resource_errors() {
    let src = Raster::from_fn(3, 3, false, |x, y| Pixel::gray(f64::from(x + y))).unwrap();
    for (name, size) in [
        ("gconv", 1e17),
        ("gconv", 1e300),
        ("bconv", 9_007_199_254_740_991.0),
    ] {
        let generate = FunctionId::named(name).unwrap().def().generate.unwrap();
        let res = generate(&GeneratorArgs {
            image: &src,
            params: &[size],
            canvas: Canvas::new(3, 3).unwrap(),
        });
        assert!(
            matches!(res, Err(PixelMathError::Resource(_))),
            "{name}({size}) should fail with a resource error"
        );
    }
}

#[test]
fn generator_arguments_are_checked_before_compilation() {
    let check = |name: &str, args: Vec<Expr>| {
        let def = FunctionId::named(name).unwrap().def();
        def.validate.map_or(Ok(()), |v| v(&args))
    };
    assert!(check("gconv", vec![Expr::image("a"), 0.0.into()]).is_err());
    assert!(check("gconv", vec![Expr::image("a"), 1.5.into()]).is_ok());
    assert!(check("bconv", vec![Expr::image("a"), 2.0.into()]).is_err());
    assert!(check("iswitch", vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()]).is_err());
    assert!(check("rdist", vec![1.0.into()]).is_err());
}

#[test]
fn generator_calls_fail_when_evaluated_per_pixel() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(run_ops("hmirror", &mut [Operand::value(g(0.0))], &mut rng).is_err());
}

use super::*;
use crate::expression::node::Expr;
use crate::foundation::core::Canvas;
use crate::imaging::store::ImageStore;
use crate::session::pipeline::{ChannelExpressions, PixelMathOpts, Target, compile};
use crate::symbols::parse::parse_symbols;

fn e(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args).unwrap()
}

fn compiled(exprs: ChannelExpressions, symbols: &str, color: bool, w: u32, h: u32) -> CompiledProgram {
    let images = ImageStore::new();
    let target = Target::blank(Canvas::new(w, h).unwrap(), color);
    compile(
        &exprs,
        &parse_symbols(symbols).unwrap(),
        &images,
        &target,
        &PixelMathOpts::default(),
    )
    .unwrap()
}

fn full(w: u32, h: u32) -> Geometry {
    Geometry::full(Canvas::new(w, h).unwrap())
}

#[test]
fn conditional_over_positions() {
    let program = compiled(
        ChannelExpressions::single(e(
            "iif",
            vec![e(">", vec![e("x", vec![]), 0.5.into()]), 1.0.into(), 0.0.into()],
        )),
        "",
        false,
        4,
        1,
    );
    let mut out = Raster::new(4, 1, false, false).unwrap();
    let report = execute(&program, Output::Raster(&mut out), full(4, 1), &ExecuteOpts::default())
        .unwrap();
    assert_eq!(out.data(), &[0.0, 0.0, 1.0, 1.0]);
    assert!(report.globals.is_empty());
    assert!(report.workers >= 1);
}

#[test]
fn thread_count_does_not_change_the_output() {
    let expr = e(
        "+",
        vec![
            e("*", vec![e("xpos", vec![]), 0.01.into()]),
            e("sin", vec![e("ypos", vec![])]),
        ],
    );
    let program = compiled(ChannelExpressions::single(expr), "", true, 7, 13);
    let render = |threads| {
        let mut out = Raster::new(7, 13, true, false).unwrap();
        let opts = ExecuteOpts {
            threads: Some(threads),
            ..ExecuteOpts::default()
        };
        execute(&program, Output::Raster(&mut out), full(7, 13), &opts).unwrap();
        out
    };
    let one = render(1);
    assert_eq!(one, render(3));
    assert_eq!(one, render(16));
}

#[test]
fn globals_merge_across_workers() {
    let program = compiled(
        ChannelExpressions::single(e("+=", vec![Expr::variable("count"), 1.0.into()])),
        "count=global(+)",
        false,
        5,
        9,
    );
    for threads in [1, 4] {
        let opts = ExecuteOpts {
            threads: Some(threads),
            ..ExecuteOpts::default()
        };
        let report =
            execute(&program, Output::SideEffects { channels: 1 }, full(5, 9), &opts).unwrap();
        assert_eq!(report.globals.len(), 1);
        assert_eq!(report.globals[0].name, "count");
        assert_eq!(report.globals[0].value[0], 45.0);
    }
}

#[test]
fn products_merge_with_their_initial_value() {
    let program = compiled(
        ChannelExpressions::single(e("*=", vec![Expr::variable("p"), 2.0.into()])),
        "p=global(*,3)",
        false,
        2,
        2,
    );
    let opts = ExecuteOpts {
        threads: Some(2),
        ..ExecuteOpts::default()
    };
    let report = execute(&program, Output::SideEffects { channels: 1 }, full(2, 2), &opts).unwrap();
    assert_eq!(report.globals[0].value[0], 48.0);
}

#[test]
fn abort_flag_cancels_execution() {
    let program = compiled(ChannelExpressions::single(1.0.into()), "", false, 4, 4);
    let abort = Arc::new(AtomicBool::new(true));
    let opts = ExecuteOpts {
        abort: Some(Arc::clone(&abort)),
        ..ExecuteOpts::default()
    };
    let mut out = Raster::new(4, 4, false, false).unwrap();
    let err = execute(&program, Output::Raster(&mut out), full(4, 4), &opts).unwrap_err();
    assert!(matches!(err, PixelMathError::Cancelled));
}

#[test]
fn the_first_evaluation_error_is_reported_once() {
    let images = {
        let mut s = ImageStore::new();
        s.insert("img", Raster::new(2, 2, false, false).unwrap());
        s
    };
    let target = Target::blank(Canvas::new(2, 2).unwrap(), false);
    let program = compile(
        &ChannelExpressions::single(e(
            "pixel",
            vec![Expr::image("img"), 0.0.into(), 0.0.into(), Expr::variable("c")],
        )),
        &parse_symbols("c=init(5)").unwrap(),
        &images,
        &target,
        &PixelMathOpts::default(),
    )
    .unwrap();
    let opts = ExecuteOpts {
        threads: Some(2),
        ..ExecuteOpts::default()
    };
    let mut out = Raster::new(2, 2, false, false).unwrap();
    let err = execute(&program, Output::Raster(&mut out), full(2, 2), &opts).unwrap_err();
    let PixelMathError::Evaluation(msg) = err else {
        panic!("expected an evaluation error, got {err:?}");
    };
    assert!(msg.contains("channel index out of range"), "{msg}");
    assert!(msg.starts_with("pixel ("), "{msg}");
}

#[test]
fn regions_use_absolute_coordinates() {
    let program = compiled(ChannelExpressions::single(e("xpos", vec![])), "", false, 5, 3);
    let geometry = Geometry::region(Canvas::new(5, 3).unwrap(), 1, 2, 3, 1).unwrap();
    let mut out = Raster::new(3, 1, false, false).unwrap();
    execute(&program, Output::Raster(&mut out), geometry, &ExecuteOpts::default()).unwrap();
    assert_eq!(out.data(), &[1.0, 2.0, 3.0]);

    let mut wrong = Raster::new(5, 3, false, false).unwrap();
    assert!(execute(&program, Output::Raster(&mut wrong), geometry, &ExecuteOpts::default()).is_err());
}

#[test]
fn per_channel_and_alpha_slots_write_their_channel() {
    let exprs = ChannelExpressions {
        red_or_gray: vec![0.25.into()],
        green: vec![0.5.into()],
        blue: vec![0.75.into()],
        alpha: vec![1.0.into()],
    };
    let images = ImageStore::new();
    let target = Target {
        alpha: true,
        ..Target::blank(Canvas::new(1, 1).unwrap(), true)
    };
    let opts = PixelMathOpts {
        single_expression: false,
        ..PixelMathOpts::default()
    };
    let program = compile(&exprs, &SymbolTable::new(), &images, &target, &opts).unwrap();
    let mut out = Raster::new(1, 1, true, true).unwrap();
    execute(&program, Output::Raster(&mut out), full(1, 1), &ExecuteOpts::default()).unwrap();
    assert_eq!(out.data(), &[0.25, 0.5, 0.75, 1.0]);

    let mut no_alpha = Raster::new(1, 1, true, false).unwrap();
    execute(&program, Output::Raster(&mut no_alpha), full(1, 1), &ExecuteOpts::default()).unwrap();
    assert_eq!(no_alpha.data(), &[0.25, 0.5, 0.75]);
}

#[test]
fn colour_alpha_results_contribute_their_first_component() {
    let alpha = vec![Expr::rgb(0.25, 0.5, 0.75)];
    let images = ImageStore::new();
    let opts = PixelMathOpts {
        single_expression: false,
        ..PixelMathOpts::default()
    };
    for color in [true, false] {
        let exprs = ChannelExpressions {
            red_or_gray: vec![0.125.into()],
            alpha: alpha.clone(),
            ..ChannelExpressions::default()
        };
        let target = Target {
            alpha: true,
            ..Target::blank(Canvas::new(1, 1).unwrap(), color)
        };
        let program = compile(&exprs, &SymbolTable::new(), &images, &target, &opts).unwrap();
        let mut out = Raster::new(1, 1, color, true).unwrap();
        execute(&program, Output::Raster(&mut out), full(1, 1), &ExecuteOpts::default()).unwrap();
        let alpha_channel = out.channels() - 1;
        assert_eq!(out.sample(0, 0, alpha_channel), 0.25, "color={color}");
    }
}

#[test]
fn invalid_execution_requests_fail_early() {
    let program = compiled(ChannelExpressions::single(1.0.into()), "", false, 2, 2);
    let zero = ExecuteOpts {
        threads: Some(0),
        ..ExecuteOpts::default()
    };
    assert!(execute(&program, Output::SideEffects { channels: 1 }, full(2, 2), &zero).is_err());
    assert!(
        execute(
            &program,
            Output::SideEffects { channels: 5 },
            full(2, 2),
            &ExecuteOpts::default()
        )
        .is_err()
    );

    let unlinked = crate::expression::compile::postfix(
        &e("iif", vec![1.0.into(), 2.0.into(), 3.0.into()]),
        true,
    );
    let slots: SlotPrograms = [vec![unlinked], Vec::new(), Vec::new(), Vec::new()];
    assert!(matches!(
        CompiledProgram::new(slots, true, SymbolTable::new()),
        Err(PixelMathError::Internal(_))
    ));
}

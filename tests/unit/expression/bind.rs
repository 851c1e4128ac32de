use super::*;
use crate::expression::compile::postfix;
use crate::expression::node::Expr;
use crate::imaging::store::ImageStore;
use crate::symbols::parse::parse_symbols;

fn store() -> ImageStore {
    let mut s = ImageStore::new();
    s.insert("main", Raster::new(4, 4, true, false).unwrap());
    s.insert("small", Raster::new(2, 2, false, false).unwrap());
    s
}

fn e(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args).unwrap()
}

#[test]
fn names_are_replaced_by_bound_operands() {
    let images = store();
    let symbols = parse_symbols("v, k=2").unwrap();
    let mut binder = Binder::new(
        &symbols,
        ImageScope::new(&images, Some("main")),
        Canvas::new(4, 4).unwrap(),
    );
    let expr = e(
        "=",
        vec![
            Expr::variable("v"),
            e("*", vec![Expr::target(), Expr::constant("k")]),
        ],
    );
    let mut p = postfix(&expr, true);
    binder.bind(&mut p).unwrap();
    let Instr::Variable(v) = &p.instrs()[0] else {
        panic!("expected a variable");
    };
    assert!(v.lvalue);
    let Instr::Image(img) = &p.instrs()[1] else {
        panic!("expected an image");
    };
    assert_eq!(img.id, "main");
    assert!(img.interp.is_none());
    assert!(matches!(p.instrs()[2], Instr::Constant(_)));
}

#[test]
fn smaller_images_share_one_interpolator() {
    let images = store();
    let symbols = SymbolTable::new();
    let mut binder = Binder::new(
        &symbols,
        ImageScope::new(&images, Some("main")),
        Canvas::new(4, 4).unwrap(),
    );
    let mut p = postfix(
        &e("+", vec![Expr::image("small"), Expr::image_channel("small", 0)]),
        true,
    );
    binder.bind(&mut p).unwrap();
    let interps: Vec<_> = p
        .instrs()
        .iter()
        .filter_map(|i| match i {
            Instr::Image(img) => img.interp.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(interps.len(), 2);
    assert!(Arc::ptr_eq(&interps[0], &interps[1]));
}

#[test]
fn unknown_names_and_bad_channels_fail() {
    let images = store();
    let symbols = parse_symbols("k=1").unwrap();
    let canvas = Canvas::new(4, 4).unwrap();

    let mut binder = Binder::new(&symbols, ImageScope::new(&images, None), canvas);
    let mut p = postfix(&Expr::target(), true);
    assert!(matches!(binder.bind(&mut p), Err(PixelMathError::Compile(_))));

    let mut p = postfix(&Expr::image("nope"), true);
    assert!(binder.bind(&mut p).is_err());

    let mut p = postfix(&Expr::image_channel("small", 1), true);
    let err = binder.bind(&mut p).unwrap_err();
    assert!(err.to_string().contains("channel index out of range"));

    let mut p = postfix(&Expr::variable("k"), true);
    assert!(binder.bind(&mut p).is_err());
}

#[test]
fn empty_images_are_rejected() {
    let mut images = store();
    images.insert("empty", Raster::new(0, 0, false, false).unwrap());
    let symbols = SymbolTable::new();
    let mut binder = Binder::new(
        &symbols,
        ImageScope::new(&images, Some("main")),
        Canvas::new(4, 4).unwrap(),
    );
    let mut p = postfix(&Expr::image("empty"), true);
    let err = binder.bind(&mut p).unwrap_err();
    assert!(matches!(err, PixelMathError::Compile(_)));
    assert!(err.to_string().contains("empty image"), "{err}");
}

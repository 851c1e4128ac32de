use super::*;
use crate::foundation::pixel::Pixel;

#[test]
fn builders_produce_the_expected_nodes() {
    assert_eq!(Expr::from(2.0), Expr::Sample(2.0));
    assert_eq!(Expr::rgb(0.1, 0.2, 0.3), Expr::Pixel(Pixel::rgb(0.1, 0.2, 0.3)));
    assert!(Expr::sample(1.0).is_literal());
    assert!(!Expr::target().is_literal());
    let Expr::Image(img) = Expr::image_channel("a", 2) else {
        panic!("expected an image node");
    };
    assert_eq!(img.channel, Some(2));
    assert!(!img.by_reference);
}

#[test]
fn calls_resolve_tokens_and_aliases() {
    let by_symbol = Expr::call("+", vec![1.0.into(), 2.0.into()]).unwrap();
    let by_token = Expr::call("add", vec![1.0.into(), 2.0.into()]).unwrap();
    assert_eq!(by_symbol, by_token);
    assert!(Expr::call("nope", vec![]).is_err());
}

#[test]
fn json_uses_function_tokens() {
    let expr = Expr::call(
        "iif",
        vec![
            Expr::call("gt", vec![Expr::target(), 0.5.into()]).unwrap(),
            Expr::rgb(1.0, 0.0, 0.0),
            Expr::variable("v"),
        ],
    )
    .unwrap();
    let json = serde_json::to_value(&expr).unwrap();
    assert_eq!(json["call"]["func"], "iif");
    assert_eq!(json["call"]["args"][0]["call"]["func"], "gt");
    assert_eq!(json["call"]["args"][1]["pixel"], serde_json::json!([1.0, 0.0, 0.0]));
    let back: Expr = serde_json::from_value(json).unwrap();
    assert_eq!(back, expr);
}

#[test]
fn unknown_function_tokens_fail_to_deserialize() {
    let json = serde_json::json!({"call": {"func": "frobnicate", "args": []}});
    assert!(serde_json::from_value::<Expr>(json).is_err());
}

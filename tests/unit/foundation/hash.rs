use super::*;

fn fp(f: impl FnOnce(&mut StableHasher)) -> Fingerprint {
    let mut h = StableHasher::new();
    f(&mut h);
    h.finish()
}

#[test]
fn same_input_same_fingerprint() {
    let a = fp(|h| {
        h.write_str("bconv");
        h.write_f64(3.0);
    });
    let b = fp(|h| {
        h.write_str("bconv");
        h.write_f64(3.0);
    });
    assert_eq!(a, b);
}

#[test]
fn length_prefix_separates_strings() {
    let a = fp(|h| {
        h.write_str("ab");
        h.write_str("c");
    });
    let b = fp(|h| {
        h.write_str("a");
        h.write_str("bc");
    });
    assert_ne!(a, b);
}

#[test]
fn display_is_32_hex_digits() {
    let s = fp(|h| h.write_u8(1)).to_string();
    assert_eq!(s.len(), 32);
    assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
}

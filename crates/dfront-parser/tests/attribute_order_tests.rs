//! Storage-class sets are insensitive to the source order of
//! non-conflicting modifiers.

mod common;

use common::parse_clean;
use dfront_ast::{DeclKind, StorageClass};
use proptest::prelude::*;

const MODIFIERS: &[(&str, StorageClass)] = &[
    ("static", StorageClass::STATIC),
    ("final", StorageClass::FINAL),
    ("override", StorageClass::OVERRIDE),
    ("nothrow", StorageClass::NOTHROW),
    ("pure", StorageClass::PURE),
    ("@safe", StorageClass::SAFE),
    ("@nogc", StorageClass::NOGC),
    ("@property", StorageClass::PROPERTY),
];

fn func_stc(source: &str) -> StorageClass {
    let parsed = parse_clean(source);
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { stc, .. } => *stc,
        other => panic!("expected function, got {other:?}"),
    }
}

proptest! {
    #[test]
    fn storage_class_order_does_not_matter(indices in proptest::sample::subsequence(
        (0..MODIFIERS.len()).collect::<Vec<_>>(), 0..MODIFIERS.len()),
        seed in any::<u64>())
    {
        let mut chosen: Vec<&(&str, StorageClass)> =
            indices.iter().map(|&i| &MODIFIERS[i]).collect();

        let mut expected = StorageClass::UNDEFINED;
        for (_, bit) in chosen.iter() {
            expected |= *bit;
        }

        let forward: Vec<&str> = chosen.iter().map(|(name, _)| *name).collect();
        let source = format!("{} void f() {{ }}", forward.join(" "));
        prop_assert_eq!(func_stc(source.trim()), expected);

        // deterministic pseudo-shuffle driven by the seed
        let len = chosen.len();
        if len > 1 {
            for i in 0..len {
                let j = ((seed >> (i % 8)) as usize) % len;
                chosen.swap(i, j);
            }
        }
        let shuffled: Vec<&str> = chosen.iter().map(|(name, _)| *name).collect();
        let source = format!("{} void f() {{ }}", shuffled.join(" "));
        prop_assert_eq!(func_stc(source.trim()), expected);
    }
}

#[test]
fn order_independence_holds_for_a_known_pair() {
    assert_eq!(
        func_stc("static nothrow @safe void f() { }"),
        func_stc("@safe nothrow static void f() { }")
    );
}

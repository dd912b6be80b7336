//! Property tests for the name dictionary.

use brres::io::{calc_dictionary_size, Dictionary, NameTable, Reader, Region, Writer};
use proptest::prelude::*;

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[A-Za-z_][A-Za-z0-9_.()]{0,23}", 0..48).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_size_depends_only_on_count(names in names()) {
        let dict = Dictionary::from_entries(names.iter().enumerate().map(|(i, n)| (n.as_str(), 4 * i as u32))).unwrap();
        let mut w = Writer::new();
        let mut pool = NameTable::new();
        dict.write(&mut w, &mut pool).unwrap();
        prop_assert_eq!(w.tell(), calc_dictionary_size(names.len()));
        prop_assert_eq!(dict.nodes().len(), names.len() + 1);
    }

    #[test]
    fn prop_every_name_found(names in names(), query in "[a-z]{1,6}") {
        let dict = Dictionary::from_entries(names.iter().enumerate().map(|(i, n)| (n.as_str(), 4 * i as u32))).unwrap();
        for (i, n) in names.iter().enumerate() {
            let node = dict.find(n);
            prop_assert!(node.is_some(), "{} missing", n);
            prop_assert_eq!(node.unwrap().data, 4 * i as u32);
        }
        prop_assert_eq!(dict.find(&query).is_some(), names.contains(&query));
    }

    #[test]
    fn prop_survives_encoding(names in names()) {
        let dict = Dictionary::from_entries(names.iter().enumerate().map(|(i, n)| (n.as_str(), 4 * i as u32))).unwrap();
        let mut w = Writer::new();
        let mut pool = NameTable::new();
        dict.write(&mut w, &mut pool).unwrap();
        pool.flush(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let owner = Region::new("dict", 0, bytes.len() as u32);
        let back = Dictionary::read(&mut r, &owner, Some(names.len())).unwrap();
        prop_assert_eq!(back, dict);
    }
}

#[test]
fn test_sizes() {
    assert_eq!(calc_dictionary_size(0), 0x18);
    assert_eq!(calc_dictionary_size(1), 0x28);
    assert_eq!(calc_dictionary_size(10), 0xB8);
}

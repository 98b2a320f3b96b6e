use metadata_core::hash_sequence;

#[test]
fn deterministic_across_calls() {
    let tokens: Vec<i64> = (1..=8).collect();
    let a = hash_sequence(&tokens, 4);
    let b = hash_sequence(&tokens, 4);
    assert_eq!(a, b);
}

#[test]
fn two_full_blocks_from_eight_tokens() {
    let tokens: Vec<i64> = (1..=8).collect();
    let ids = hash_sequence(&tokens, 4);
    assert_eq!(ids.len(), 2);
}

#[test]
fn prefix_monotonicity() {
    let tokens: Vec<i64> = (1..=8).collect();
    let full = hash_sequence(&tokens, 4);
    let prefix = hash_sequence(&tokens[0..4], 4);
    assert_eq!(prefix.len(), 1);
    assert_eq!(prefix[0], full[0]);
}

#[test]
fn trailing_partial_block_discarded() {
    let tokens: Vec<i64> = (1..=7).collect();
    let ids = hash_sequence(&tokens, 4);
    assert_eq!(ids.len(), 1);
}

#[test]
fn different_prefixes_diverge() {
    let a = hash_sequence(&[1, 2, 3, 4], 4);
    let b = hash_sequence(&[1, 2, 3, 5], 4);
    assert_ne!(a[0], b[0]);
}

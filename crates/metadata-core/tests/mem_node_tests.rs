use metadata_core::{MemoryNode, NodeKind};

#[test]
fn check_hits_updates_statistics() {
    let mut mn = MemoryNode::new(NodeKind::Prefill, 8, 4).unwrap();
    mn.sync(&[10, 20, 30]).unwrap();
    let hits = mn.check_hits(&[10, 20, 99]);
    assert_eq!(hits, 2);
    assert_eq!(mn.hit_statistics.num_fetch(), 3);
    assert_eq!(mn.hit_statistics.fetch_hits(), 2);
    assert!((mn.hit_statistics.ratio() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn ratio_is_zero_with_no_fetches() {
    let mn = MemoryNode::new(NodeKind::Decode, 8, 4).unwrap();
    assert_eq!(mn.hit_statistics.ratio(), 0.0);
}

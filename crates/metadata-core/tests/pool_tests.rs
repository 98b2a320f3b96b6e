use metadata_common::Error;
use metadata_core::BlockPool;

#[test]
fn sync_respects_capacity() {
    let mut pool = BlockPool::new(2, 4).unwrap();
    let err = pool.sync(&[1, 2, 3]).unwrap_err();
    assert_eq!(err, Error::NoCapacity("sync of 3 distinct blocks exceeds capacity 2".into()));
    assert_eq!(pool.held_count(), 0);
}

#[test]
fn add_blocks_unions_and_respects_capacity() {
    let mut pool = BlockPool::new(3, 4).unwrap();
    pool.sync(&[1, 2]).unwrap();
    pool.add_blocks(&[2, 3]).unwrap();
    assert_eq!(pool.held_count(), 3);
    let err = pool.add_blocks(&[4]).unwrap_err();
    assert!(matches!(err, Error::NoCapacity(_)));
    assert_eq!(pool.held_count(), 3);
}

#[test]
fn delete_is_all_or_nothing() {
    let mut pool = BlockPool::new(4, 4).unwrap();
    pool.sync(&[1, 2, 3]).unwrap();
    let err = pool.delete_blocks(&[1, 99]).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(pool.held_count(), 3);
    pool.delete_blocks(&[1, 2]).unwrap();
    assert_eq!(pool.held_count(), 1);
}

#[test]
fn free_blocks_tracks_capacity_minus_held() {
    let mut pool = BlockPool::new(5, 4).unwrap();
    pool.sync(&[1, 2]).unwrap();
    assert_eq!(pool.free_blocks(), 3);
}

#[test]
fn block_hits_is_longest_prefix() {
    let mut pool = BlockPool::new(10, 4).unwrap();
    pool.sync(&[10, 20, 40]).unwrap();
    assert_eq!(pool.block_hits(&[10, 20, 30, 40]), 2);
    assert_eq!(pool.block_hits(&[99, 10, 20]), 0);
    assert_eq!(pool.block_hits(&[10, 20]), 2);
}

#[test]
fn zero_capacity_rejected() {
    assert!(BlockPool::new(0, 4).is_err());
    assert!(BlockPool::new(4, 0).is_err());
}

use metadata_common::Error;
use metadata_core::comp_node::Role;
use metadata_core::{NodeKind, Registry};

#[tokio::test]
async fn add_memory_node_then_compute_node() {
    let reg = Registry::new(4);
    reg.add_memory_node("h1", NodeKind::Prefill, 8).await.unwrap();
    reg.add_compute_node("h1", 1000, Role::Prefill, 4).await.unwrap();
    assert_eq!(reg.prefill_host_count().await, 1);
}

#[tokio::test]
async fn duplicate_memory_node_rejected() {
    let reg = Registry::new(4);
    reg.add_memory_node("h1", NodeKind::Prefill, 8).await.unwrap();
    let err = reg.add_memory_node("h1", NodeKind::Prefill, 8).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
}

#[tokio::test]
async fn compute_node_before_memory_node_rejected() {
    let reg = Registry::new(4);
    let err = reg.add_compute_node("h1", 1000, Role::Prefill, 4).await.unwrap_err();
    assert!(matches!(err, Error::PreconditionFailed(_)));
}

#[tokio::test]
async fn cpu_nodes_round_robin() {
    let reg = Registry::new(4);
    reg.add_compute_node("c1", 1, Role::Cpu, 4).await.unwrap();
    reg.add_compute_node("c2", 2, Role::Cpu, 4).await.unwrap();
    let a = reg.next_cpu().await.unwrap();
    let b = reg.next_cpu().await.unwrap();
    let c = reg.next_cpu().await.unwrap();
    assert_eq!(a, ("c1".to_string(), 1));
    assert_eq!(b, ("c2".to_string(), 2));
    assert_eq!(c, ("c1".to_string(), 1));
}

#[tokio::test]
async fn memory_hit_rate_aggregates_across_hosts() {
    let reg = Registry::new(4);
    reg.add_memory_node("h1", NodeKind::Prefill, 16).await.unwrap();
    reg.add_memory_node("h2", NodeKind::Decode, 16).await.unwrap();
    reg.sync_memory("h1", NodeKind::Prefill, &[10, 20, 30]).await.unwrap();
    reg.sync_memory("h2", NodeKind::Decode, &[10]).await.unwrap();

    {
        let hosts = reg.prefill_hosts.read().await;
        let group = hosts.get("h1").unwrap().clone();
        drop(hosts);
        group.read().await.mem_node.check_hits(&[10, 20, 99]);
    }
    {
        let hosts = reg.decode_hosts.read().await;
        let group = hosts.get("h2").unwrap().clone();
        drop(hosts);
        group.read().await.mem_node.check_hits(&[10, 99]);
    }

    // 2 hits out of 3 fetches on h1, 1 hit out of 2 fetches on h2: 3/5.
    assert!((reg.memory_hit_rate().await - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn remove_host_then_ops_not_found() {
    let reg = Registry::new(4);
    reg.add_memory_node("h1", NodeKind::Prefill, 8).await.unwrap();
    reg.remove_host("h1", NodeKind::Prefill).await.unwrap();
    let err = reg.sync_memory("h1", NodeKind::Prefill, &[1]).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

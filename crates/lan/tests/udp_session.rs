use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bc4000::{
    Address, InputFlags, LanConfig, LanNode, LinkState, NodeEvent, Snapshot, UdpEndpoint,
};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(41000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
}

fn bind(port: u16) -> UdpEndpoint {
    UdpEndpoint::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).unwrap()
}

/// Pumps both nodes until `done` holds or the deadline passes.
fn pump_until(
    host: &mut LanNode<UdpEndpoint>,
    client: &mut LanNode<UdpEndpoint>,
    timeout_ms: u64,
    mut done: impl FnMut(&[NodeEvent]) -> bool,
) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        host.pump_lobby().unwrap();
        let events = client.pump_lobby().unwrap();
        if done(&events) {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn localhost_session_full_flow() {
    let host_port = next_port();
    let client_port = host_port + 1;

    // Loopback has no broadcast, so discovery is pointed at the host.
    let config = LanConfig {
        port: host_port,
        broadcast: Address::localhost(host_port),
        ..LanConfig::default()
    };
    let mut host = LanNode::new(bind(host_port), config.clone());
    let mut client = LanNode::new(bind(client_port), config);

    host.start_hosting().unwrap();
    client.start_joining().unwrap();

    let found = pump_until(&mut host, &mut client, 500, |events| {
        events.contains(&NodeEvent::CandidateFound(Address::localhost(host_port)))
    });
    assert!(found, "host never answered DISCOVER");

    // Re-send the request until the accept makes it back.
    let start = Instant::now();
    while client.link_state() != LinkState::InSession
        && start.elapsed() < Duration::from_millis(500)
    {
        client.request_join(0).unwrap();
        thread::sleep(Duration::from_millis(2));
        host.pump_lobby().unwrap();
        thread::sleep(Duration::from_millis(2));
        client.pump_lobby().unwrap();
    }
    assert_eq!(host.link_state(), LinkState::InSession);
    assert_eq!(client.link_state(), LinkState::InSession);

    let state = Snapshot {
        tick: 5.0,
        stage: 3,
        ..Snapshot::default()
    };
    host.host_tick(&state).unwrap();

    let start = Instant::now();
    let mut applied = 0;
    while applied == 0 && start.elapsed() < Duration::from_millis(500) {
        applied = client.client_tick(InputFlags::UP).unwrap().applied;
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(applied, 1);
    assert_eq!(client.mirror().map(|m| m.stage), Some(3));

    let start = Instant::now();
    let mut input = InputFlags::empty();
    while input.is_empty() && start.elapsed() < Duration::from_millis(500) {
        input = host.host_tick(&state).unwrap().input;
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(input, InputFlags::UP);
}

#[test]
fn bind_conflict_is_reported() {
    let port = next_port();
    let _first = bind(port);
    let second = UdpEndpoint::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
    assert!(matches!(
        second,
        Err(bc4000::TransportError::Bind { port: p, .. }) if p == port
    ));
}

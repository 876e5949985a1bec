// End-to-end test for the relay.
//
// Serves the router on an ephemeral port and connects real websocket
// clients, checking what each client's replica cache ends up holding.

use std::net::SocketAddr;
use std::time::Duration;

use flappy_online::config::Config;
use flappy_online::ws::protocol::{Record, User};
use flappy_online::{Relay, RelayClient};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;

async fn start_relay() -> (Relay, SocketAddr, JoinHandle<()>) {
    let relay = Relay::start(Config::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = relay.router();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (relay, addr, server)
}

async fn connect(addr: SocketAddr) -> RelayClient {
    RelayClient::connect(&format!("ws://{addr}/ws")).await.unwrap()
}

/// Poll `check` for up to two seconds, running `nudge` before each attempt
async fn eventually(mut nudge: impl FnMut(), check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        nudge();
        if check() {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

fn flying(name: &str, x16: i32) -> User {
    User {
        name: name.to_string(),
        x16,
        y16: 1600,
        running: true,
        ..Default::default()
    }
}

fn crashed(name: &str, score: i32) -> User {
    User {
        name: name.to_string(),
        x16: 9000,
        y16: 6000,
        running: false,
        score,
        ..Default::default()
    }
}

#[tokio::test]
async fn updates_standings_and_leaves_reach_other_clients() {
    let (relay, addr, server) = start_relay().await;

    let alice = connect(addr).await;
    let bob = connect(addr).await;

    // Alice's session may be forwarding before Bob's has joined; resend.
    assert!(
        eventually(
            || alice.send_update(flying("alice", 320)),
            || bob.list_replicas().iter().any(|r| r.name == "alice"),
        )
        .await,
        "bob never saw alice"
    );

    let replica = bob
        .list_replicas()
        .into_iter()
        .find(|r| r.name == "alice")
        .unwrap();
    assert!(!replica.id.is_empty());
    assert!(replica.running);
    assert_eq!(replica.x16, 320);

    // Own updates are not echoed back into Alice's cache
    assert!(alice.list_replicas().is_empty());

    alice.send_update(crashed("alice", 7));
    let expected = vec![Record::new("alice", 7)];
    assert!(eventually(|| {}, || bob.leaderboard() == expected).await);
    assert!(eventually(|| {}, || alice.leaderboard() == expected).await);
    assert!(eventually(
        || {},
        || bob.list_replicas().iter().any(|r| r.name == "alice" && !r.running),
    )
    .await);

    // A late joiner gets the current standing without any new score
    let carol = connect(addr).await;
    assert!(eventually(|| {}, || carol.leaderboard() == expected).await);
    assert!(carol.list_replicas().is_empty());

    alice.close().await;
    assert!(
        eventually(|| {}, || bob.list_replicas().is_empty()).await,
        "alice's leave never reached bob"
    );
    assert!(bob.is_connected());

    bob.close().await;
    carol.close().await;
    relay.shutdown().await;
    server.abort();
}

#[tokio::test]
async fn replicas_stay_frozen_after_the_relay_goes_away() {
    let (relay, addr, server) = start_relay().await;

    let sender = connect(addr).await;
    let watcher = connect(addr).await;

    assert!(eventually(
        || sender.send_update(flying("x", 64)),
        || watcher.list_replicas().len() == 1,
    )
    .await);

    // Closing the hub ends every session and drops their sockets
    relay.shutdown().await;
    server.abort();

    assert!(
        eventually(|| {}, || !watcher.is_connected()).await,
        "watcher never noticed the disconnect"
    );

    let replicas = watcher.list_replicas();
    assert_eq!(replicas.len(), 1);
    assert_eq!(replicas[0].name, "x");
    assert!(replicas[0].running);

    // Sending after the connection died is silently dropped
    sender.send_update(flying("x", 128));
    watcher.close().await;
    sender.close().await;
}

#[tokio::test]
async fn finished_runs_rank_across_clients() {
    let (relay, addr, server) = start_relay().await;

    let players = [("Alice", 10), ("Bob", 30), ("Carol", 10)];
    let mut clients = Vec::new();
    for _ in &players {
        clients.push(connect(addr).await);
    }
    let observer = connect(addr).await;

    // Make sure every session has joined before scores are sent
    for (client, (name, _)) in clients.iter().zip(players.iter()) {
        assert!(eventually(
            || client.send_update(flying(name, 0)),
            || observer.list_replicas().iter().any(|r| r.name == *name),
        )
        .await);
    }

    let mut expected = Vec::new();
    for (client, (name, score)) in clients.iter().zip(players.iter()) {
        client.send_update(crashed(name, *score));
        expected.push(Record::new(*name, *score));
        expected.sort_by(|a, b| b.score.cmp(&a.score));
        assert!(
            eventually(|| {}, || observer.leaderboard() == expected).await,
            "standing never became {expected:?}"
        );
    }

    assert_eq!(
        observer.leaderboard(),
        vec![
            Record::new("Bob", 30),
            Record::new("Alice", 10),
            Record::new("Carol", 10)
        ]
    );

    for client in clients {
        client.close().await;
    }
    observer.close().await;
    relay.shutdown().await;
    server.abort();
}

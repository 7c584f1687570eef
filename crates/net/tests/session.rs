use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai::SearchConfig;
use engine::{Board, Move, BLACK, WHITE};
use net::session::SNAPSHOT_LOG_LINES;
use net::{ChannelError, Frame, GameSnapshot, SessionCommand, SessionConfig, SessionEvent, SessionHandle, TokenError};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Writer whose output the test can read back.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn mv(text: &str) -> Move {
    net::decode(text).unwrap()
}

fn remote(text: &str) -> SessionCommand {
    SessionCommand::Remote(Frame::Line(text.to_string()))
}

fn wait_for(handle: &SessionHandle, done: impl Fn(&GameSnapshot) -> bool) -> GameSnapshot {
    loop {
        match handle.events().recv_timeout(TIMEOUT).expect("session went quiet") {
            SessionEvent::Updated(snapshot) if done(snapshot.as_ref()) => return *snapshot,
            SessionEvent::Closed => panic!("session closed"),
            _ => {}
        }
    }
}

fn next_rejection(handle: &SessionHandle) -> (String, ChannelError) {
    loop {
        match handle.events().recv_timeout(TIMEOUT).expect("session went quiet") {
            SessionEvent::Rejected { what, reason } => return (what, reason),
            SessionEvent::Closed => panic!("session closed"),
            SessionEvent::Updated(_) => {}
        }
    }
}

fn white_session() -> (SessionHandle, SharedBuf) {
    let handle = SessionHandle::spawn(SessionConfig::default()).unwrap();
    let peer = SharedBuf::default();
    handle.send(SessionCommand::AttachPeer(Box::new(peer.clone()))).unwrap();
    wait_for(&handle, |snapshot| snapshot.peer_connected);
    (handle, peer)
}

#[test]
fn local_move_is_applied_and_sent_to_the_peer() {
    let (handle, peer) = white_session();

    handle.play(mv("e2e4")).unwrap();
    let snapshot = wait_for(&handle, |snapshot| !snapshot.moves.is_empty());

    assert_eq!(snapshot.moves, vec![mv("e2e4")]);
    assert_eq!(snapshot.last_move, Some(mv("e2e4")));
    assert_eq!(snapshot.side_to_move(), BLACK);
    assert_eq!(peer.lines(), vec!["e2e4"]);
    assert!(snapshot.log.iter().any(|line| line.contains("1. e2e4 (local move")));
}

#[test]
fn moves_out_of_turn_are_rejected_without_changing_the_board() {
    let (handle, _peer) = white_session();

    handle.play(mv("e2e4")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 1);

    handle.play(mv("d2d4")).unwrap();
    let (what, reason) = next_rejection(&handle);
    assert_eq!(what, "d2d4");
    assert!(matches!(reason, ChannelError::NotYourTurn));

    handle.send(remote("e7e5")).unwrap();
    let snapshot = wait_for(&handle, |snapshot| snapshot.moves.len() == 2);
    assert_eq!(snapshot.side_to_move(), WHITE);

    handle.send(remote("d7d5")).unwrap();
    let (_, reason) = next_rejection(&handle);
    assert!(matches!(reason, ChannelError::OutOfTurn));
}

#[test]
fn bad_remote_input_is_reported_and_play_continues() {
    let (handle, _peer) = white_session();
    handle.play(mv("e2e4")).unwrap();

    handle.send(remote("zzzz")).unwrap();
    let (what, reason) = next_rejection(&handle);
    assert_eq!(what, "zzzz");
    assert!(matches!(reason, ChannelError::Decode(TokenError::Square(_))));

    handle.send(remote("e7e4")).unwrap();
    let (_, reason) = next_rejection(&handle);
    assert!(matches!(reason, ChannelError::Illegal(_)));

    handle.send(SessionCommand::Remote(Frame::Oversized(40))).unwrap();
    let (_, reason) = next_rejection(&handle);
    assert!(matches!(reason, ChannelError::Decode(TokenError::Oversized(40))));

    handle.send(remote("e7e5")).unwrap();
    let snapshot = wait_for(&handle, |snapshot| snapshot.moves.len() == 2);
    assert_eq!(snapshot.last_move, Some(mv("e7e5")));
}

#[test]
fn viewers_catch_up_and_get_every_move() {
    let (handle, peer) = white_session();
    handle.play(mv("e2e4")).unwrap();
    handle.send(remote("e7e5")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 2);

    let viewer = SharedBuf::default();
    handle.send(SessionCommand::AddViewer(Box::new(viewer.clone()))).unwrap();
    wait_for(&handle, |snapshot| snapshot.viewers == 1);
    assert_eq!(viewer.lines(), vec!["e2e4", "e7e5"]);

    handle.play(mv("g1f3")).unwrap();
    handle.send(remote("b8c6")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 4);

    assert_eq!(viewer.lines(), vec!["e2e4", "e7e5", "g1f3", "b8c6"]);
    // the opponent is never echoed its own moves
    assert_eq!(peer.lines(), vec!["e2e4", "g1f3"]);
}

#[test]
fn dead_viewers_are_dropped() {
    let (handle, _peer) = white_session();
    handle.send(SessionCommand::AddViewer(Box::new(SharedBuf::default()))).unwrap();
    handle.send(SessionCommand::AddViewer(Box::new(BrokenPipe))).unwrap();
    wait_for(&handle, |snapshot| snapshot.viewers == 2);

    // the broken one is only noticed when a move is sent
    handle.play(mv("e2e4")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 1 && snapshot.viewers == 1);

    handle.send(remote("e7e5")).unwrap();
    handle.send(SessionCommand::AddViewer(Box::new(SharedBuf::default()))).unwrap();
    let snapshot = wait_for(&handle, |snapshot| snapshot.viewers == 2);
    assert_eq!(snapshot.moves.len(), 2);
}

#[test]
fn admitted_player_is_sent_the_game_then_ready() {
    let (handle, _first) = white_session();
    handle.play(mv("e2e4")).unwrap();
    handle.send(remote("e7e5")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 2);

    let newcomer = SharedBuf::default();
    handle.send(SessionCommand::AdmitPlayer(Box::new(newcomer.clone()))).unwrap();
    wait_for(&handle, |snapshot| {
        snapshot.log.iter().filter(|line| line.contains("Opponent connected")).count() == 2
    });
    assert_eq!(newcomer.lines(), vec!["e2e4", "e7e5", "ready"]);

    handle.play(mv("g1f3")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 3);
    assert_eq!(newcomer.lines(), vec!["e2e4", "e7e5", "ready", "g1f3"]);
}

#[test]
fn resumed_moves_replay_both_sides_once() {
    let handle = SessionHandle::spawn(SessionConfig {
        local_color: Some(BLACK),
        requires_peer: true,
        ..SessionConfig::default()
    })
    .unwrap();

    handle
        .send(SessionCommand::Resume(vec![mv("e2e4"), mv("e7e5"), mv("g1f3")]))
        .unwrap();
    let snapshot = wait_for(&handle, |snapshot| snapshot.moves.len() == 3);
    assert_eq!(snapshot.side_to_move(), BLACK);
    assert!(snapshot.log.iter().any(|line| line.contains("3. g1f3 (remote move")));

    let host = SharedBuf::default();
    handle.send(SessionCommand::AttachPeer(Box::new(host.clone()))).unwrap();
    handle.play(mv("b8c6")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 4);
    assert_eq!(host.lines(), vec!["b8c6"]);

    handle.send(SessionCommand::Resume(vec![mv("a2a3")])).unwrap();
    let (_, reason) = next_rejection(&handle);
    assert!(matches!(reason, ChannelError::Handshake(_)));
}

#[test]
fn snapshots_carry_the_latest_log_lines() {
    let (handle, _peer) = white_session();
    for _ in 0..SNAPSHOT_LOG_LINES {
        handle.send(remote("a7a6")).unwrap();
    }
    handle.send(remote("h7h6")).unwrap();

    let snapshot = wait_for(&handle, |snapshot| {
        snapshot.log.last().is_some_and(|line| line.contains("rejected h7h6"))
    });
    assert_eq!(snapshot.log.len(), SNAPSHOT_LOG_LINES);
}

#[test]
fn local_moves_wait_for_an_opponent_when_required() {
    let handle = SessionHandle::spawn(SessionConfig {
        requires_peer: true,
        ..SessionConfig::default()
    })
    .unwrap();

    handle.play(mv("e2e4")).unwrap();
    let (_, reason) = next_rejection(&handle);
    assert!(matches!(reason, ChannelError::Disconnected));

    handle.send(SessionCommand::AttachPeer(Box::new(SharedBuf::default()))).unwrap();
    handle.play(mv("e2e4")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 1);

    handle.send(SessionCommand::PeerDisconnected).unwrap();
    let snapshot = wait_for(&handle, |snapshot| !snapshot.peer_connected);
    assert!(snapshot.log.iter().any(|line| line.contains("Opponent disconnected")));
}

#[test]
fn engine_answers_local_moves() {
    let handle = SessionHandle::spawn(SessionConfig {
        local_color: Some(WHITE),
        engine_color: Some(BLACK),
        search: SearchConfig { depth: 1, ..SearchConfig::default() },
        ..SessionConfig::default()
    })
    .unwrap();

    handle.play(mv("e2e4")).unwrap();
    let snapshot = wait_for(&handle, |snapshot| snapshot.moves.len() == 2);
    assert_eq!(snapshot.side_to_move(), WHITE);
    assert!(snapshot.log.iter().any(|line| line.contains("2. ") && line.contains("engine move")));

    // there is no network opponent in an engine game
    handle.play(mv("d2d4")).unwrap();
    wait_for(&handle, |snapshot| snapshot.moves.len() == 4);
    handle.send(remote("a2a3")).unwrap();
    let (_, reason) = next_rejection(&handle);
    assert!(matches!(reason, ChannelError::OutOfTurn));
}

#[test]
fn engine_playing_white_moves_first_and_wins_material() {
    // Black's queen hangs to the rook
    let board = Board::from_fen("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1").unwrap();
    let handle = SessionHandle::spawn(SessionConfig {
        local_color: Some(BLACK),
        engine_color: Some(WHITE),
        search: SearchConfig { depth: 2, ..SearchConfig::default() },
        board,
        ..SessionConfig::default()
    })
    .unwrap();

    let snapshot = wait_for(&handle, |snapshot| snapshot.moves.len() == 1);
    assert_eq!(snapshot.last_move, Some(mv("d2d5")));
    assert_eq!(snapshot.side_to_move(), BLACK);
}

#[test]
fn watching_accepts_both_sides_from_the_host() {
    let handle = SessionHandle::spawn(SessionConfig {
        local_color: None,
        ..SessionConfig::default()
    })
    .unwrap();

    for token in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        handle.send(remote(token)).unwrap();
    }
    let snapshot = wait_for(&handle, |snapshot| snapshot.moves.len() == 4);
    assert!(snapshot.status.is_over());
    assert!(snapshot.log.iter().any(|line| line.contains("checkmate, Black wins")));

    handle.play(mv("e1f2")).unwrap();
    let (_, reason) = next_rejection(&handle);
    assert!(matches!(reason, ChannelError::NotYourTurn));
}

#[test]
fn shutdown_closes_the_event_stream() {
    let handle = SessionHandle::spawn(SessionConfig::default()).unwrap();
    let events = handle.events().clone();
    handle.shutdown();

    let closed = events.try_iter().any(|event| matches!(event, SessionEvent::Closed));
    assert!(closed);
}

//! The game session: one thread that owns the board.
//!
//! Local input, moves from the network and engine searches all reach the
//! board through this thread, one command at a time, so a search can never
//! observe a half-applied move from somewhere else.

use std::io::Write;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use ai::{SearchConfig, SearchEngine};
use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};
use engine::{color_name, opposite_color, Board, DrawReason, GameLog, GameStatus, Move, MoveSource, WHITE};

use crate::error::ChannelError;
use crate::token;
use crate::wire::{self, Frame};

pub type PeerWriter = Box<dyn Write + Send>;

/// Game log lines carried by each snapshot.
pub const SNAPSHOT_LOG_LINES: usize = 200;

pub enum SessionCommand {
    /// A move made on this machine's board.
    LocalMove(Move),
    /// A frame read from the opponent (or, when watching, from the host).
    Remote(Frame),
    /// Where our moves go. Replaces any previous peer.
    AttachPeer(PeerWriter),
    /// An opponent who connected to us. It is sent the moves played so far
    /// and `ready`, then becomes the peer.
    AdmitPlayer(PeerWriter),
    /// Moves a host replayed when we joined its game. Only accepted before
    /// any move has been played here.
    Resume(Vec<Move>),
    /// A spectator connection. It is sent the game so far, then every move.
    AddViewer(PeerWriter),
    PeerDisconnected,
    Shutdown,
}

/// Read-only view of the game published after every change.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub board: Board,
    pub moves: Vec<Move>,
    pub status: GameStatus,
    pub last_move: Option<Move>,
    pub log: Vec<String>,
    pub peer_connected: bool,
    pub viewers: usize,
}

impl GameSnapshot {
    pub fn side_to_move(&self) -> u8 {
        self.board.current_turn
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    Updated(Box<GameSnapshot>),
    Rejected { what: String, reason: ChannelError },
    Closed,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Colour moved from this machine's board, `None` when only watching.
    pub local_color: Option<u8>,
    /// Colour played by the search engine inside the session.
    pub engine_color: Option<u8>,
    pub search: SearchConfig,
    /// Local moves wait until an opponent is attached.
    pub requires_peer: bool,
    pub board: Board,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            local_color: Some(WHITE),
            engine_color: None,
            search: SearchConfig::default(),
            requires_peer: false,
            board: Board::new(),
        }
    }
}

pub struct SessionHandle {
    commands: Sender<SessionCommand>,
    events: Receiver<SessionEvent>,
    thread: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn spawn(config: SessionConfig) -> Result<Self, ChannelError> {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        let session = Session::new(config, command_rx, event_tx);
        let thread = thread::Builder::new()
            .name("game-session".into())
            .spawn(move || session.run())?;

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            thread: Some(thread),
        })
    }

    /// Sender for receiver threads and the network layer.
    pub fn commands(&self) -> Sender<SessionCommand> {
        self.commands.clone()
    }

    pub fn send(&self, command: SessionCommand) -> Result<(), ChannelError> {
        self.commands.send(command).map_err(|_| ChannelError::SessionClosed)
    }

    pub fn play(&self, mv: Move) -> Result<(), ChannelError> {
        self.send(SessionCommand::LocalMove(mv))
    }

    /// Events published since the last call, without blocking.
    pub fn poll_events(&self) -> TryIter<'_, SessionEvent> {
        self.events.try_iter()
    }

    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Stops the session thread and waits for it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("game session thread panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Session {
    board: Board,
    moves: Vec<Move>,
    game_log: GameLog,
    local_color: Option<u8>,
    engine_color: Option<u8>,
    requires_peer: bool,
    search: SearchEngine,
    peer: Option<PeerWriter>,
    viewers: Vec<PeerWriter>,
    turn_started: Instant,
    commands: Receiver<SessionCommand>,
    events: Sender<SessionEvent>,
}

impl Session {
    fn new(config: SessionConfig, commands: Receiver<SessionCommand>, events: Sender<SessionEvent>) -> Self {
        let mut game_log = GameLog::new();
        match config.local_color {
            Some(color) => game_log.log(&format!("Playing as {}", color_name(color))),
            None => game_log.log("Watching"),
        }
        if let Some(color) = config.engine_color {
            game_log.log(&format!("Engine plays {} at depth {}", color_name(color), config.search.depth));
        }

        Self {
            board: config.board,
            moves: Vec::new(),
            game_log,
            local_color: config.local_color,
            engine_color: config.engine_color,
            requires_peer: config.requires_peer,
            search: SearchEngine::new(config.search),
            peer: None,
            viewers: Vec::new(),
            turn_started: Instant::now(),
            commands,
            events,
        }
    }

    fn run(mut self) {
        self.publish();
        self.play_engine_moves();

        while let Ok(command) = self.commands.recv() {
            match command {
                SessionCommand::LocalMove(mv) => self.handle_local(mv),
                SessionCommand::Remote(frame) => self.handle_remote(frame),
                SessionCommand::AttachPeer(writer) => self.attach_peer(writer),
                SessionCommand::AdmitPlayer(writer) => self.admit_player(writer),
                SessionCommand::Resume(moves) => self.resume(moves),
                SessionCommand::AddViewer(writer) => self.add_viewer(writer),
                SessionCommand::PeerDisconnected => {
                    self.peer = None;
                    self.game_log.log("Opponent disconnected");
                    self.publish();
                }
                SessionCommand::Shutdown => break,
            }
            self.play_engine_moves();
        }

        log::debug!("game session stopped after {} moves", self.moves.len());
        let _ = self.events.send(SessionEvent::Closed);
    }

    fn handle_local(&mut self, mv: Move) {
        let result = self.check_local_turn().and_then(|()| self.apply(mv, MoveSource::Local));
        if let Err(reason) = result {
            self.reject(mv.to_string(), reason);
        }
    }

    fn check_local_turn(&self) -> Result<(), ChannelError> {
        if self.local_color != Some(self.board.current_turn) {
            return Err(ChannelError::NotYourTurn);
        }
        if self.requires_peer && self.peer.is_none() {
            return Err(ChannelError::Disconnected);
        }
        Ok(())
    }

    fn handle_remote(&mut self, frame: Frame) {
        let line = match frame {
            Frame::Line(line) => line,
            Frame::Oversized(len) => {
                self.reject(format!("<{len} bytes>"), token::TokenError::Oversized(len).into());
                return;
            }
        };

        let turn = Some(self.board.current_turn);
        let result = if turn == self.local_color || turn == self.engine_color {
            Err(ChannelError::OutOfTurn)
        } else {
            token::decode(&line)
                .map_err(ChannelError::from)
                .and_then(|mv| self.apply(mv, MoveSource::Remote))
        };

        if let Err(reason) = result {
            self.reject(line, reason);
        }
    }

    fn apply(&mut self, mv: Move, source: MoveSource) -> Result<(), ChannelError> {
        self.board.try_make_move(mv)?;
        self.moves.push(mv);

        let think_ms = self.turn_started.elapsed().as_millis() as u64;
        self.turn_started = Instant::now();
        self.game_log.log_move(mv, source, think_ms);

        self.broadcast(mv, source);
        self.after_move();
        Ok(())
    }

    fn play_engine_moves(&mut self) {
        while self.engine_color == Some(self.board.current_turn) && !self.board.is_game_over() {
            let maximizing = self.board.current_turn == WHITE;
            let result = self.search.search_default(&mut self.board, maximizing);

            let Some(mv) = result.best_move else {
                log::warn!("engine found no move in {}", self.board.to_fen());
                return;
            };
            if let Err(err) = self.board.try_make_move(mv) {
                log::error!("engine chose {mv}: {err}");
                return;
            }
            self.moves.push(mv);

            let think_ms = self.turn_started.elapsed().as_millis() as u64;
            self.turn_started = Instant::now();
            self.game_log.log_engine_move(mv, think_ms, result.score, result.stats.nodes);

            self.broadcast(mv, MoveSource::Engine);
            self.after_move();
        }
    }

    fn after_move(&mut self) {
        let status = self.board.game_status();
        if status.is_over() {
            self.game_log.log(&format!("Game over: {}", describe_status(status)));
        }
        self.publish();
    }

    /// Our own moves go to the opponent and the viewers, the opponent's only
    /// to the viewers.
    fn broadcast(&mut self, mv: Move, source: MoveSource) {
        let line = token::encode(mv);

        if source != MoveSource::Remote {
            if let Some(peer) = self.peer.as_mut() {
                if let Err(err) = wire::write_line(peer, &line) {
                    log::warn!("lost opponent while sending {line}: {err}");
                    self.peer = None;
                    self.game_log.log("Opponent disconnected");
                }
            }
        }

        let before = self.viewers.len();
        self.viewers.retain_mut(|viewer| wire::write_line(viewer, &line).is_ok());
        if self.viewers.len() < before {
            log::info!("dropped {} viewer(s)", before - self.viewers.len());
        }
    }

    fn attach_peer(&mut self, writer: PeerWriter) {
        if self.peer.replace(writer).is_some() {
            log::warn!("replacing the connected opponent");
        }
        self.game_log.log("Opponent connected");
        self.publish();
    }

    fn admit_player(&mut self, mut writer: PeerWriter) {
        let caught_up = self
            .moves
            .iter()
            .try_for_each(|&mv| wire::write_line(&mut writer, &token::encode(mv)))
            .and_then(|()| wire::write_line(&mut writer, wire::READY));

        match caught_up {
            Ok(()) => self.attach_peer(writer),
            Err(err) => log::warn!("opponent left during catch-up: {err}"),
        }
    }

    fn resume(&mut self, moves: Vec<Move>) {
        if !self.moves.is_empty() {
            let reason = ChannelError::Handshake(format!("cannot resume, {} moves already played", self.moves.len()));
            self.reject(format!("{} replayed moves", moves.len()), reason);
            return;
        }

        for mv in moves {
            if let Err(err) = self.board.try_make_move(mv) {
                self.reject(mv.to_string(), err.into());
                return;
            }
            self.moves.push(mv);
            self.game_log.log_move(mv, MoveSource::Remote, 0);
        }
        self.turn_started = Instant::now();
        self.after_move();
    }

    fn add_viewer(&mut self, mut writer: PeerWriter) {
        let caught_up = self
            .moves
            .iter()
            .try_for_each(|&mv| wire::write_line(&mut writer, &token::encode(mv)));

        match caught_up {
            Ok(()) => {
                self.viewers.push(writer);
                self.game_log.log(&format!("Viewer joined ({} watching)", self.viewers.len()));
            }
            Err(err) => log::warn!("viewer left during catch-up: {err}"),
        }
        self.publish();
    }

    fn reject(&mut self, what: String, reason: ChannelError) {
        self.game_log.log_rejected(&what, &reason.to_string());
        let _ = self.events.send(SessionEvent::Rejected { what, reason });
        self.publish();
    }

    fn publish(&self) {
        let snapshot = GameSnapshot {
            board: self.board.clone(),
            moves: self.moves.clone(),
            status: self.board.game_status(),
            last_move: self.moves.last().copied(),
            log: self.game_log.tail(SNAPSHOT_LOG_LINES).to_vec(),
            peer_connected: self.peer.is_some(),
            viewers: self.viewers.len(),
        };
        if self.events.send(SessionEvent::Updated(Box::new(snapshot))).is_err() {
            log::trace!("no one is listening for session events");
        }
    }
}

pub fn describe_status(status: GameStatus) -> String {
    match status {
        GameStatus::InProgress => "in progress".to_string(),
        GameStatus::Check(color) => format!("{} is in check", color_name(color)),
        GameStatus::Checkmate(color) => format!("checkmate, {} wins", color_name(opposite_color(color))),
        GameStatus::Stalemate => "stalemate".to_string(),
        GameStatus::Draw(DrawReason::InsufficientMaterial) => "draw by insufficient material".to_string(),
        GameStatus::Draw(DrawReason::SeventyFiveMoves) => "draw by the 75-move rule".to_string(),
        GameStatus::Draw(DrawReason::FivefoldRepetition) => "draw by fivefold repetition".to_string(),
    }
}

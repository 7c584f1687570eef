use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use crate::error::ChannelError;
use crate::peer::spawn_receiver;
use crate::session::SessionCommand;
use crate::wire::{self, FrameReader, Role};

pub const DEFAULT_PORT: u16 = 5555;

/// Listening side of a game. Accepts one player and any number of viewers.
pub struct Host {
    listener: TcpListener,
}

impl Host {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, ChannelError> {
        let listener = TcpListener::bind(addr)?;
        log::info!("hosting on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChannelError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections on a background thread for as long as the
    /// session is running.
    pub fn serve(self, commands: Sender<SessionCommand>) -> Result<JoinHandle<()>, ChannelError> {
        let handle = thread::Builder::new()
            .name("host-accept".into())
            .spawn(move || self.accept_loop(commands))?;
        Ok(handle)
    }

    /// Each connection is admitted on its own thread, so a client that never
    /// says hello holds up nobody else.
    fn accept_loop(self, commands: Sender<SessionCommand>) {
        let player_connected = Arc::new(AtomicBool::new(false));
        let session_gone = Arc::new(AtomicBool::new(false));

        for stream in self.listener.incoming() {
            if session_gone.load(Ordering::SeqCst) {
                log::debug!("session gone, no longer accepting");
                return;
            }
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    log::warn!("accept failed: {err}");
                    continue;
                }
            };

            let commands = commands.clone();
            let player_connected = Arc::clone(&player_connected);
            let session_gone = Arc::clone(&session_gone);
            let spawned = thread::Builder::new().name("host-admit".into()).spawn(move || {
                match admit(stream, &commands, &player_connected) {
                    Ok(()) => {}
                    Err(ChannelError::SessionClosed) => session_gone.store(true, Ordering::SeqCst),
                    Err(err) => log::warn!("refused connection: {err}"),
                }
            });
            if let Err(err) = spawned {
                log::warn!("cannot admit connection: {err}");
            }
        }
    }
}

/// Reads the hello line and hands the connection to the session.
fn admit(stream: TcpStream, commands: &Sender<SessionCommand>, player_connected: &Arc<AtomicBool>) -> Result<(), ChannelError> {
    let addr = stream.peer_addr()?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(wire::HANDSHAKE_TIMEOUT))?;
    let mut frames = FrameReader::new(BufReader::new(stream.try_clone()?));
    let role = wire::read_hello(&mut frames)?;
    stream.set_read_timeout(None)?;

    match role {
        Role::Viewer => {
            log::info!("viewer connected from {addr}");
            commands
                .send(SessionCommand::AddViewer(Box::new(stream)))
                .map_err(|_| ChannelError::SessionClosed)
        }
        Role::Player => {
            if player_connected.swap(true, Ordering::SeqCst) {
                let mut stream = stream;
                let _ = wire::write_line(&mut stream, wire::BUSY);
                return Err(ChannelError::Handshake(format!("second player from {addr}")));
            }
            log::info!("opponent connected from {addr}");

            commands
                .send(SessionCommand::AdmitPlayer(Box::new(stream)))
                .map_err(|_| ChannelError::SessionClosed)?;

            // the hello may have been read together with the first moves
            let slot = Arc::clone(player_connected);
            spawn_receiver(&addr.to_string(), frames.into_inner(), commands.clone(), move || {
                slot.store(false, Ordering::SeqCst);
            })?;
            Ok(())
        }
    }
}

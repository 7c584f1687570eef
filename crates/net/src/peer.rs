use std::io::{BufReader, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use crate::error::ChannelError;
use crate::session::SessionCommand;
use crate::wire::{self, FrameReader, Role};

/// Reads frames from `stream` on its own thread and forwards them to the
/// session. At end of stream or on a read error it reports
/// `PeerDisconnected`, runs `on_close` and exits.
pub fn spawn_receiver<R, F>(
    name: &str,
    stream: R,
    commands: Sender<SessionCommand>,
    on_close: F,
) -> Result<JoinHandle<()>, ChannelError>
where
    R: Read + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    let thread_name = format!("recv-{name}");
    let handle = thread::Builder::new().name(thread_name).spawn(move || {
        receive_frames(FrameReader::new(BufReader::new(stream)), &commands);
        // before the session hears of it, so a replacement can connect at once
        on_close();
        let _ = commands.send(SessionCommand::PeerDisconnected);
    })?;
    Ok(handle)
}

fn receive_frames<R: Read>(mut frames: FrameReader<BufReader<R>>, commands: &Sender<SessionCommand>) {
    loop {
        match frames.next_frame() {
            Ok(Some(frame)) => {
                log::debug!("received {frame:?}");
                if commands.send(SessionCommand::Remote(frame)).is_err() {
                    log::debug!("session gone, receiver exiting");
                    return;
                }
            }
            Ok(None) => {
                log::info!("connection closed by the other side");
                break;
            }
            Err(err) => {
                log::warn!("read failed: {err}");
                break;
            }
        }
    }
}

/// Opens a connection to a host and announces our role.
pub fn connect<A: ToSocketAddrs>(addr: A, role: Role) -> Result<TcpStream, ChannelError> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    wire::write_hello(&mut stream, role)?;
    log::info!("connected to {} as {}", stream.peer_addr()?, role.as_str());
    Ok(stream)
}

/// Joins a hosted game as its second player. The moves the host has
/// already played are replayed into the session first; after that our
/// moves are written to the host and the host's moves are fed to the
/// session.
pub fn join<A: ToSocketAddrs>(addr: A, commands: Sender<SessionCommand>) -> Result<JoinHandle<()>, ChannelError> {
    let stream = connect(addr, Role::Player)?;
    stream.set_read_timeout(Some(wire::HANDSHAKE_TIMEOUT))?;
    let mut frames = FrameReader::new(BufReader::new(stream.try_clone()?));
    let history = wire::read_catch_up(&mut frames)?;
    stream.set_read_timeout(None)?;

    if !history.is_empty() {
        log::info!("resuming a game {} moves in", history.len());
        commands
            .send(SessionCommand::Resume(history))
            .map_err(|_| ChannelError::SessionClosed)?;
    }
    commands
        .send(SessionCommand::AttachPeer(Box::new(stream)))
        .map_err(|_| ChannelError::SessionClosed)?;
    // live moves may already sit in the buffer behind `ready`
    spawn_receiver("host", frames.into_inner(), commands, || {})
}

/// Follows a hosted game without playing. Nothing is ever written back.
pub fn watch<A: ToSocketAddrs>(addr: A, commands: Sender<SessionCommand>) -> Result<JoinHandle<()>, ChannelError> {
    let stream = connect(addr, Role::Viewer)?;
    spawn_receiver("host", stream, commands, || {})
}

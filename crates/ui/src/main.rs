mod app;
mod settings;

use std::path::PathBuf;

use anyhow::Context;
use app::ChessApp;
use clap::{Parser, ValueEnum};
use engine::{opposite_color, BLACK, WHITE};
use net::{peer, Host, SessionConfig, SessionHandle};
use settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Wait for an opponent and play White
    Host,
    /// Connect to a host and play Black
    Join,
    /// Follow a hosted game without playing
    Watch,
    /// Play against the built-in engine
    Engine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Color {
    White,
    Black,
}

#[derive(Parser, Debug)]
#[command(about = "Chess over the network or against the engine")]
struct Args {
    #[arg(long, value_enum, default_value_t = Mode::Engine)]
    mode: Mode,

    /// Address to bind when hosting, or to connect to otherwise
    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Your colour in engine mode
    #[arg(long, value_enum, default_value_t = Color::White)]
    color: Color,

    /// Engine difficulty, the search depth in plies
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=4))]
    depth: Option<u32>,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

/// A running game: the session plus what the window needs to know about it.
struct Game {
    session: SessionHandle,
    local_color: Option<u8>,
    networked: bool,
    title: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let game = start_game(&args, &settings)?;
    log::info!("{}", game.title);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_title(&game.title),
        ..Default::default()
    };

    let app = ChessApp::new(game.session, game.local_color, game.networked, game.title, settings.display);
    eframe::run_native("Chess", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|err| anyhow::anyhow!("window closed with an error: {err}"))
}

fn start_game(args: &Args, settings: &Settings) -> anyhow::Result<Game> {
    let port = args.port.unwrap_or(settings.network.port);

    match args.mode {
        Mode::Host => {
            let bind = args.address.clone().unwrap_or_else(|| settings.network.bind.clone());
            let host = Host::bind((bind.as_str(), port)).with_context(|| format!("cannot listen on {bind}:{port}"))?;
            let title = format!("Hosting on {}", host.local_addr()?);

            let session = SessionHandle::spawn(SessionConfig {
                local_color: Some(WHITE),
                requires_peer: true,
                ..SessionConfig::default()
            })?;
            host.serve(session.commands())?;
            Ok(Game {
                session,
                local_color: Some(WHITE),
                networked: true,
                title,
            })
        }
        Mode::Join => {
            let address = args.address.clone().unwrap_or_else(|| "127.0.0.1".to_string());
            let session = SessionHandle::spawn(SessionConfig {
                local_color: Some(BLACK),
                requires_peer: true,
                ..SessionConfig::default()
            })?;
            peer::join((address.as_str(), port), session.commands())
                .with_context(|| format!("cannot join {address}:{port}"))?;
            Ok(Game {
                session,
                local_color: Some(BLACK),
                networked: true,
                title: format!("Playing {address}:{port}"),
            })
        }
        Mode::Watch => {
            let address = args.address.clone().unwrap_or_else(|| "127.0.0.1".to_string());
            let session = SessionHandle::spawn(SessionConfig {
                local_color: None,
                ..SessionConfig::default()
            })?;
            peer::watch((address.as_str(), port), session.commands())
                .with_context(|| format!("cannot watch {address}:{port}"))?;
            Ok(Game {
                session,
                local_color: None,
                networked: true,
                title: format!("Watching {address}:{port}"),
            })
        }
        Mode::Engine => {
            let human = match args.color {
                Color::White => WHITE,
                Color::Black => BLACK,
            };
            let search = match args.depth {
                Some(level) => settings.search_config().with_difficulty(level),
                None => settings.search_config(),
            };

            let session = SessionHandle::spawn(SessionConfig {
                local_color: Some(human),
                engine_color: Some(opposite_color(human)),
                search,
                ..SessionConfig::default()
            })?;
            Ok(Game {
                session,
                local_color: Some(human),
                networked: false,
                title: format!("Against the engine (depth {})", search.depth),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_an_engine_game_as_white() {
        let args = Args::try_parse_from(["ui"]).unwrap();
        assert_eq!(args.mode, Mode::Engine);
        assert_eq!(args.color, Color::White);
        assert_eq!(args.depth, None);
        assert!(!args.verbose);
    }

    #[test]
    fn parses_network_flags() {
        let args = Args::try_parse_from(["ui", "--mode", "join", "--address", "10.0.0.2", "--port", "6000"]).unwrap();
        assert_eq!(args.mode, Mode::Join);
        assert_eq!(args.address.as_deref(), Some("10.0.0.2"));
        assert_eq!(args.port, Some(6000));
    }

    #[test]
    fn difficulty_is_limited_to_four() {
        assert!(Args::try_parse_from(["ui", "--depth", "4"]).is_ok());
        assert!(Args::try_parse_from(["ui", "--depth", "0"]).is_err());
        assert!(Args::try_parse_from(["ui", "--depth", "5"]).is_err());
    }

    #[test]
    fn engine_game_uses_the_depth_flag() {
        let args = Args::try_parse_from(["ui", "--color", "black", "--depth", "1"]).unwrap();
        let game = start_game(&args, &Settings::default()).unwrap();
        assert_eq!(game.local_color, Some(BLACK));
        assert!(game.title.contains("depth 1"));
        game.session.shutdown();
    }
}

mod config;
mod peer;
mod tui;

use std::io;
use std::net::Ipv4Addr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::HostConfig;
use mazewar::{PacketLossSimulation, PeerEvent};
use peer::{Command, MazePeer, describe_event};
use tui::{MazeView, PeerStatus, TuiState};

#[derive(Parser)]
#[command(name = "mazewar-peer")]
#[command(about = "Mazewar peer on a LAN multicast group")]
struct Args {
    #[arg(short, long, default_value_t = Ipv4Addr::new(224, 1, 1, 1))]
    group: Ipv4Addr,

    #[arg(short, long, default_value_t = 5001)]
    port: u16,

    #[arg(long, default_value_t = 1)]
    ttl: u32,

    #[arg(short, long, default_value = "rat")]
    name: String,

    #[arg(long, default_value_t = 24)]
    width: u16,

    #[arg(long, default_value_t = 32)]
    height: u16,

    #[arg(long, help = "Seed for spawn points and guids")]
    seed: Option<u64>,

    #[arg(long)]
    headless: bool,

    #[arg(long, help = "Let the peer wander and shoot on its own")]
    autopilot: bool,

    #[arg(long, help = "Enable outbound packet loss simulation")]
    simulate_packet_loss: bool,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,
}

impl Args {
    fn host_config(&self) -> HostConfig {
        HostConfig {
            group: self.group,
            port: self.port,
            ttl: self.ttl,
            name: self.name.clone(),
            maze_width: self.width,
            maze_height: self.height,
            seed: self.seed,
            autopilot: self.autopilot,
            packet_loss: self
                .simulate_packet_loss
                .then(|| PacketLossSimulation::new(self.loss_percent)),
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.host_config();

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut peer = MazePeer::new(&config)?;

    if args.headless {
        log::info!(
            "Peer {} listening on {} (group {})",
            peer.local_guid(),
            peer.local_addr(),
            config.group
        );
        peer.run();
        log::info!("Peer shutting down");
    } else {
        run_with_tui(&mut peer)?;
    }

    Ok(())
}

fn run_with_tui(peer: &mut MazePeer) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = peer.running();
    let mut tui_state = TuiState::new();
    let mut view = MazeView::new(peer.world().maze());

    tui_state.log_info(format!(
        "Peer {} listening on {}",
        peer.local_guid(),
        peer.local_addr()
    ));

    while running.load(Ordering::SeqCst) {
        peer.tick_once();

        for event in peer.drain_events() {
            if let PeerEvent::RatLeft { index, .. } = event {
                view.clear_score(index);
            }
            match event {
                PeerEvent::Tagged { .. } => tui_state.log_warn(describe_event(&event)),
                _ => tui_state.log_info(describe_event(&event)),
            }
        }

        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let command = match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::SeqCst);
                            None
                        }
                        KeyCode::Up | KeyCode::Char('w') => Some(Command::Forward),
                        KeyCode::Down | KeyCode::Char('s') => Some(Command::Backward),
                        KeyCode::Left | KeyCode::Char('a') => Some(Command::TurnLeft),
                        KeyCode::Right | KeyCode::Char('d') => Some(Command::TurnRight),
                        KeyCode::Char('r') => Some(Command::AboutFace),
                        KeyCode::Char(' ') => Some(Command::Fire),
                        _ => None,
                    };

                    if let Some(command) = command {
                        if let Err(e) = peer.command(command) {
                            tui_state.log_warn(format!("{:?}: {}", command, e));
                        }
                    }
                }
            }
        }

        peer.render(&mut view);
        let status = PeerStatus {
            phase: peer.world().phase(),
            local: peer.local_guid(),
            rat_count: peer.world().rat_count(),
            uptime: peer.uptime(),
            network: peer.stats(),
        };
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &view, &status);
        })?;
    }

    tui_state.log_info("Shutting down...");
    peer.shutdown();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}

mod config;
mod demo;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use bc4000::{
    Address, DatagramSocket, InputFlags, LanError, LanNode, LinkState, NodeEvent, TickClock,
    UdpEndpoint,
};
use clap::{Parser, Subcommand};

use config::NodeConfig;
use demo::{DemoWorld, scripted_input};

#[derive(Parser)]
#[command(name = "bc4000-node")]
#[command(about = "Headless LAN node for two-player tank battles")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    #[arg(short, long, global = true, help = "TOML file with node settings")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "LAN port [default: 5000]")]
    port: Option<u16>,

    #[arg(short, long, global = true, help = "Broadcast address [default: 255.255.255.255]")]
    broadcast: Option<Ipv4Addr>,

    #[arg(short, long, global = true, help = "Simulation ticks per second [default: 60]")]
    tick_rate: Option<u32>,

    #[arg(long, global = true, help = "Seconds of silence before a session drops [default: 5]")]
    idle_timeout_secs: Option<u64>,

    #[arg(long, global = true, help = "Stop after N ticks (0 = until timeout)")]
    ticks: Option<u64>,
}

impl Args {
    /// File settings (or defaults) with any flags given on the command line
    /// applied on top.
    fn node_config(&self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };

        if let Some(port) = self.port {
            config.lan.port = port;
            config.lan.broadcast = config.lan.broadcast.with_port(port);
        }
        if let Some(broadcast) = self.broadcast {
            config.lan.broadcast = Address::from(SocketAddrV4::new(broadcast, config.lan.port));
        }
        if let Some(tick_rate) = self.tick_rate {
            config.lan.tick_rate = tick_rate;
        }
        if let Some(secs) = self.idle_timeout_secs {
            config.lan.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(ticks) = self.ticks {
            config.ticks = (ticks > 0).then_some(ticks);
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Mode {
    /// Advertise a game and wait for one player to join
    Host,
    /// Discover games on the LAN and join one
    Join {
        #[arg(long, default_value_t = 0, help = "Index of the discovered host to join")]
        pick: usize,
    },
}

type Node = LanNode<UdpEndpoint>;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = args.node_config()?;

    let socket = UdpEndpoint::open(config.lan.port)
        .with_context(|| format!("cannot open LAN port {}", config.lan.port))?;
    let mut node = LanNode::new(socket, config.lan.clone());

    match args.mode {
        Mode::Host => run_host(&mut node, &config)?,
        Mode::Join { pick } => run_client(&mut node, &config, pick)?,
    }

    log::info!("Node shutting down");
    Ok(())
}

fn run_host(node: &mut Node, config: &NodeConfig) -> Result<()> {
    node.start_hosting()?;
    log::info!("Waiting for a player on port {}", config.lan.port);

    while node.link_state() != LinkState::InSession {
        node.pump_lobby()?;
        thread::sleep(config.poll_interval);
    }

    let mut world = DemoWorld::new();
    let mut remote_input = InputFlags::empty();

    run_ticks(node, config, |node, clock, steps| {
        world.step(clock.tick(), clock.dt() as f32, [InputFlags::empty(), remote_input]);
        let report = node.host_tick(world.snapshot())?;
        remote_input = report.input;

        if steps % u64::from(clock.tick_rate()) == 0 {
            log::info!(
                "tick {} | client input {:?} | snapshots sent {}",
                clock.tick(),
                report.input,
                node.endpoint().socket().stats().packets_sent
            );
        }
        Ok(())
    })
}

fn run_client(node: &mut Node, config: &NodeConfig, pick: usize) -> Result<()> {
    node.start_joining()?;
    log::info!("Looking for games via {}", config.lan.broadcast);

    let deadline = Instant::now() + config.discovery_window;
    while Instant::now() < deadline {
        for event in node.pump_lobby()? {
            if let NodeEvent::CandidateFound(host) = event {
                log::info!("[{}] {}", node.candidates().len() - 1, host);
            }
        }
        thread::sleep(config.poll_interval);
    }

    if node.candidates().is_empty() {
        bail!("no games found on the LAN");
    }

    node.request_join(pick)?;
    let started = Instant::now();
    let mut last_request = started;
    while node.link_state() != LinkState::InSession {
        node.pump_lobby()?;
        if started.elapsed() > config.lan.idle_timeout {
            bail!("host did not accept the join request");
        }
        if last_request.elapsed() > config.join_retry {
            node.request_join(pick)?;
            last_request = Instant::now();
        }
        thread::sleep(config.poll_interval);
    }

    run_ticks(node, config, |node, clock, steps| {
        let report = node.client_tick(scripted_input(steps))?;

        if steps % u64::from(clock.tick_rate()) == 0 {
            log::info!(
                "mirror tick {:?} | applied {} | stale {} | received {}",
                report.tick,
                report.applied,
                report.stale,
                node.endpoint().socket().stats().packets_received
            );
        }
        Ok(())
    })
}

/// Fixed-rate loop shared by both roles. A silent peer ends the run
/// cleanly; any other error is fatal.
fn run_ticks(
    node: &mut Node,
    config: &NodeConfig,
    mut step: impl FnMut(&mut Node, &TickClock, u64) -> Result<(), LanError>,
) -> Result<()> {
    let mut clock = TickClock::new(config.lan.tick_rate);
    let mut last = Instant::now();
    let mut steps = 0u64;

    loop {
        let now = Instant::now();
        clock.accumulate(now - last);
        last = now;

        while clock.consume_tick() {
            match step(node, &clock, steps) {
                Ok(()) => {}
                Err(LanError::PeerTimedOut { remote }) => {
                    log::warn!("Session with {} timed out", remote);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            steps += 1;
            if config.ticks.is_some_and(|limit| steps >= limit) {
                log::info!("Stopping after {} ticks", steps);
                node.leave();
                return Ok(());
            }
        }

        thread::sleep(config.poll_interval);
    }
}

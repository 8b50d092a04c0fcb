use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use crate::control::{MatchMaker, PlayerSession, Registry};
use crate::model::*;
use crate::util::connection::open_connection;
use crate::util::misc::*;
use crate::{error, info};

// [App]
#[derive(Debug)]
pub struct ServerApp {
    config: String, // host/port file
    humans: usize,  // connected players required per table
    seed: u64,
    ws: bool,
}

impl ServerApp {
    pub fn new(args: Vec<String>) -> Self {
        let mut app = Self {
            config: "".to_string(),
            humans: 2,
            seed: 0,
            ws: false,
        };

        let mut it = args.iter();
        while let Some(s) = it.next() {
            match s.as_str() {
                "-c" => app.config = next_value(&mut it, s),
                "-n" => app.humans = next_value(&mut it, s),
                "-s" => app.seed = next_value(&mut it, s),
                "-ws" => app.ws = true,
                opt => {
                    error!("unknown option: {}", opt);
                    std::process::exit(0);
                }
            }
        }

        if app.humans < 1 || app.humans > SEAT {
            error_exit(format!("-n must be 1..={}, got {}", SEAT, app.humans))
        }
        if app.seed == 0 {
            app.seed = unixtime_now() as u64;
            info!(
                "Random seed is not specified. Unix timestamp '{}' is used as seed.",
                app.seed
            );
        }

        app
    }

    pub fn run(self) {
        if let Err(e) = self.listen() {
            error_exit(e)
        }
    }

    fn listen(&self) -> Res {
        let (host, port) = if self.config.is_empty() {
            (DEFAULT_HOST.to_string(), DEFAULT_PORT)
        } else {
            read_host_port(&self.config)?
        };

        let registry = Arc::new(Registry::new());
        let match_maker = Arc::new(MatchMaker::new(self.humans, self.seed));

        let listener = TcpListener::bind((host.as_str(), port))?;
        info!(
            "listening on {}:{} ({} humans per table)",
            host, port, self.humans
        );

        for request in listener.incoming() {
            match request {
                Ok(stream) => {
                    let peer = stream
                        .peer_addr()
                        .map(|a| a.to_string())
                        .unwrap_or_default();
                    info!("connection from {}", peer);

                    let registry = registry.clone();
                    let match_maker = match_maker.clone();
                    let ws = self.ws;
                    thread::spawn(move || match open_connection(stream, ws) {
                        Ok(conn) => PlayerSession::new(conn, registry, match_maker).run(),
                        Err(e) => error!("handshake with {} failed: {}", peer, e),
                    });
                }
                Err(e) => error!("accept failed: {}", e),
            }
        }
        Ok(())
    }
}

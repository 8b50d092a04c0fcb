#![warn(rust_2018_idioms)]

mod app;
mod control;
mod model;
mod util;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        error!("mode not specified");
        return;
    }

    let args2 = args[2..].to_vec();
    match args[1].as_str() {
        "S" => {
            // Server (network match mode)
            app::ServerApp::new(args2).run();
        }
        m => {
            error!("unknown mode: {}", m)
        }
    }
}

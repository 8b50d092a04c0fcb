// Application modes invoked from main.
mod server;

pub use server::ServerApp;

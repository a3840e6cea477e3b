use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Serve a personal todo list backed by a JSON file.
#[derive(Debug, Clone, Parser)]
#[command(name = "todofile", version)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "TODO_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Snapshot file holding the todo list.
    #[arg(long, env = "TODO_DATA_FILE", default_value = "todos.json")]
    pub data_file: PathBuf,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const HEALTHCHECKS_PORT: &str = "HEALTHCHECKS_PORT";

const DEFAULT_PORT: u16 = 8080;

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(HEALTHCHECKS_PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const HEALTHCHECKS_ADDR: &str = "HEALTHCHECKS_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

pub fn get_addr() -> IpAddr {
    let addr_from_env = std::env::var(HEALTHCHECKS_ADDR);
    addr_from_env.map_or(IpAddr::V4(DEFAULT_ADDR), |res| {
        res.parse().unwrap_or(IpAddr::V4(DEFAULT_ADDR))
    })
}

pub fn get_bind_addr() -> SocketAddr {
    SocketAddr::new(get_addr(), get_port())
}

const HEALTHCHECKS_LOG: &str = "HEALTHCHECKS_LOG";

pub fn get_log_level() -> Option<String> {
    std::env::var(HEALTHCHECKS_LOG).ok()
}

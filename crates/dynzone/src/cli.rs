//! Command-line interface

use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Keep Cloudflare DNS records pointed at this host's public IPv4 address
#[derive(Debug, Parser)]
#[command(name = "dynzone", version, about)]
pub struct Args {
    /// Enable debug logging (overrides --log-level)
    #[arg(short, long)]
    pub debug: bool,

    /// Report what would change without updating any record
    #[arg(long)]
    pub dry_run: bool,

    /// YAML configuration file
    #[arg(long, env = "CLOUDFLARE_CONF")]
    pub config: PathBuf,

    /// JSON cache file holding the last applied IP
    #[arg(long, env = "CLOUDFLARE_CACHE", default_value = "cf_cache.json")]
    pub cache: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "DYNZONE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Use this IPv4 address instead of discovering it
    #[arg(long, value_name = "IPV4")]
    pub ip: Option<Ipv4Addr>,

    /// IP echo service, tried in the order given (repeatable)
    #[arg(long = "ip-url", value_name = "URL")]
    pub ip_urls: Vec<String>,

    /// Exit with status 2 when any record, domain or account failed
    #[arg(long)]
    pub fail_on_error: bool,

    /// Disable colored output (also honored via NO_COLOR)
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Effective log level, taking `--debug` into account
    pub fn effective_log_level(&self) -> &str {
        if self.debug { "debug" } else { &self.log_level }
    }
}

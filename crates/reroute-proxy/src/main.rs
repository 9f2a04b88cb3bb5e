use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use reroute_proxy::{ProxyServer, RedirectTable};

const SETTINGS_HELP: &str = "\
The settings file consists of lines defining redirection routes.

A redirection route has the following format:

    {ip}:{port} {ip}:{port}

Multiple whitespaces/tabs are permitted as a separator.

The first (source) ip&port is redirected to the second (destination)
ip&port. The source ip, port, or both may be the wildcard '*'.";

/// A HTTP/S proxy that redirects connections.
///
/// Designed to be used as a system proxy, or forced onto specific programs
/// via software like Proxifier.
#[derive(Parser, Debug)]
#[command(name = "reroute-proxy")]
#[command(version, about, after_long_help = SETTINGS_HELP)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8868)]
    port: u16,

    /// Settings file with routes
    #[arg(short, long, default_value = "settings.txt")]
    settings: PathBuf,

    /// Verbose proxy output
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "reroute_proxy=debug,info"
    } else {
        "reroute_proxy=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let rules = match reroute_proxy::rules::load(&args.settings) {
        Ok(rules) => rules,
        Err(err) => {
            println!("ERROR: {err}");
            std::process::exit(1);
        }
    };

    let table = RedirectTable::from_rules(&rules);

    println!();
    println!("HTTP/S proxy up on port {}!", args.port);
    println!();

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), args.port);
    let server = match ProxyServer::bind(addr, table.into_shared()).await {
        Ok(server) => server,
        Err(err) => {
            tracing::error!("{err:#}");
            std::process::exit(1);
        }
    };

    if let Err(err) = server.run().await {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

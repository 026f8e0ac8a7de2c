//! netstate command - print a snapshot of the host network state as JSON.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use netstate::{NetworkStateSnapshot, RetrieveOptions, RouteFilter, RuleFilter};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "netstate", version, about = "Network state snapshot tool")]
struct Cli {
    /// Part of the snapshot to print.
    #[arg(value_enum, default_value_t = Section::All)]
    section: Section,

    /// Per-query timeout in milliseconds.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Report only this interface.
    #[arg(long, value_name = "NAME")]
    iface: Option<String>,

    /// Keep only routes of this table.
    #[arg(long, value_name = "ID")]
    route_table: Option<u32>,

    /// Keep only routes leaving through this interface.
    #[arg(long, value_name = "NAME")]
    route_oif: Option<String>,

    /// Keep only rules pointing at this table.
    #[arg(long, value_name = "ID")]
    rule_table: Option<u32>,

    /// Skip interface addresses.
    #[arg(long)]
    no_addresses: bool,

    /// Skip bridge VLAN tables.
    #[arg(long)]
    no_bridge_vlans: bool,

    /// Skip ethtool settings.
    #[arg(long)]
    no_ethtool: bool,

    /// Skip SR-IOV virtual functions.
    #[arg(long)]
    no_sriov: bool,

    /// Skip MPTCP endpoints and limits.
    #[arg(long)]
    no_mptcp: bool,

    /// Skip the resolver config.
    #[arg(long)]
    no_dns: bool,

    /// Skip the routing tables.
    #[arg(long)]
    no_routes: bool,

    /// Skip routing policy rules.
    #[arg(long)]
    no_rules: bool,

    /// Resolver config to read.
    #[arg(long, value_name = "PATH")]
    resolv_conf: Option<PathBuf>,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    All,
    Ifaces,
    Routes,
    Rules,
    Dns,
    Mptcp,
}

impl Cli {
    fn options(&self) -> RetrieveOptions {
        let mut route_filter = RouteFilter::new();
        route_filter.table = self.route_table;
        route_filter.oif = self.route_oif.clone();
        let mut rule_filter = RuleFilter::new();
        rule_filter.table = self.rule_table;

        let mut opts = RetrieveOptions::new()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_route_filter(route_filter)
            .with_rule_filter(rule_filter)
            .addresses(!self.no_addresses)
            .bridge_vlans(!self.no_bridge_vlans)
            .ethtool(!self.no_ethtool)
            .sriov(!self.no_sriov)
            .mptcp(!self.no_mptcp)
            .dns(!self.no_dns)
            .routes(!self.no_routes)
            .rules(!self.no_rules);
        if let Some(path) = &self.resolv_conf {
            opts = opts.with_resolv_conf(path);
        }
        if let Some(name) = &self.iface {
            opts = opts.with_iface_name(name);
        }
        opts
    }
}

fn section_json(
    snapshot: &NetworkStateSnapshot,
    section: Section,
) -> serde_json::Result<serde_json::Value> {
    match section {
        Section::All => serde_json::to_value(snapshot),
        Section::Ifaces => serde_json::to_value(&snapshot.ifaces),
        Section::Routes => serde_json::to_value(&snapshot.routes),
        Section::Rules => serde_json::to_value(&snapshot.rules),
        Section::Dns => serde_json::to_value(&snapshot.dns_resolver),
        Section::Mptcp => serde_json::to_value(&snapshot.mptcp),
    }
}

fn print_json(value: &impl Serialize, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let snapshot = match netstate::retrieve(&cli.options()).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: {}", netstate::RetrieveError::from(e));
            std::process::exit(1);
        }
    };

    // The full snapshot carries its own warnings.
    if cli.section != Section::All {
        for warning in &snapshot.warnings {
            tracing::warn!("{warning}");
        }
    }

    print_json(&section_json(&snapshot, cli.section)?, cli.pretty)
}

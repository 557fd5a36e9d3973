use clap::Parser;

use tabframe::constants::VERSION;
use tabframe::error::die;
use tabframe::runner::{self, RunOptions};
use tabframe::tracing_sub;

const USAGE: &str = "usage: tabframe [-dv]";

#[derive(Parser, Debug)]
#[command(name = "tabframe", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(short = 'v')]
    version: bool,

    /// Detach after printing the frame's window id.
    #[arg(short = 'd')]
    detach: bool,
}

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|_| die(USAGE));
    if cli.version {
        die(format!("tabframe-{VERSION}, see LICENSE for details"));
    }

    tracing_sub::init_default();
    if !locale_is_utf8() {
        tracing::warn!("no UTF-8 locale; titles outside Latin-1 render as '?'");
    }

    if let Err(err) = runner::run(RunOptions { detach: cli.detach }) {
        die(format!("tabframe: {err}"));
    }
}

/// First of `LC_ALL`, `LC_CTYPE`, `LANG` that is set decides.
fn locale_is_utf8() -> bool {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
        .is_some_and(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("utf-8") || value.contains("utf8")
        })
}

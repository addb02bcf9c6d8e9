// tracing subscriber setup for the `melody` CLI.
//
// Library code only emits events; the binary installs the subscriber once.
// `RUST_LOG` wins when set, otherwise `info`, or `debug` for this
// workspace's crates when verbose.

use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str = "info,melody_codec=debug,melody_gen=debug";

pub fn init(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

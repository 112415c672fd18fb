use std::time::Duration;

use ping_mon::{IpFamily, PersistError, ProbeConfig, ProbeScheduler, ProbeSummary, SummarySink};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(argh::FromArgs)]
/// monitor - periodically ping a host and print per-burst statistics
struct Args {
    /// destination hostname or IP address
    #[argh(positional)]
    host: String,

    /// probe over IPv6 instead of IPv4
    #[argh(switch, short = '6')]
    ipv6: bool,

    /// probes per burst
    #[argh(option, short = 'c', default = "3")]
    count: u16,

    /// per-probe timeout in milliseconds
    #[argh(option, short = 't', default = "3000")]
    timeout_ms: u64,

    /// echo payload size in bytes
    #[argh(option, short = 's', default = "64")]
    payload_size: usize,

    /// seconds to wait between bursts
    #[argh(option, short = 'w', default = "5")]
    wait_period: u64,
}

/// Stands in for the persistence collaborator: prints each summary.
struct StdoutSink;

impl SummarySink for StdoutSink {
    fn record(&mut self, summary: &ProbeSummary) -> Result<(), PersistError> {
        println!("{summary}");
        Ok(())
    }
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args: Args = argh::from_env();

    let family = if args.ipv6 { IpFamily::V6 } else { IpFamily::V4 };
    let mut config = ProbeConfig::new(args.host, family);
    config.count = args.count;
    config.timeout = Duration::from_millis(args.timeout_ms);
    config.payload_size = args.payload_size;

    let engine = match ping_mon::open(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    ProbeScheduler::new(engine, Duration::from_secs(args.wait_period), StdoutSink).run()
}

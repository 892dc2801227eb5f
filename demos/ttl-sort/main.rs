use std::time::Duration;
use ttl_sort::{GenericError, SortConfig, SortState, Ttl, TtlSorter, UnexpectedMessagePolicy};

#[derive(argh::FromArgs)]
/// ttl-sort - sort integers by the order their ICMP replies come back in
struct Args {
    #[argh(option, default = "String::from(\"www.baidu.com\")")]
    /// target to use for sorting
    target: String,

    #[argh(option, default = "3")]
    /// sort up to this many times, or until sorted
    iters: usize,

    #[argh(option, default = "3")]
    /// seconds to sleep between sorts (anti-flood detection)
    chill: u64,

    #[argh(option, default = "10")]
    /// seconds to wait for replies in each round
    timeout: u64,

    #[argh(switch)]
    /// fail on ICMP messages that do not answer one of our probes
    strict: bool,

    #[argh(switch, short = 'v')]
    /// log debug output
    verbose: bool,

    #[argh(positional)]
    /// values to sort (1-255)
    values: Vec<Ttl>,
}

fn main() -> Result<(), GenericError> {
    let args: Args = argh::from_env();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = SortConfig {
        destination: ttl_sort::resolve_ipv4(&args.target)?,
        max_rounds: args.iters,
        round_delay: Duration::from_secs(args.chill),
        read_timeout: Duration::from_secs(args.timeout),
        unexpected_message: if args.strict { UnexpectedMessagePolicy::Abort } else { UnexpectedMessagePolicy::Skip },
    };

    let mut sorter = TtlSorter::new(&config)?;
    let outcome = sorter.sort(args.values)?;

    let values: Vec<String> = outcome.values.iter().map(ToString::to_string).collect();
    match outcome.state {
        SortState::Converged => println!("fully sorted after {} round(s): {}", outcome.rounds, values.join(" ")),
        SortState::RangeConflict { hops } => {
            println!("{} is only {} hops away, pick a target further away", args.target, hops);
            println!("best effort, not sorted: {}", values.join(" "));
        }
        SortState::IterationsExhausted | SortState::Running => {
            println!("best effort, not sorted: {}", values.join(" "));
        }
    }
    Ok(())
}

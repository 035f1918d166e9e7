use clap::Parser;
use codaph_cli::Cli;

#[tokio::main]
async fn main() {
    #[cfg(unix)]
    reset_sigpipe();

    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = codaph_cli::run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Hooks run unattended off git; stay quiet unless `RUST_LOG` opts in.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

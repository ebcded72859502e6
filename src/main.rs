use anyhow::Result;
use clap::Parser;
use deadlock_demo::{BANNER, Demo};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Two threads take two locks in opposite order and hang forever. Stop it with Ctrl-C."
)]
struct Cli {}

fn main() -> Result<()> {
    let _cli = Cli::parse();

    println!("{}", BANNER);
    println!("Creating two threads that will deadlock...\n");

    let handle = Demo::new().start()?;

    // Both workers end up in a circular wait, so this join never returns.
    handle.join()?;

    // Unreachable under normal scheduling.
    println!("Program completed successfully (this won't print due to deadlock)");
    Ok(())
}

//! Startup banner

use super::config::AppConfig;
use super::constants::{APP_NAME, DONE_QUEUE_SUFFIX};

/// Print the startup banner with the resolved queue and store layout
pub fn print_banner(config: &AppConfig) {
    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    // Label width: "Completion queue:" is 17 chars, pad to 19 for alignment
    const W: usize = 19;

    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {} \x1b[90m({})\x1b[0m",
        "Work queue:", config.queue.name, config.queue.backend
    );
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}{}",
        "Completion queue:", config.queue.name, DONE_QUEUE_SUFFIX
    );
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m size {} / timeout {}ms",
        "Batching:",
        config.core.batch_size,
        config.core.batch_timeout.as_millis()
    );

    if config.stores.enabled.is_empty() {
        println!(
            "  \x1b[90m➜  {:<W$} none (messages are consumed without storage)\x1b[0m",
            "Stores:"
        );
    } else {
        let stores = config
            .stores
            .enabled
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  \x1b[35m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
            "Stores:", stores
        );
    }

    println!();
}

use crate::utils::config::SCHEMA_VERSION;

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Decentralization Panel Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Weekly metric row:");
        println!("  platform: string            - Canonical platform name");
        println!("  year: number                - ISO year");
        println!("  week: number                - ISO week (1-53)");
        println!("  inverse_hhi: number         - 1 / sum(p^2), 0 if no events");
        println!("  shannon_entropy: number     - -sum(p ln p), 0 if no events");
        println!("  total_events: number        - Events in the week");
        println!("  unique_participants: number - Participants with at least one event");
        println!();
        println!("Unified panel row:");
        println!("  platform, year, week        - Key, unique per row");
        println!("  <column>: number|string|null - One per input column; null = no observation");
        println!("  <column>_<source>           - Renamed on collision with an earlier source");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Decentralization Panel v{}", env!("CARGO_PKG_VERSION"));
    println!("Panel Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Weekly decentralization metrics and panel alignment for blockchain platforms.");
}

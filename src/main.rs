use clap::Parser;
use radar_index::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    let Some(command) = args.command else {
        show_help_and_commands();
        process::exit(0);
    };

    match commands::run(command) {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Radar Index - radar product archive discovery");
    println!("=============================================");
    println!();
    println!("Lists radar product files by station and time window, caching settled");
    println!("days as snapshots so only days still receiving data are rescanned.");
    println!();
    println!("USAGE:");
    println!("    radar-index <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    query       List product files for stations in a time window");
    println!("    stations    List the stations of a dataset");
    println!("    snapshot    Write the snapshot of a finished day");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Latest level 2 volume for two stations:");
    println!("    radar-index query -d nexrad/level2/IDD -s KFTG -s KTLX --latest");
    println!();
    println!("    # Level 3 reflectivity over one afternoon, as JSON:");
    println!("    radar-index query -d nexrad/level3/IDD --var N0R -s FTG \\");
    println!("                      --start 20230102_1200 --end 20230102_1800 --format json");
    println!();
    println!("    # Settle yesterday (run after the feed has caught up):");
    println!("    radar-index snapshot -d nexrad/level2/IDD");
    println!();
    println!("For detailed help on any command, use:");
    println!("    radar-index <COMMAND> --help");
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{convert, suggest, usages};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "jsp2jte")]
#[command(version = VERSION)]
#[command(about = "Migrate JSP tag files and pages to jte templates")]
struct Cli {
    /// Settings file (default: ./jsp2jte.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a JSP file to jte and rewrite its usages
    Convert(convert::ConvertArgs),
    /// Rewrite usages of a JSP tag to an existing jte template
    ReplaceUsages(usages::ReplaceUsagesArgs),
    /// Show the jte file name derived from a JSP path
    Suggest(suggest::SuggestArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        config: cli.config.map(PathBuf::from),
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}

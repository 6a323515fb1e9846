use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{init, link, replace, templates, update};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "relink")]
#[command(version = VERSION)]
#[command(about = "Propagate a library's version into dependent project manifests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the source project for relink
    Init(init::InitArgs),
    /// Scan a dependent project tree and track its manifests
    #[command(visible_alias = "l")]
    Link(link::LinkArgs),
    /// Run the update pipeline for linked references
    #[command(visible_alias = "u")]
    Update(update::UpdateArgs),
    /// Splice the resolved version into tracked manifests directly
    Replace(replace::ReplaceArgs),
    /// List locally available templates
    Templates(templates::TemplatesArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_json_result(json_result);

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

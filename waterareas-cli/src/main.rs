//! Entry point for the `waterareas` binary.
#![forbid(unsafe_code)]

use waterareas_cli::CliError;

fn main() {
    let Err(err) = waterareas_cli::run() else {
        return;
    };
    match &err {
        CliError::ArgumentParsing(parse) => {
            if let Err(io) = parse.print() {
                eprintln!("waterareas: {io}");
            }
        }
        other => eprintln!("waterareas: {other}"),
    }
    std::process::exit(err.exit_code());
}

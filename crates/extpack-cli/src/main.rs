mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::create::CreateOptions;
use commands::{EXIT_FAILURE, EXIT_IO_ERROR, EXIT_MANIFEST_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "extpack",
    version,
    about = "Merge partial extension manifests and assemble a .vsix package"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge partial manifests and write a package.
    Create {
        /// Directory that manifest globs and asset paths are relative to.
        #[arg(long)]
        root: Option<PathBuf>,
        /// Glob selecting partial manifests (repeatable, applied in order).
        #[arg(long = "manifest-globs", num_args = 1..)]
        manifest_globs: Vec<String>,
        /// Inline JSON object applied after every partial manifest.
        #[arg(long = "override")]
        override_json: Option<String>,
        /// JSON file applied after every partial manifest.
        #[arg(long)]
        overrides_file: Option<PathBuf>,
        /// Output file, or a directory that receives the automatic name.
        #[arg(long)]
        output_path: Option<String>,
        /// JSON config file supplying defaults for the options above.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the identity embedded in a built package.
    Show {
        /// Path to the .vsix file.
        package: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("EXTPACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Create {
            root,
            manifest_globs,
            override_json,
            overrides_file,
            output_path,
            config,
        } => commands::create::run(
            &CreateOptions {
                root,
                manifest_globs,
                override_json,
                overrides_file,
                output_path,
                config,
            },
            json_output,
        ),
        Commands::Show { package } => commands::show::run(&package, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("manifest error:")
        || msg.starts_with("failed to parse manifest")
        || msg.starts_with("failed to read manifest")
        || msg.starts_with("invalid config:")
    {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("I/O error:")
        || msg.starts_with("failed to read asset")
        || msg.starts_with("archive error:")
    {
        EXIT_IO_ERROR
    } else {
        EXIT_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_errors_map_to_manifest_exit_code() {
        assert_eq!(
            exit_code_for("manifest error: no manifests found matching [x]"),
            EXIT_MANIFEST_ERROR
        );
        assert_eq!(
            exit_code_for("failed to parse manifest 'a.json': bad"),
            EXIT_MANIFEST_ERROR
        );
    }

    #[test]
    fn io_errors_map_to_io_exit_code() {
        assert_eq!(exit_code_for("I/O error: denied"), EXIT_IO_ERROR);
        assert_eq!(
            exit_code_for("failed to read asset '/x/icon.png': not found"),
            EXIT_IO_ERROR
        );
    }

    #[test]
    fn everything_else_is_a_generic_failure() {
        assert_eq!(exit_code_for("invalid package: no identity"), EXIT_FAILURE);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

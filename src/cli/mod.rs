use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vaultgate", version, about = "Secret store bootstrap and read gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bootstrap the store, then serve the secret over HTTP (default).
    Serve(ServeOpts),
    /// Run the bootstrap once, print the report, and exit.
    Bootstrap(StoreOpts),
    /// Print the store's initialization and seal state.
    Status(StoreOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args, Default)]
pub struct ServeOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(short, long)]
    pub bind: Option<String>,
    /// Use an in-process store instead of the configured endpoint.
    #[arg(long)]
    pub dev_store: bool,
}

#[derive(clap::Args)]
pub struct StoreOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(long)]
    pub dev_store: bool,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["vaultgate"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from(["vaultgate", "serve", "--port", "4000", "--dev-store"]).unwrap();
        match cli.command {
            Some(Commands::Serve(opts)) => {
                assert_eq!(opts.port, Some(4000));
                assert!(opts.dev_store);
            }
            _ => panic!("expected serve"),
        }
    }
}

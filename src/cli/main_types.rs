use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "insysdb-cli")]
#[command(about = "Command line interface tool for querying the InSysBio FIVEDB and Cytocon databases")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Credentials file with '<username> <password>' on the first line
    #[arg(long, global = true, env = "INSYSDB_CREDENTIALS")]
    pub credentials: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which database system a command targets.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum Database {
    Fivedb,
    Cytocon,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Token management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Controlled-vocabulary dictionaries
    Dict {
        #[command(subcommand)]
        command: DictCommands,
    },
    /// Show the header catalog (column description to query variable)
    Headers {
        database: Database,
        /// Disease scope for the Cytocon catalog
        #[arg(long, action = clap::ArgAction::Append)]
        disease: Vec<String>,
        /// Re-download even when a cached catalog exists
        #[arg(long)]
        force: bool,
        /// Save the column descriptions to a text file
        #[arg(long)]
        output: Option<String>,
    },
    /// Filtered data queries
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Delete the cached access token
    Reset { database: Database },
    /// Show whether a cached access token exists
    Status { database: Database },
}

#[derive(Subcommand, Debug)]
pub enum DictCommands {
    /// List a dictionary, or the available dictionary names
    List {
        database: Database,
        /// Dictionary name (e.g. process_types); omit to list the names
        name: Option<String>,
        /// Re-download even when a cached copy exists
        #[arg(long)]
        force: bool,
    },
    /// Save a dictionary to a text file, one value per line
    Save {
        database: Database,
        /// Dictionary name (e.g. process_types)
        name: String,
        /// Target file path
        #[arg(long)]
        output: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Query FIVEDB (filter flags may be repeated; empty means unrestricted)
    Fivedb {
        #[arg(long, action = clap::ArgAction::Append)]
        process_type: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        parameter: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        cell_type: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        stimulated: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        patient_state: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        product: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        daughter_cell: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        regulator: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        modifier: Vec<String>,
        /// Column description to return (repeatable); omit for all columns
        #[arg(long, action = clap::ArgAction::Append)]
        header: Vec<String>,
        /// Include per-group statistics columns
        #[arg(long)]
        wstat: bool,
        /// Re-download the header catalog before querying
        #[arg(long)]
        force_headers: bool,
        /// Write the result to a CSV file instead of the terminal
        #[arg(long)]
        output: Option<String>,
    },
    /// Query Cytocon (filter flags may be repeated; empty means unrestricted)
    Cytocon {
        #[arg(long, action = clap::ArgAction::Append)]
        species: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        tissue_type: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        disease: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        marker: Vec<String>,
        /// Column description to return (repeatable); omit for all columns
        #[arg(long, action = clap::ArgAction::Append)]
        header: Vec<String>,
        /// Include per-group statistics columns
        #[arg(long)]
        wstat: bool,
        /// Re-download the header catalog before querying
        #[arg(long)]
        force_headers: bool,
        /// Write the result to a CSV file instead of the terminal
        #[arg(long)]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fivedb_query() {
        let cli = Cli::try_parse_from([
            "insysdb-cli",
            "query",
            "fivedb",
            "--process-type",
            "Migration",
            "--parameter",
            "Emax",
            "--parameter",
            "EC50",
            "--header",
            "Parameter value",
            "--wstat",
        ])
        .unwrap();

        match cli.command {
            Commands::Query {
                command:
                    QueryCommands::Fivedb {
                        process_type,
                        parameter,
                        header,
                        wstat,
                        output,
                        ..
                    },
            } => {
                assert_eq!(process_type, vec!["Migration"]);
                assert_eq!(parameter, vec!["Emax", "EC50"]);
                assert_eq!(header, vec!["Parameter value"]);
                assert!(wstat);
                assert!(output.is_none());
            }
            _ => panic!("Expected query fivedb command"),
        }
    }

    #[test]
    fn test_parse_dict_list_without_name() {
        let cli = Cli::try_parse_from(["insysdb-cli", "dict", "list", "cytocon"]).unwrap();
        match cli.command {
            Commands::Dict {
                command: DictCommands::List {
                    database,
                    name,
                    force,
                },
            } => {
                assert_eq!(database, Database::Cytocon);
                assert!(name.is_none());
                assert!(!force);
            }
            _ => panic!("Expected dict list command"),
        }
    }

    #[test]
    fn test_parse_auth_reset() {
        let cli = Cli::try_parse_from(["insysdb-cli", "auth", "reset", "fivedb"]).unwrap();
        match cli.command {
            Commands::Auth {
                command: AuthCommands::Reset { database },
            } => assert_eq!(database, Database::Fivedb),
            _ => panic!("Expected auth reset command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "insysdb-cli",
            "--verbose",
            "--profile",
            "dev",
            "--credentials",
            "creds.txt",
            "auth",
            "status",
            "cytocon",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.profile.as_deref(), Some("dev"));
        assert_eq!(cli.credentials.as_deref(), Some("creds.txt"));
    }
}

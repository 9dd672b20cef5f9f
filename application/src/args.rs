//! [`Args`] definitions.

use clap::{Parser, Subcommand};

/// Server of the user directory.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Action to perform instead of serving the API.
    #[command(subcommand)]
    pub command: Option<Action>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// One-off action performed against the database.
#[derive(Clone, Debug, Subcommand)]
pub enum Action {
    /// Creates a `superadmin` user and exits.
    CreateSuperadmin {
        /// First name of the user.
        #[arg(long, default_value = "Super")]
        first_name: String,

        /// Last name of the user.
        #[arg(long, default_value = "Admin")]
        last_name: String,

        /// Email of the user.
        #[arg(long, default_value = "admin@mafer.dev")]
        email: String,

        /// Password of the user.
        #[arg(long, default_value = "123456")]
        password: String,
    },
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::{Action, Args};

    #[test]
    fn serves_by_default() {
        let args = Args::try_parse_from(["application"]).unwrap();

        assert_eq!(args.config, "config.toml");
        assert!(args.command.is_none());
    }

    #[test]
    fn parses_create_superadmin() {
        let args = Args::try_parse_from([
            "application",
            "--config",
            "prod.toml",
            "create-superadmin",
            "--email",
            "root@example.com",
        ])
        .unwrap();

        assert_eq!(args.config, "prod.toml");
        let Some(Action::CreateSuperadmin {
            first_name,
            email,
            password,
            ..
        }) = args.command
        else {
            panic!("expected `create-superadmin` action");
        };
        assert_eq!(first_name, "Super");
        assert_eq!(email, "root@example.com");
        assert_eq!(password, "123456");
    }
}

//! Command-line definition

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pingen_core::config::PingenConfig;
use pingen_core::constants::DEFAULT_TIMEOUT_SECS;
use pingen_core::{AddressPosition, DeliveryProduct, ListParams, PrintMode, PrintSpectrum};
use std::path::PathBuf;
use std::time::Duration;

/// Output format for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Plain,
}

/// Flags accepted before or after any subcommand
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub env: Option<String>,
    pub api_base: Option<String>,
    pub identity_base: Option<String>,
    pub organisation_id: Option<String>,
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub client_secret_file: Option<PathBuf>,
    pub timeout: Duration,
    pub output: OutputMode,
    pub quiet: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

impl GlobalOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let text = |id: &str| matches.get_one::<String>(id).filter(|v| !v.is_empty()).cloned();

        let timeout_secs = matches
            .get_one::<u64>("timeout")
            .copied()
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        // Plain text unless --json is given; --plain wins over --json
        let output = if matches.get_flag("json") && !matches.get_flag("plain") {
            OutputMode::Json
        } else {
            OutputMode::Plain
        };

        GlobalOptions {
            env: text("env"),
            api_base: text("api-base"),
            identity_base: text("identity-base"),
            organisation_id: text("org"),
            access_token: text("access-token"),
            client_id: text("client-id"),
            client_secret: text("client-secret"),
            client_secret_file: matches.get_one::<PathBuf>("client-secret-file").cloned(),
            timeout: Duration::from_secs(timeout_secs),
            output,
            quiet: matches.get_flag("quiet"),
            verbose: matches.get_flag("verbose"),
            dry_run: matches.get_flag("dry-run"),
        }
    }

    /// The command-line configuration layer
    pub fn config_layer(&self) -> PingenConfig {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        PingenConfig {
            env: field(&self.env),
            api_base: field(&self.api_base),
            identity_base: field(&self.identity_base),
            organisation_id: field(&self.organisation_id),
            access_token: field(&self.access_token),
            access_token_expires_at: 0,
            client_id: field(&self.client_id),
            client_secret: field(&self.client_secret),
        }
    }

    /// Default log filter, overridden by `RUST_LOG`
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

fn global_value(id: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name(value_name)
        .help(help)
        .global(true)
}

fn global_flag(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .action(ArgAction::SetTrue)
        .global(true)
}

fn list_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("page")
                .long("page")
                .value_name("N")
                .help("Page number")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_name("N")
                .help("Page size")
                .value_parser(value_parser!(u32)),
        )
        .arg(Arg::new("sort").long("sort").value_name("FIELDS").help("Sort expression"))
        .arg(
            Arg::new("filter")
                .long("filter")
                .value_name("JSON")
                .help("Filter expression, or @path to read it from a file"),
        )
        .arg(Arg::new("q").long("q").value_name("QUERY").help("Full-text search"))
        .arg(
            Arg::new("include")
                .long("include")
                .value_name("RELATIONS")
                .help("Related resources to include"),
        )
        .arg(
            Arg::new("fields")
                .long("fields")
                .value_name("FIELDS")
                .help("Sparse fieldset for the listed resource"),
        )
}

/// List flags as given on the command line; `filter` is still unresolved
pub fn list_params(matches: &ArgMatches) -> ListParams {
    let text = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();
    ListParams {
        page: matches.get_one::<u32>("page").copied().unwrap_or(0),
        limit: matches.get_one::<u32>("limit").copied().unwrap_or(0),
        sort: text("sort"),
        filter: text("filter"),
        q: text("q"),
        include: text("include"),
        fields: text("fields"),
    }
}

fn print_option_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("delivery-product")
                .long("delivery-product")
                .value_name("PRODUCT")
                .help(format!("Delivery product ({})", DeliveryProduct::ALLOWED.join(", "))),
        )
        .arg(
            Arg::new("print-mode")
                .long("print-mode")
                .value_name("MODE")
                .help(format!("Print mode ({})", PrintMode::ALLOWED.join(", "))),
        )
        .arg(
            Arg::new("print-spectrum")
                .long("print-spectrum")
                .value_name("SPECTRUM")
                .help(format!("Print spectrum ({})", PrintSpectrum::ALLOWED.join(", "))),
        )
        .arg(
            Arg::new("meta-json")
                .long("meta-json")
                .value_name("JSON")
                .help("Letter metadata as a JSON object, or @path"),
        )
        .arg(
            Arg::new("meta-file")
                .long("meta-file")
                .value_name("PATH")
                .help("File holding letter metadata as a JSON object")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("idempotency-key")
                .long("idempotency-key")
                .value_name("KEY")
                .help("Idempotency key sent with the request"),
        )
}

pub fn build_cli() -> Command {
    Command::new("pingen-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Create and send letters through the Pingen API")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(global_value("env", "ENV", "Target environment (staging or production)"))
        .arg(global_value("api-base", "URL", "API base URL"))
        .arg(global_value("identity-base", "URL", "Identity service base URL"))
        .arg(global_value("org", "ID", "Organisation id"))
        .arg(global_value("access-token", "TOKEN", "Access token to use as-is"))
        .arg(global_value("client-id", "ID", "OAuth client id"))
        .arg(global_value("client-secret", "SECRET", "OAuth client secret"))
        .arg(
            global_value("client-secret-file", "PATH", "Read the client secret from a file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            global_value("timeout", "SECONDS", "HTTP timeout in seconds")
                .value_parser(value_parser!(u64))
                .default_value("30"),
        )
        .arg(global_flag("json", "Print JSON output"))
        .arg(global_flag("plain", "Print plain-text output (default)"))
        .arg(global_flag("quiet", "Only log errors"))
        .arg(global_flag("verbose", "Enable debug logging"))
        .arg(global_flag("dry-run", "Print the request instead of sending it"))
        .subcommand(
            Command::new("auth")
                .about("Authentication")
                .subcommand_required(true)
                .subcommand(
                    Command::new("token")
                        .about("Request an access token with the client credentials")
                        .arg(Arg::new("scope").long("scope").value_name("SCOPE").help("OAuth scope"))
                        .arg(
                            Arg::new("save")
                                .long("save")
                                .help("Save the token to the config file")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("save-credentials")
                                .long("save-credentials")
                                .help("Save the client id and secret to the config file")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or edit the config file")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print the config file"))
                .subcommand(
                    Command::new("set")
                        .about("Set a config key")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(
                    Command::new("unset")
                        .about("Clear a config key")
                        .arg(Arg::new("key").required(true)),
                ),
        )
        .subcommand(
            Command::new("org")
                .about("Organisations")
                .subcommand_required(true)
                .subcommand(list_args(Command::new("list").about("List organisations"))),
        )
        .subcommand(
            Command::new("letters")
                .about("Letters")
                .subcommand_required(true)
                .subcommand(list_args(Command::new("list").about("List letters")))
                .subcommand(
                    Command::new("get")
                        .about("Show one letter")
                        .arg(Arg::new("id").required(true)),
                )
                .subcommand(print_option_args(
                    Command::new("create")
                        .about("Upload a PDF and create a letter")
                        .arg(
                            Arg::new("file")
                                .long("file")
                                .value_name("PATH")
                                .help("PDF to upload")
                                .value_parser(value_parser!(PathBuf)),
                        )
                        .arg(
                            Arg::new("file-name")
                                .long("file-name")
                                .value_name("NAME")
                                .help("Original file name reported to Pingen"),
                        )
                        .arg(
                            Arg::new("address-position")
                                .long("address-position")
                                .value_name("POSITION")
                                .help(format!(
                                    "Address window position ({})",
                                    AddressPosition::ALLOWED.join(", ")
                                ))
                                .default_value("left"),
                        )
                        .arg(
                            Arg::new("auto-send")
                                .long("auto-send")
                                .help("Send the letter once it has been validated")
                                .action(ArgAction::SetTrue),
                        ),
                ))
                .subcommand(print_option_args(
                    Command::new("send")
                        .about("Send an existing letter")
                        .arg(Arg::new("id").required(true)),
                )),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from([
                "pingen-cli", "letters", "list", "--org", "org-1", "--plain", "--json", "--timeout", "5",
            ])
            .unwrap();
        let globals = GlobalOptions::from_matches(&matches);
        assert_eq!(globals.organisation_id.as_deref(), Some("org-1"));
        assert_eq!(globals.output, OutputMode::Plain);
        assert_eq!(globals.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_defaults() {
        let matches = build_cli().try_get_matches_from(["pingen-cli", "config", "show"]).unwrap();
        let globals = GlobalOptions::from_matches(&matches);
        assert_eq!(globals.output, OutputMode::Plain);
        assert_eq!(globals.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(globals.log_filter(), "warn");
        assert_eq!(globals.config_layer(), PingenConfig::default());
    }

    #[test]
    fn test_list_params_from_flags() {
        let matches = build_cli()
            .try_get_matches_from(["pingen-cli", "org", "list", "--page", "2", "--fields", "name"])
            .unwrap();
        let (_, org) = matches.subcommand().unwrap();
        let (_, list) = org.subcommand().unwrap();
        let params = list_params(list);
        assert_eq!(params.page, 2);
        assert_eq!(params.limit, 0);
        assert_eq!(params.fields, "name");
    }

    #[test]
    fn test_output_mode_selection() {
        let mode = |args: &[&str]| {
            let matches = build_cli().try_get_matches_from(args.iter().copied()).unwrap();
            GlobalOptions::from_matches(&matches).output
        };
        assert_eq!(mode(&["pingen-cli", "letters", "get", "l-1"]), OutputMode::Plain);
        assert_eq!(mode(&["pingen-cli", "letters", "get", "l-1", "--json"]), OutputMode::Json);
        assert_eq!(mode(&["pingen-cli", "--json", "letters", "get", "l-1", "--plain"]), OutputMode::Plain);
    }

    #[test]
    fn test_verbose_beats_quiet() {
        let matches = build_cli()
            .try_get_matches_from(["pingen-cli", "--quiet", "--verbose", "config", "show"])
            .unwrap();
        assert_eq!(GlobalOptions::from_matches(&matches).log_filter(), "debug");
    }
}

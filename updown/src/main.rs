//! updown.io CLI: query checks, downtimes, metrics, nodes and webhooks from the terminal.

mod output;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use output::OutputFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use updown_lib::helpers::{calculate_range, parse_time};
use updown_lib::{
    get_api_key, ApdexTarget, ApiKeyPlacement, CheckInterval, CheckOptions, CheckSettings,
    CheckUpdate, Client, Error, HttpVerb, Location, MetricsGrouping, MetricsOptions, MuteUntil,
    PartialConfig, WebhookOptions,
};

#[derive(Parser)]
#[command(name = "updown")]
#[command(about = "updown.io CLI: query checks, downtimes, metrics, nodes and webhooks", long_about = None)]
struct Cli {
    /// Output format: plain (human-readable) or json (structured).
    #[arg(short, long, default_value = "plain", global = true)]
    output: OutputFormat,

    /// Show timestamps in UTC. By default timestamps are shown in the local timezone.
    #[arg(long, global = true)]
    utc: bool,

    /// Refuse to create, update or delete anything. Use with read-only API keys.
    #[arg(long, env = "UPDOWN_READ_ONLY", global = true)]
    read_only: bool,

    /// Log each request to stderr. URLs and bodies are logged, the API key is not.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Send the API key as the `api-key` query parameter instead of the X-API-KEY header.
    #[arg(long, global = true)]
    query_key: bool,

    /// API base URL.
    #[arg(long, env = "UPDOWN_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

// Settings shared by add-check and update-check.
#[derive(Args)]
struct SettingsArgs {
    /// Check interval in seconds: 15, 30, 60, 120, 300, 600, 1800 or 3600
    #[arg(long)]
    period: Option<CheckInterval>,
    /// Apdex threshold in seconds: 0.125, 0.25, 0.5, 1 or 2
    #[arg(long)]
    apdex_t: Option<ApdexTarget>,
    #[arg(long)]
    enabled: Option<bool>,
    /// Make the status page public
    #[arg(long)]
    published: Option<bool>,
    #[arg(long)]
    alias: Option<String>,
    /// Text that must appear in the response body
    #[arg(long)]
    string_match: Option<String>,
    /// Mute notifications: recovery, forever, or an ISO 8601 time
    #[arg(long)]
    mute_until: Option<MuteUntil>,
    /// GET/HEAD, POST, PUT, PATCH, DELETE or OPTIONS
    #[arg(long)]
    http_verb: Option<HttpVerb>,
    #[arg(long)]
    http_body: Option<String>,
    /// Comma-separated location codes, e.g. lan,mia,syd
    #[arg(long, value_delimiter = ',')]
    disabled_locations: Option<Vec<Location>>,
    /// Custom request header as NAME:VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

impl From<SettingsArgs> for CheckSettings {
    fn from(args: SettingsArgs) -> Self {
        let custom_headers = if args.headers.is_empty() {
            None
        } else {
            Some(args.headers.into_iter().collect::<BTreeMap<_, _>>())
        };
        CheckSettings {
            period: args.period,
            apdex_t: args.apdex_t,
            enabled: args.enabled,
            published: args.published,
            alias: args.alias,
            string_match: args.string_match,
            mute_until: args.mute_until,
            http_verb: args.http_verb,
            http_body: args.http_body,
            disabled_locations: args.disabled_locations,
            custom_headers,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List all checks
    Checks,
    /// Show one check
    Check {
        token: String,
        /// Include metrics for the last hour
        #[arg(long)]
        metrics: bool,
    },
    /// List downtimes of a check (100 per page)
    Downtimes {
        token: String,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Get apdex, timings and request counts of a check
    Metrics {
        token: String,
        /// Start of the period (ISO 8601)
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,
        /// End of the period (ISO 8601)
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,
        /// Period ending at --to or now, e.g. 6hours, 1day, 2weeks. Overrides --from.
        #[arg(long)]
        range: Option<String>,
        /// Group by host or time
        #[arg(long, default_value = "none")]
        group: MetricsGrouping,
    },
    /// Create a check
    AddCheck {
        url: String,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Update a check; only the given settings change
    UpdateCheck {
        token: String,
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Delete a check
    DeleteCheck { token: String },
    /// List monitoring nodes
    Nodes,
    /// List IPv4 addresses of monitoring nodes
    NodesIpv4,
    /// List IPv6 addresses of monitoring nodes
    NodesIpv6,
    /// List webhooks
    Webhooks,
    /// Register a webhook
    AddWebhook { url: String },
    /// Delete a webhook
    DeleteWebhook { id: String },
    /// Show version
    Version,
}

impl Commands {
    /// Node lists are public and work without an API key.
    fn needs_api_key(&self) -> bool {
        !matches!(
            self,
            Commands::Nodes | Commands::NodesIpv4 | Commands::NodesIpv6 | Commands::Version
        )
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("header must be NAME:VALUE, got {}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in {}", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("UPDOWN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("updown {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logging(cli.verbose);

    let api_key = if cli.command.needs_api_key() {
        match get_api_key() {
            Ok((key, source)) => {
                tracing::debug!(source = source.as_str(), "API key loaded");
                key
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        String::new()
    };

    let config = PartialConfig {
        read_only: Some(cli.read_only),
        verbose: Some(cli.verbose),
        api_key_placement: cli.query_key.then_some(ApiKeyPlacement::Query),
        base_url: cli.base_url.clone(),
        timeout_secs: cli.timeout,
    };
    let client = match Client::new(api_key, config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let printer = Printer {
        format: cli.output,
        use_utc: cli.utc,
    };

    match run(&client, cli.command, &printer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Api(e)) if e.is_unauthorized() => {
            eprintln!("Error: {}", e);
            eprintln!("Hint: check that the API key from your secret backend is valid.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

struct Printer {
    format: OutputFormat,
    use_utc: bool,
}

impl Printer {
    fn print<T: Serialize>(&self, value: &T) -> Result<(), Error> {
        let value = serde_json::to_value(value)?;
        match self.format {
            OutputFormat::Plain => print!("{}", output::format_plain(&value, self.use_utc)),
            OutputFormat::Json => println!("{}", output::format_json(&value)?),
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Deleted {
    deleted: bool,
}

async fn run(client: &Client, cmd: Commands, out: &Printer) -> Result<(), Error> {
    match cmd {
        Commands::Checks => out.print(&client.get_checks().await?)?,
        Commands::Check { token, metrics } => {
            out.print(&client.get_check(&token, metrics).await?)?
        }
        Commands::Downtimes { token, page } => {
            out.print(&client.get_downtimes(&token, page).await?)?
        }
        Commands::Metrics {
            token,
            from,
            to,
            range,
            group,
        } => {
            let (from, to) = match range {
                Some(range) => {
                    let (from, to) = calculate_range(&range, to).map_err(Error::Config)?;
                    (Some(from), Some(to))
                }
                None => (from, to),
            };
            let options = MetricsOptions { from, to, group };
            out.print(&client.get_metrics(&token, &options).await?)?
        }
        Commands::AddCheck { url, settings } => {
            let options = CheckOptions {
                url,
                settings: settings.into(),
            };
            out.print(&client.add_check(&options).await?)?
        }
        Commands::UpdateCheck {
            token,
            url,
            settings,
        } => {
            let update = CheckUpdate {
                url,
                settings: settings.into(),
            };
            out.print(&client.update_check(&token, &update).await?)?
        }
        Commands::DeleteCheck { token } => out.print(&Deleted {
            deleted: client.delete_check(&token).await?,
        })?,
        Commands::Nodes => out.print(&client.get_nodes().await?)?,
        Commands::NodesIpv4 => out.print(&client.get_ipv4_nodes().await?)?,
        Commands::NodesIpv6 => out.print(&client.get_ipv6_nodes().await?)?,
        Commands::Webhooks => out.print(&client.get_webhooks().await?)?,
        Commands::AddWebhook { url } => {
            out.print(&client.add_webhook(&WebhookOptions { url }).await?)?
        }
        Commands::DeleteWebhook { id } => out.print(&Deleted {
            deleted: client.delete_webhook(&id).await?,
        })?,
        Commands::Version => {}
    }
    Ok(())
}

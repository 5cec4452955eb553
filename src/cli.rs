use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{Select, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{AdClient, AdSenseClient, Config},
    report::{DEFAULT_WINDOW_DAYS, ReportQuery},
    sink::{CsvFileSink, DEFAULT_SPREADSHEET_TITLE, SheetsSink, Table, TableSink, TsvSink},
    util::{account_label, account_line, ad_client_label, ad_client_line, ad_unit_line, resource_id},
};

#[derive(Parser, Debug)]
#[command(name = "adreport", version, about = "AdSense Management API CLI in Rust", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive browser for accounts, ad clients, ad units, and reports
    Browse,
    /// List AdSense accounts
    Accounts,
    /// List ad clients for an account
    AdClients {
        /// Account resource name, e.g. accounts/pub-1234567890
        #[arg(short, long)]
        account: String,
    },
    /// List ad units for an ad client
    AdUnits {
        /// Ad client resource name, e.g. accounts/pub-1234567890/adclients/ca-pub-1234567890
        #[arg(short = 'c', long)]
        ad_client: String,
    },
    /// Generate a daily report for an ad client over the trailing days
    Report {
        /// Account resource name
        #[arg(short, long)]
        account: String,
        /// Ad client reporting dimension ID, e.g. ca-pub-1234567890
        #[arg(short = 'c', long)]
        ad_client: String,
        /// Number of days before today to include
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_DAYS)]
        days: u32,
        /// Where to write the table
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Tsv)]
        output: OutputFormat,
        /// Destination file for csv output
        #[arg(short, long, default_value = "report.csv")]
        file: PathBuf,
        /// Spreadsheet title for sheets output
        #[arg(short, long, default_value = DEFAULT_SPREADSHEET_TITLE)]
        title: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Tsv,
    Csv,
    Sheets,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();
    init_tracing(cli.verbose);
    if let Err(e) = dotenv
        && !e.not_found()
    {
        warn!("ignoring unreadable .env file: {}", e);
    }
    let cfg = Config::from_env()?;
    let client = AdSenseClient::new(cfg)?;

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::Browse => browse_flow(&client).await?,
        Commands::Accounts => list_accounts_cmd(&client).await?,
        Commands::AdClients { account } => list_ad_clients_cmd(&client, &account).await?,
        Commands::AdUnits { ad_client } => list_ad_units_cmd(&client, &ad_client).await?,
        Commands::Report {
            account,
            ad_client,
            days,
            output,
            file,
            title,
        } => {
            let mut sink: Box<dyn TableSink + Send> = match output {
                OutputFormat::Tsv => Box::new(TsvSink::stdout()),
                OutputFormat::Csv => Box::new(CsvFileSink::new(file)),
                OutputFormat::Sheets => Box::new(SheetsSink::new(
                    client.config().access_token.clone(),
                    title,
                )?),
            };
            report_cmd(&client, &account, &ad_client, days, sink.as_mut()).await?
        }
    }

    Ok(())
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb
}

async fn list_accounts_cmd(client: &AdSenseClient) -> Result<()> {
    let found = client
        .for_each_account(|a| println!("{}", account_line(&a)))
        .await?;
    if found == 0 {
        println!("No accounts found.");
    }
    Ok(())
}

async fn list_ad_clients_cmd(client: &AdSenseClient, account_name: &str) -> Result<()> {
    let found = client
        .for_each_ad_client(account_name, |c| println!("{}", ad_client_line(&c)))
        .await?;
    if found == 0 {
        println!("No ad clients found.");
    }
    Ok(())
}

async fn list_ad_units_cmd(client: &AdSenseClient, ad_client_name: &str) -> Result<()> {
    let found = client
        .for_each_ad_unit(ad_client_name, |u| println!("{}", ad_unit_line(&u)))
        .await?;
    if found == 0 {
        println!("No ad units found.");
    }
    Ok(())
}

async fn report_cmd(
    client: &AdSenseClient,
    account_name: &str,
    reporting_dimension_id: &str,
    days: u32,
    sink: &mut (dyn TableSink + Send),
) -> Result<()> {
    let today = Local::now().date_naive();
    let query = ReportQuery::ad_client_daily(reporting_dimension_id, today, days)?;

    let pb = spinner("Generating report...");
    let report = client.generate_report(account_name, &query).await;
    pb.finish_and_clear();
    let report = report?;

    for w in &report.warnings {
        warn!("report warning: {}", w);
    }
    let table = Table::from(&report);
    if table.is_empty() {
        println!("No rows returned.");
        return Ok(());
    }

    let dest = sink.write_table(&table).await?;
    println!(
        "Report with {} rows for {}..{} written to {}",
        table.rows.len(),
        query.start_date(),
        query.end_date(),
        dest
    );
    Ok(())
}

async fn browse_flow(client: &AdSenseClient) -> Result<()> {
    let theme = ColorfulTheme::default();

    let accounts = {
        let pb = spinner("Loading accounts...");
        let a = client.list_accounts().await;
        pb.finish_and_clear();
        a?
    };
    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }

    loop {
        let mut items: Vec<String> = accounts.iter().map(account_label).collect();
        items.push("Exit".into());
        let idx = Select::with_theme(&theme)
            .with_prompt("Select an account")
            .default(0)
            .items(&items)
            .interact()?;
        if idx == items.len() - 1 {
            return Ok(());
        }
        let account = &accounts[idx];

        let ad_clients = {
            let pb = spinner("Loading ad clients...");
            let c = client.list_ad_clients(&account.name).await;
            pb.finish_and_clear();
            c?
        };
        if ad_clients.is_empty() {
            println!("No ad clients found.");
            continue;
        }

        if !ad_clients_menu(client, &theme, &account.name, &ad_clients).await? {
            return Ok(());
        }
    }
}

/// Returns `false` when the user chose to exit.
async fn ad_clients_menu(
    client: &AdSenseClient,
    theme: &ColorfulTheme,
    account_name: &str,
    ad_clients: &[AdClient],
) -> Result<bool> {
    loop {
        let mut items: Vec<String> = ad_clients.iter().map(ad_client_label).collect();
        items.push("Back".into());
        items.push("Exit".into());
        let idx = Select::with_theme(theme)
            .with_prompt("Select an ad client")
            .default(0)
            .items(&items)
            .interact()?;
        if idx == items.len() - 1 {
            return Ok(false);
        }
        if idx == items.len() - 2 {
            return Ok(true);
        }
        let ad_client = &ad_clients[idx];

        let actions = vec!["List ad units", "Generate report", "Back", "Exit"];
        let aidx = Select::with_theme(theme)
            .with_prompt("Choose action")
            .items(&actions)
            .default(0)
            .interact()?;
        match aidx {
            0 => {
                let pb = spinner("Loading ad units...");
                let units = client.list_ad_units(&ad_client.name).await;
                pb.finish_and_clear();
                match units {
                    Ok(list) if list.is_empty() => println!("No ad units found."),
                    Ok(list) => list.iter().for_each(|u| println!("{}", ad_unit_line(u))),
                    Err(e) => eprintln!("Failed to list ad units: {}", e),
                }
            }
            1 => {
                let dimension_id = if ad_client.reporting_dimension_id.is_empty() {
                    resource_id(&ad_client.name)
                } else {
                    ad_client.reporting_dimension_id.as_str()
                };
                let mut sink = TsvSink::stdout();
                if let Err(e) = report_cmd(
                    client,
                    account_name,
                    dimension_id,
                    DEFAULT_WINDOW_DAYS,
                    &mut sink,
                )
                .await
                {
                    eprintln!("Failed to generate report: {}", e);
                }
            }
            2 => continue,
            _ => return Ok(false),
        }
    }
}

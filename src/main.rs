#[tokio::main]
async fn main() -> anyhow::Result<()> {
    adreport::cli::run_cli().await
}

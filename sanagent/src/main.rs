#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sanagent::run_cli().await
}

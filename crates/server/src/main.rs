#[tokio::main]
async fn main() -> anyhow::Result<()> {
    persona_server::start().await
}

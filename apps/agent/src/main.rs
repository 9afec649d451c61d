#[tokio::main]
async fn main() -> anyhow::Result<()> {
    anki_vault_sync::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vocal_backend::run().await
}

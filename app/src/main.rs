#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fbcash_lib::run().await
}

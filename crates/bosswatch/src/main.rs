//! Binary entry point for the bosswatch scouting client.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lib_bosswatch::init().await
}

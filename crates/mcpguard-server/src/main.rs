#[tokio::main]
async fn main() {
    if let Err(e) = mcpguard_server::cli::run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

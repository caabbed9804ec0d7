#[tokio::main]
async fn main() {
    if let Err(e) = customer_flow_report::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

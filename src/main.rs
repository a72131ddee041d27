use analytics_mcp::config::Config;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("analytics-mcp: {}", err);
            std::process::exit(2);
        }
    };
    if let Err(err) = analytics_mcp::mcp::server::run_stdio(config).await {
        eprintln!("analytics-mcp: {}", err);
        std::process::exit(1);
    }
}

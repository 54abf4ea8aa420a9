use course_allocation::data::sample_input;
use course_allocation::server::{self, DEFAULT_ADDR};
use course_allocation::{HighsAdapter, ScenarioConfig, solve};
use log::error;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if std::env::args().nth(1).as_deref() == Some("serve") {
        let addr = std::env::var("ALLOCATION_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        if let Err(e) = server::run_server(&addr).await {
            error!("Server on {} failed: {}", addr, e);
            std::process::exit(1);
        }
        return;
    }

    let input = sample_input();
    let mut failed = false;
    for config in [ScenarioConfig::base(), ScenarioConfig::advanced()] {
        let result = HighsAdapter::for_scenario(&config)
            .and_then(|adapter| solve(&input, &config, &adapter));
        match result {
            Ok(report) => println!("\n{}", report),
            Err(e) => {
                eprintln!("{}: {}", config.name, e);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}

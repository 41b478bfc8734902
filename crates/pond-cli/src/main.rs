use std::env;
use std::net::SocketAddr;

use chrono::Utc;
use contracts::{EngineConfig, HarvestRequest, HarvestType, PondGeometry, Role};
use pond_api::{serve, EngineApi};

fn print_usage() {
    println!("pond-cli <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  demo <farm_id> [sqlite_path]");
    println!("    stocks, samples, and harvests one pond and persists to sqlite");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn default_sqlite_path() -> String {
    std::env::var("POND_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "pond_ledger.sqlite".to_string())
}

fn parse_sqlite_path(value: Option<&String>) -> String {
    value
        .map(String::to_string)
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(default_sqlite_path)
}

fn run_demo(args: &[String]) -> Result<(), String> {
    let farm_id = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing farm_id".to_string())?;
    let sqlite_path = parse_sqlite_path(args.get(3));

    let api = EngineApi::with_sqlite_store(EngineConfig::default(), &sqlite_path)
        .map_err(|err| format!("failed to open sqlite store: {err}"))?;
    let role = Role::Admin;

    let pond = api
        .create_pond(
            role,
            &farm_id,
            "kolam demo",
            Some(PondGeometry {
                length_m: 10.0,
                width_m: 5.0,
                depth_m: 2.0,
            }),
        )
        .map_err(|err| format!("create pond failed: {err}"))?;
    api.apply_delta(role, &pond.pond_id, 5000, "stocking", Utc::now())
        .map_err(|err| format!("stocking failed: {err}"))?;
    api.apply_delta(role, &pond.pond_id, -200, "mortality correction", Utc::now())
        .map_err(|err| format!("correction failed: {err}"))?;
    api.record_sampling(role, &pond.pond_id, 10.0, None, Utc::now())
        .map_err(|err| format!("sampling failed: {err}"))?;

    let harvest = api
        .record_harvest(
            role,
            &pond.pond_id,
            &HarvestRequest {
                weight_kg: 80.0,
                count: 800,
                price_per_kg: 25_000.0,
                harvest_type: HarvestType::Partial,
                note: Some("panen demo".to_string()),
                recorded_at: Utc::now(),
                buyer_id: Some("buyer_demo".to_string()),
            },
        )
        .map_err(|err| format!("harvest failed: {err}"))?;

    let record = api
        .get_pond(&pond.pond_id)
        .map_err(|err| format!("read pond failed: {err}"))?;
    let classification = api
        .classification(&pond.pond_id)
        .map_err(|err| format!("classification failed: {err}"))?;
    let projection = api
        .projection(&pond.pond_id, None, None, 25_000.0, Utc::now().date_naive())
        .map_err(|err| format!("projection failed: {err}"))?;

    println!("{record}");
    println!(
        "classification: tier={:?} source={:?} insufficient_data={}",
        classification.tier, classification.source, classification.insufficient_data
    );
    if let Some(estimate) = projection.estimate() {
        println!(
            "projection: current_weight={}g days_remaining={} revenue={}",
            estimate.current_weight_g, estimate.days_remaining, estimate.projected_revenue
        );
    }
    println!(
        "harvest {} recorded (sale={}) sqlite={}",
        harvest.event_id,
        harvest.sale_id.as_deref().unwrap_or("none"),
        sqlite_path
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                let sqlite_path = default_sqlite_path();
                let api = match EngineApi::with_sqlite_store(EngineConfig::default(), &sqlite_path)
                {
                    Ok(api) => api,
                    Err(err) => {
                        eprintln!("failed to open sqlite store {sqlite_path}: {err}");
                        std::process::exit(1);
                    }
                };
                println!("serving pond api on http://{addr} (sqlite={sqlite_path})");
                if let Err(err) = serve(addr, api).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {}", err);
                print_usage();
                std::process::exit(2);
            }
        },
        Some("demo") => {
            if let Err(err) = run_demo(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}

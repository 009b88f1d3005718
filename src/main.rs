use std::path::Path;

use escape_route_model::{run_scenarios, write_results_csv, ModelConfig, RouteModel};
use env_logger;


fn run(config_path: &Path) -> escape_route_model::Result<()> {
    let config = ModelConfig::from_file(config_path)?;
    let model = RouteModel::from_config(&config)?;
    let results = run_scenarios(&model, &config.scenarios);

    let mut rows = vec![];
    for (params, result) in config.scenarios.iter().zip(results) {
        match result {
            Ok(result) => rows.push((params.name.clone(), result)),
            Err(err) => log::warn!("scenario {} failed: {}", params.name, err),
        }
    }
    write_results_csv(&config.output_path, &rows)?;
    log::info!("wrote {} of {} scenario results to {}", rows.len(), config.scenarios.len(),
               config.output_path.display());
    Ok(())
}

fn main () {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        let program = args.get(0).map_or("escape_route_model", |arg| arg.as_str());
        eprintln!("usage: {} <config.yaml>", program);
        std::process::exit(2);
    }
    if let Err(err) = run(Path::new(&args[1])) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

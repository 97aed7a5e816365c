use std::process::ExitCode;

use flowfield::config::FlowConfig;
use flowfield::error::SessionError;

const USAGE: &str = "usage: flowfield <model.glb|model.gltf> [settings.json]";

fn run(model_path: &str, settings_path: Option<&str>) -> Result<(), SessionError> {
    let config = match settings_path {
        Some(path) => FlowConfig::from_json_file(path)?,
        None => FlowConfig::default(),
    };
    flowfield::run(model_path, config)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(model_path) = args.first() else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    match run(model_path, args.get(1).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

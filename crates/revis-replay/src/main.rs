//! Replay an input script against a scene and print what the host observed.
//!
//! Usage: `revis-replay <scene.json> <script.json>`

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let [_, scene, script] = args.as_slice() else {
        eprintln!("Usage: revis-replay <scene.json> <script.json>");
        return ExitCode::FAILURE;
    };
    log::info!("Replaying {script} against {scene}");

    let report = match revis_replay::replay_files(scene, script) {
        Ok(report) => report,
        Err(err) => {
            log::error!("Replay failed: {err}");
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Failed to serialize report: {err}");
            ExitCode::FAILURE
        }
    }
}

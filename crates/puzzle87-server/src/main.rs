use clap::Parser;
use mimalloc::MiMalloc;
use puzzle87_core::search::enumerate_solutions_with;
use puzzle87_server::config::{Command, Config};
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    match config.command() {
        Command::Solve => {
            let report = enumerate_solutions_with(config.search_mode());
            for solution in &report.solutions {
                println!("{:?}", solution);
            }
            println!(
                "{} solutions from {} permutations ({:.4}%) in {} ms",
                report.solutions.len(), report.stats.leaves, report.stats.acceptance_rate() * 100.0, report.elapsed_ms()
            );
            ExitCode::SUCCESS
        }
        Command::Serve => {
            let service = match puzzle87_server::build_service(&config) {
                Ok(service) => service,
                Err(err) => {
                    log::error!("cannot open store: {err}");
                    return ExitCode::FAILURE;
                }
            };
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    log::error!("cannot start runtime: {err}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(err) = runtime.block_on(puzzle87_server::start_server(config.bind, service)) {
                log::error!("server stopped: {err}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}

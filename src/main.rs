use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use decaylink::cli::{Cli, Commands};
use decaylink::config::{StaticConfig, validate_static_config};
use decaylink::errors::DecaylinkError;
use decaylink::runtime::modes::run_server;
use decaylink::system::init_logging;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output, force }) = &cli.command {
        return match generate_config(output.as_deref(), *force) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        };
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    // 日志 guard 需要存活到进程结束
    let guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = run_server(&config).await;
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    drop(guard);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn load_config(cli: &Cli) -> Result<StaticConfig, DecaylinkError> {
    let mut config = StaticConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config)?;
    validate_static_config(&config)?;
    Ok(config)
}

fn generate_config(output: Option<&str>, force: bool) -> Result<(), DecaylinkError> {
    let Some(output) = output else {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    };

    if Path::new(output).exists() && !force {
        return Err(DecaylinkError::file_operation(format!(
            "{} already exists, use --force to overwrite",
            output
        )));
    }
    StaticConfig::default().save_to_file(output)?;
    eprintln!("Sample configuration written to {}", output);
    Ok(())
}

fn fail(error: &DecaylinkError) -> ExitCode {
    eprintln!("{}", error.format_colored());
    ExitCode::FAILURE
}

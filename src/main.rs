use std::process::ExitCode;

use clap::Parser;
use crossbeam_channel::bounded;
use log::error;

use recent::config::Cli;
use recent::listen::listen;
use recent::logging::init_logging;
use recent::RecentError;

fn run() -> Result<(), RecentError> {
  let cli = Cli::parse();
  let config = cli.command.into_listen_config()?;

  let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
  ctrlc::set_handler(move || {
    // повторный сигнал при полном канале просто игнорируем
    let _ = shutdown_tx.try_send(());
  })?;

  listen(&config, &shutdown_rx)?;
  Ok(())
}

fn main() -> ExitCode {
  init_logging();

  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{e}");
      ExitCode::FAILURE
    }
  }
}

use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle, WriteMode};
use log::{error, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tspga::error::Result;
use tspga::param::{self, Param};
use tspga::{cinfo, run};

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn custom_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> std::io::Result<()> {
    write!(
        w,
        "{} [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        &record.args()
    )
}

fn start_logger(param: &Param) -> std::result::Result<LoggerHandle, flexi_logger::FlexiLoggerError> {
    let logger = Logger::try_with_str(&param.general.log_level)?;

    if param.general.log_base.is_empty() {
        logger.format(custom_format).start()
    } else {
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        logger
            .log_to_file(
                FileSpec::default()
                    .basename(format!("{}_{}", param.general.log_base, timestamp))
                    .suffix(&param.general.log_suffix)
                    .suppress_timestamp(),
            )
            .write_mode(WriteMode::Direct)
            .duplicate_to_stderr(Duplicate::All)
            .format(custom_format)
            .start()
    }
}

/// Clears `running` on the first SIGINT or SIGTERM; the current generation still completes.
fn watch_signals(running: Arc<AtomicBool>) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            warn!("Received signal {}, stopping after the current generation...", signal);
            running.store(false, Ordering::Relaxed);
        }
    });
    Ok(())
}

fn save_outputs(param: &Param, exp: &tspga::experiment::Experiment) -> Result<()> {
    if !param.general.save_exp.is_empty() {
        exp.save_auto(&param.general.save_exp)?;
        info!("Experiment saved to {}", param.general.save_exp);
    }
    if !param.general.save_tour_csv.is_empty() {
        exp.save_tour_csv(&param.general.save_tour_csv)?;
        info!("Best tour saved to {}", param.general.save_tour_csv);
    }
    if !param.general.save_trace_csv.is_empty() {
        exp.save_trace_csv(&param.general.save_trace_csv)?;
        info!("Distance trace saved to {}", param.general.save_trace_csv);
    }
    Ok(())
}

fn main() {
    let param_path = std::env::args().nth(1).unwrap_or_else(|| "param.yaml".to_string());

    let param = match param::get(&param_path) {
        Ok(param) => param,
        Err(e) => {
            eprintln!("Cannot read parameters from {}: {}", param_path, e);
            process::exit(1);
        }
    };

    let _logger = match start_logger(&param) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Cannot start logger: {}", e);
            process::exit(1);
        }
    };

    info!("tspga v{}", tspga::tspga_version());
    info!("Parameters read from {}", param_path);

    let running = Arc::new(AtomicBool::new(true));
    if let Err(e) = watch_signals(Arc::clone(&running)) {
        warn!("Signals cannot be watched, the run can only stop by itself: {}", e);
    }

    let exp = match run(&param, running) {
        Ok(exp) => exp,
        Err(e) => {
            error!("Run failed: {}", e);
            process::exit(1);
        }
    };

    cinfo!(param.general.display_colorful, "{}", exp.display_results());

    if let Err(e) = save_outputs(&param, &exp) {
        error!("Cannot save results: {}", e);
        process::exit(1);
    }
}

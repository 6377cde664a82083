// main.rs — ember client entry point.
//
// Startup order matters: logging first so every later failure is visible,
// then the panic hook so even config/bootstrap crashes leave a report.

use std::path::Path;
use std::process;

use log::LevelFilter;

use ember_client::client::ClientInstance;
use ember_client::config::{self, ClientConfig, LaunchOptions};
use ember_common::crash::{self, CrashReport};
use ember_common::logger;
use ember_common::sysinfo::SystemInfo;

fn main() {
    let opts = match LaunchOptions::parse(std::env::args().skip(1)) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", LaunchOptions::USAGE);
            process::exit(2);
        }
    };

    if opts.help {
        println!("{}", LaunchOptions::USAGE);
        return;
    }

    if let Some(dir) = &opts.data_dir {
        if let Err(e) = config::enter_data_dir(Path::new(dir)) {
            eprintln!("{}", e);
            process::exit(2);
        }
    }

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    match logger::init(level, Some(Path::new("logs"))) {
        Ok(Some(path)) => log::info!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => eprintln!("Logger setup failed: {}", e),
    }

    crash::install_panic_hook();

    log::info!("Ember client starting");
    log::info!("System:\n{}", SystemInfo::probe().render().trim_end());

    let config = ClientConfig::load(&opts);
    let mut client = ClientInstance::new(config);

    if let Err(error) = client.run() {
        log::error!("Fatal: {}", error);

        let report = CrashReport::new("Client startup failed", error).with_module("client");
        match report.save() {
            Ok(path) => log::error!("Crash report written to {}", path.display()),
            Err(e) => log::error!("Failed to write crash report: {}", e),
        }

        process::exit(1);
    }
}

use framepump::HarnessConfig;

fn main() {
    env_logger::init();

    let config = match HarnessConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}\n{}", err, framepump::USAGE);
            std::process::exit(1);
        }
    };

    if let Err(err) = framepump::run(config) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

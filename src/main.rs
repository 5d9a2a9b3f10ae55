use human_panic::setup_panic;
use tariff_ets::cli::run_cli;

fn main() {
    setup_panic!();

    if let Err(err) = run_cli() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

use bot_commons::start_everything;

fn main() {
    if let Err(e) = start_everything("WARN,npepe_bot=debug,bot_commons=info", npepe_bot::entry()) {
        eprintln!("Failed to start the async runtime: {e}");
        std::process::exit(1);
    }
}

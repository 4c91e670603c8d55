fn main() {
    if let Err(e) = commute_lib::run() {
        eprintln!("ComMute failed: {}", e);
        std::process::exit(1);
    }
}

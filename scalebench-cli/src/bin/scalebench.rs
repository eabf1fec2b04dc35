fn main() {
    if let Err(e) = scalebench_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn main() {
    if let Err(err) = sni_gap::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

use std::process;

fn main() {
    if let Err(err) = certbind::cli::run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

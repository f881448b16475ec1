fn main() {
    match sddlint::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("sddlint: error: {}", err);
            std::process::exit(2);
        }
    }
}

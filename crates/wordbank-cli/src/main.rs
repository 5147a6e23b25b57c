mod cli;

use wordbank_core::api::ApiError;

fn main() {
    if let Err(e) = cli::run() {
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Cancelled)) {
            std::process::exit(130);
        }
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}

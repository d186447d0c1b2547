use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match batchlabel::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "batchlabel exited with an error");
            eprintln!("batchlabel: {e}");
            ExitCode::FAILURE
        }
    }
}

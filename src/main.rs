use problem_fetch::{Runner, RunnerConfig, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    let outcome = Runner::new(RunnerConfig::default()).run().await;
    println!("{outcome}");
}

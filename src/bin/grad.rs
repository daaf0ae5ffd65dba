use symgrad::{Error, GradientProblem};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let mut out = String::new();
    GradientProblem::default().write_gradient(&mut out)?;
    print!("{out}");
    Ok(())
}

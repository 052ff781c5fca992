/// Print the static version line.
pub fn run() -> anyhow::Result<()> {
    println!("kube-node-pod version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

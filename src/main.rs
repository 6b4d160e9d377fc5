use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cfg = passkey_custody::config::Config::parse();
    passkey_custody::init_logging(cfg.verbose);
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(passkey_custody::run(cfg))
}

use std::path::Path;

use crate::config::{Config, PresenceMode};

pub fn check(cfg: &Config, data_dir: &Path) -> anyhow::Result<()> {
    let mut errors: Vec<String> = Vec::new();

    // Check 1: data dir writable
    let probe = data_dir.join(".write-test");
    match std::fs::create_dir_all(data_dir).and_then(|_| std::fs::write(&probe, b"")) {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
        }
        Err(e) => errors.push(format!(
            "cannot write to {}: {e}\n  \
             → pass a writable directory with --data-dir",
            data_dir.display()
        )),
    }

    // Check 2: pinentry binary found, only when it will be used
    if cfg.presence == PresenceMode::Pinentry {
        if let Err(e) = std::process::Command::new(&cfg.pinentry)
            .arg("--version")
            .output()
        {
            errors.push(format!(
                "pinentry binary not found: '{}': {e}\n  \
                 → install pinentry, or pass --presence approve for unattended use",
                cfg.pinentry
            ));
        }
    }

    // Check 3: origin looks like an origin
    if !cfg.origin.contains("://") {
        errors.push(format!(
            "--origin '{}' has no scheme\n  \
             → use a full origin such as https://localhost",
            cfg.origin
        ));
    }

    if errors.is_empty() {
        return Ok(());
    }

    for err in &errors {
        eprintln!("ERROR: {err}");
    }
    anyhow::bail!("{} preflight check(s) failed", errors.len());
}

use webrunner::config::ServicesConfig;
use webrunner::endpoints::{default_endpoints, summarize};

pub(crate) fn cmd_services(config: &ServicesConfig) {
    if config.services.is_empty() {
        println!("No services declared");
        return;
    }

    println!(
        "Toolchain: {} {}",
        config.toolchain.program,
        config.toolchain.args.join(" ")
    );
    println!();
    println!("{:<24} {:<6} {:<16} DESCRIPTION", "PATH", "PORT", "BINARY");
    for svc in &config.services {
        println!(
            "{:<24} {:<6} {:<16} {}",
            svc.path.display(),
            svc.port,
            svc.binary_name,
            svc.description
        );
    }
}

pub(crate) fn cmd_endpoints() -> anyhow::Result<()> {
    let list = summarize(&default_endpoints());
    println!("{}", serde_json::to_string_pretty(&list)?);
    Ok(())
}

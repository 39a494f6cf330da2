//! Backend listing

use anyhow::Result;
use colored::*;
use relay_executor::ExecutorRegistry;

/// Print every registered backend
pub fn list_backends() -> Result<()> {
    let registry = ExecutorRegistry::with_builtin();

    println!("{}", "Available backends:".bold());
    println!();
    for plugin in registry.plugins() {
        let settings = plugin.common_settings();
        println!("  {} {}", "▸".cyan(), plugin.name().bold());
        println!("    {}", plugin.description().dimmed());
        println!(
            "    Remote execution: {}",
            if settings.non_local_exec {
                "yes".green()
            } else {
                "no".yellow()
            }
        );
        println!();
    }

    Ok(())
}

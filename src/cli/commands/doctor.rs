//! cli::commands::doctor
//!
//! Environment and project health report.
//!
//! Doctor never fails the command for a finding; problems are printed as
//! warnings so the whole report always runs.

use crate::cli::commands::CommandContext;
use crate::config::project::find_project_root;
use crate::config::ProjectConfigStore;
use crate::error::Result;
use crate::hooks::{executor_for, HookExecOpts, SdkConfig};

/// Run the doctor command.
pub async fn doctor(ctx: &CommandContext) -> Result<()> {
    ctx.io.section("Slack CLI");
    ctx.io.print(format!("   version: {}", env!("CARGO_PKG_VERSION")));

    ctx.io.section("Configuration");
    ctx.io
        .print(format!("   directory: {}", ctx.config_dir.display()));
    match ctx.system.system_id() {
        Ok(id) => ctx.io.print(format!("   system ID: {}", id)),
        Err(err) => ctx.io.warn(format!("failed to read the system ID: {}", err)),
    }

    ctx.io.section("Credentials");
    match ctx.auth.list().await {
        Ok(auths) if auths.is_empty() => {
            ctx.io.print("   none saved; run `slack login`");
        }
        Ok(auths) => {
            ctx.io.print(format!("   {} workspace(s) saved", auths.len()));
        }
        Err(err) => ctx.io.warn(format!("failed to read credentials: {}", err)),
    }

    ctx.io.section("Project");
    let cwd = std::env::current_dir()?;
    match find_project_root(&cwd) {
        None => {
            ctx.io.print("   not inside a project directory");
        }
        Some(root) => {
            ctx.io.print(format!("   root: {}", root.display()));
            report_project(ctx, &root);
        }
    }
    Ok(())
}

fn report_project(ctx: &CommandContext, root: &std::path::Path) {
    let store = ProjectConfigStore::new(root);
    match store.manifest_source() {
        Ok(source) => ctx.io.print(format!("   manifest source: {}", source)),
        Err(err) => ctx.io.warn(format!("manifest source: {}", err)),
    }

    match SdkConfig::load(root) {
        Err(err) => ctx.io.warn(format!("hooks: {}", err)),
        Ok(config) => {
            if let Some(ref runtime) = config.runtime {
                ctx.io.print(format!("   runtime: {}", runtime));
            }
            let hooks = &config.hooks;
            let available: Vec<&str> = [
                &hooks.build_project,
                &hooks.check_update,
                &hooks.deploy,
                &hooks.doctor,
                &hooks.get_hooks,
                &hooks.get_manifest,
                &hooks.get_trigger,
                &hooks.install_update,
                &hooks.start,
            ]
            .into_iter()
            .filter(|hook| hook.is_available())
            .map(|hook| hook.name.as_str())
            .collect();
            if available.is_empty() {
                ctx.io.print("   hooks: none configured");
            } else {
                ctx.io.print(format!("   hooks: {}", available.join(", ")));
            }

            // The SDK can report its own diagnostics.
            if config.hooks.doctor.is_available() {
                let executor = executor_for(ctx.io, &config);
                let opts = HookExecOpts {
                    hook: config.hooks.doctor.clone(),
                    directory: Some(root.to_path_buf()),
                    ..Default::default()
                };
                match executor.execute(&opts) {
                    Ok(response) if !response.is_empty() => {
                        ctx.io.print(format!("   doctor hook: {}", response));
                    }
                    Ok(_) => {}
                    Err(err) => ctx.io.warn(format!("doctor hook failed: {}", err)),
                }
            }
        }
    }
}

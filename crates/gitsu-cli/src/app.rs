//! `configure -> resolve -> dissect -> install`, wired together for a
//! single project directory (spec §2, orchestration layer).

use crate::commands::{Cli, RunArgs};
use crate::prompt::TerminalPrompter;
use gitsu_config::ConfigLoader;
use gitsu_core::{AHashMap, Manifest};
use gitsu_deployer::{Deployer, NoopHookRunner};
use gitsu_repository::{FilesystemFetcher, Fetcher};
use gitsu_resolutions::ResolutionsStore;
use gitsu_resolver::{Engine, TargetSpec};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const MANIFEST: &str = "gitsu.json";
const RESOLUTIONS_FILE: &str = ".gitsu-resolutions.json";

pub async fn run(cli: &Cli, args: &RunArgs, fresh: bool) -> anyhow::Result<()> {
    let project_dir = cli.cwd.clone().unwrap_or(std::env::current_dir()?);

    let mut config = ConfigLoader::new(&project_dir).load()?;
    config.production |= cli.production;
    config.force |= cli.force;
    config.force_latest |= cli.force_latest;
    if cli.no_interaction {
        config.interactive = false;
    }
    if config.components_dir.is_relative() {
        config.components_dir = project_dir.join(&config.components_dir);
    }

    let manifest_path = project_dir.join(MANIFEST);
    let manifest: Manifest = gitsu_core::from_json(&tokio::fs::read_to_string(&manifest_path).await?)?;

    let targets = collect_targets(&manifest, &args.packages, config.production);
    if targets.is_empty() {
        println!("Nothing to install.");
        return Ok(());
    }

    let installed = scan_installed(&config.components_dir).await;

    let resolutions_store = ResolutionsStore::new(project_dir.join(RESOLUTIONS_FILE));
    let resolutions = if fresh { AHashMap::new() } else { resolutions_store.load()? };

    let fetchers: Vec<Arc<dyn Fetcher>> = vec![Arc::new(FilesystemFetcher::new(&project_dir))];
    let mut engine = Engine::new(config, fetchers, installed, resolutions);
    if engine.config().interactive {
        engine = engine.with_prompter(Arc::new(TerminalPrompter));
    }

    // This embedding never carries incompatibles across runs yet; the slot
    // exists so one can be threaded in from a future persisted record.
    let outcome = engine.resolve(targets, Vec::new()).await?;
    resolutions_store.save(&outcome.resolutions)?;

    info!(count = outcome.elected.len(), "deploying elected endpoints");
    let (config, arena) = engine.config_and_arena_mut();
    let mut deployer = Deployer::new(config, arena);
    let report = deployer.deploy(&outcome, &NoopHookRunner).await?;

    println!("{}", gitsu_core::to_json_pretty(&report)?);
    Ok(())
}

fn collect_targets(manifest: &Manifest, only: &[String], production: bool) -> Vec<TargetSpec> {
    let mut deps: Vec<(&String, &String)> = manifest.dependencies.iter().collect();
    if !production {
        deps.extend(manifest.dev_dependencies.iter());
    }
    deps.into_iter()
        .filter(|(name, _)| only.is_empty() || only.iter().any(|n| n == *name))
        .map(|(name, value)| {
            let (source, target) = split_dependency_value(name, value);
            TargetSpec { source, target, name: Some(name.clone()) }
        })
        .collect()
}

/// Same `source#target` / bare-target convention the Fetch Coordinator
/// applies when expanding a fetched manifest's own dependencies.
fn split_dependency_value(key: &str, value: &str) -> (String, String) {
    if let Some((source, target)) = value.split_once('#') {
        (source.to_string(), target.to_string())
    } else {
        (key.to_string(), value.to_string())
    }
}

async fn scan_installed(components_dir: &Path) -> AHashMap<String, Manifest> {
    let mut installed = AHashMap::new();
    let Ok(mut entries) = tokio::fs::read_dir(components_dir).await else {
        return installed;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(file_type) = entry.file_type().await else { continue };
        if !file_type.is_dir() {
            continue;
        }
        let rid = entry.file_name().to_string_lossy().into_owned();
        let manifest_path = entry.path().join(".gitsu.json");
        if let Ok(content) = tokio::fs::read_to_string(&manifest_path).await
            && let Ok(manifest) = gitsu_core::from_json::<Manifest>(&content)
        {
            installed.insert(rid, manifest);
        }
    }
    installed
}

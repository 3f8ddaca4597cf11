//! The `Config` type: every option the core consults.

use std::path::PathBuf;

/// Options recognized by the resolution engine.
///
/// Every field here is read somewhere in `gitsu-resolver` or
/// `gitsu-deployer` — this is deliberately not a general-purpose settings
/// bag, since manifest-file loading and CLI flag parsing are boundary
/// concerns outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Skip `devDependencies` during dependency expansion.
    pub production: bool,
    /// Redeploy even when installed metadata already matches the target.
    pub force: bool,
    /// On conflict, automatically elect the highest candidate and persist
    /// the choice instead of prompting.
    pub force_latest: bool,
    /// Allow the Conflict Resolver to prompt interactively.
    pub interactive: bool,
    /// Scratch directory external resolvers may use while fetching.
    pub tmp: PathBuf,
    /// Deployment root; elected revisions land at `components_dir/rId`.
    pub components_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            production: false,
            force: false,
            force_latest: false,
            interactive: true,
            tmp: std::env::temp_dir().join("gitsu"),
            components_dir: PathBuf::from("gitsu_components"),
        }
    }
}

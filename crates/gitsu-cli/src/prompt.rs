//! Terminal implementation of [`gitsu_resolver::ConflictPrompter`]: the only
//! concrete conflict UI the core is aware of, injected from outside.

use dialoguer::Select;
use gitsu_resolver::ConflictPrompter;

#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl ConflictPrompter for TerminalPrompter {
    fn prompt(&self, rid: &str, candidates: &[String]) -> Option<usize> {
        Select::new()
            .with_prompt(format!("Unable to find a satisfactory version for '{rid}', please choose one"))
            .items(candidates)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
    }
}

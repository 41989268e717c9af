use uuid::Uuid;

use crate::model::IdGenerator;
use crate::modules::combination::PermutationSuffixes;
use crate::modules::metadata::SampleDirectory;

/// State owned by one pipeline run.
#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub ids: IdGenerator,
    pub suffixes: PermutationSuffixes,
    pub samples: SampleDirectory,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            ids: IdGenerator::new(),
            suffixes: PermutationSuffixes::new(),
            samples: SampleDirectory::new(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

//! Column naming from recognisable value patterns.

use regex::Regex;

use crate::config::PatternSetting;
use crate::model::CommonModel;
use crate::modules::metadata::SampleDirectory;
use crate::modules::ModuleResult;

const SAMPLE_SIZE: usize = 20;
const MIN_HITS: usize = 3;
const MAX_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone)]
struct NamedPattern {
    name: String,
    regex: Regex,
}

/// Names non-numeric columns after the pattern most of their values match,
/// e.g. a column full of addresses becomes `Email`.
#[derive(Debug, Clone)]
pub struct PatternNames {
    patterns: Vec<NamedPattern>,
}

impl PatternNames {
    pub fn new(settings: &[PatternSetting]) -> Result<Self, regex::Error> {
        let patterns = settings
            .iter()
            .map(|p| {
                Ok(NamedPattern {
                    name: p.name.clone(),
                    regex: Regex::new(&p.regex)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }

    pub async fn refine(&self, model: &mut CommonModel, samples: &SampleDirectory) -> ModuleResult<()> {
        for table in model.table_ids().to_vec() {
            for column in model.table(table).columns().to_vec() {
                if model.column(column).datatype().is_numeric() {
                    continue;
                }
                let source = model.column(column).source().clone();
                let sample = samples.column_sample(&source, SAMPLE_SIZE).await?;
                if let Some((name, confidence)) = self.guess(&sample) {
                    if confidence > 0.01 {
                        model
                            .column_mut(column)
                            .add_name_candidate(name, confidence.min(MAX_CONFIDENCE));
                    }
                }
            }
        }
        Ok(())
    }

    /// Best pattern name for a sample and the share of values it matched.
    /// Patterns sharing a name pool their hits; earlier names win ties.
    fn guess(&self, sample: &[String]) -> Option<(String, f64)> {
        let mut hits: Vec<(&str, usize)> = Vec::new();
        for pattern in &self.patterns {
            let count = sample
                .iter()
                .filter(|v| pattern.regex.is_match(v.trim()))
                .count();
            match hits.iter_mut().find(|(name, _)| *name == pattern.name) {
                Some((_, total)) => *total += count,
                None => hits.push((pattern.name.as_str(), count)),
            }
        }

        let (name, best) = hits
            .into_iter()
            .fold(None, |acc: Option<(&str, usize)>, (name, count)| match acc {
                Some((_, top)) if top >= count => acc,
                _ => Some((name, count)),
            })?;
        if best <= MIN_HITS {
            return None;
        }
        Some((name.to_string(), best as f64 / sample.len() as f64))
    }
}

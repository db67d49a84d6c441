use std::ops::Deref;

use crate::alphabet::Alphabet;
use crate::pipeline::Pipeline;

/// A document encoded as vocabulary ids, in token order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSequence {
    pub features: Vec<usize>,
}

impl FeatureSequence {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.features
    }
}

impl Deref for FeatureSequence {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.features
    }
}

impl FromIterator<usize> for FeatureSequence {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: String,
    pub label: String,
    pub data: FeatureSequence,
}

/// Documents that went through the same pipeline and share one vocabulary.
#[derive(Debug, Clone)]
pub struct InstanceList {
    pipeline: Pipeline,
    alphabet: Alphabet,
    instances: Vec<Instance>,
}

impl InstanceList {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            alphabet: Alphabet::new(),
            instances: Vec::new(),
        }
    }

    pub fn add_thru_pipe(&mut self, name: impl Into<String>, label: impl Into<String>, text: &str) {
        let data = self.pipeline.features(text, &mut self.alphabet);
        self.instances.push(Instance {
            name: name.into(),
            label: label.into(),
            data,
        });
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn num_tokens(&self) -> usize {
        self.instances.iter().map(|inst| inst.data.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.instances.iter()
    }
}

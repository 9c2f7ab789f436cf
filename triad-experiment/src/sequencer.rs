use triad_core::{Stimulus, StimulusSet};

/// Walks the stimulus set in listed order for the free-text task.
/// Not restartable: build a new one to start over.
#[derive(Debug, Clone)]
pub struct DescriptorSequencer {
    stimuli: StimulusSet,
    next: usize,
}

impl DescriptorSequencer {
    pub fn new(stimuli: StimulusSet) -> Self {
        Self { stimuli, next: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.stimuli.len().saturating_sub(self.next)
    }
}

impl Iterator for DescriptorSequencer {
    type Item = Stimulus;

    fn next(&mut self) -> Option<Stimulus> {
        let stim = self.stimuli.get(self.next)?.clone();
        self.next += 1;
        Some(stim)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

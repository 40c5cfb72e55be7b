//! Stateless filters that remove interactions violating privacy or validity
//! rules.
//!
//! Each criterion drops interactions matching one condition. The conditions
//! are independent, so criteria commute; [`CriteriaPipeline`] keeps them in
//! order only so each step can be logged.

use std::collections::HashSet;

use crate::{
  identity::fold,
  interaction::Interaction,
  time_range::TimeRange,
};

/// A filter over a batch of interactions.
pub trait InteractionCriteria: Send + Sync {
  fn name(&self) -> &'static str;

  /// Whether `interaction` survives this criterion.
  fn accepts(&self, interaction: &Interaction) -> bool;

  fn filter(&self, mut interactions: Vec<Interaction>) -> Vec<Interaction> {
    interactions.retain(|i| self.accepts(i));
    interactions
  }
}

/// Drops interactions whose source and target are the same person.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonSelfInteractionCriteria;

impl InteractionCriteria for NonSelfInteractionCriteria {
  fn name(&self) -> &'static str { "non-self" }

  fn accepts(&self, interaction: &Interaction) -> bool {
    fold(interaction.source().id().primary_id())
      != fold(interaction.target().id().primary_id())
  }
}

/// Drops interactions with a bot on either side.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonBotInteractionCriteria;

impl InteractionCriteria for NonBotInteractionCriteria {
  fn name(&self) -> &'static str { "non-bot" }

  fn accepts(&self, interaction: &Interaction) -> bool {
    !interaction.source().is_bot() && !interaction.target().is_bot()
  }
}

/// Drops interactions where neither side belongs to the organization.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonExternalToExternalCriteria;

impl InteractionCriteria for NonExternalToExternalCriteria {
  fn name(&self) -> &'static str { "non-external-to-external" }

  fn accepts(&self, interaction: &Interaction) -> bool {
    !(interaction.source().is_external() && interaction.target().is_external())
  }
}

/// Drops interactions whose (bucketed) timestamp is outside the sync window.
#[derive(Debug, Clone, Copy)]
pub struct TimeRangeInteractionCriteria {
  range: TimeRange,
}

impl TimeRangeInteractionCriteria {
  pub fn new(range: TimeRange) -> Self { Self { range } }
}

impl InteractionCriteria for TimeRangeInteractionCriteria {
  fn name(&self) -> &'static str { "time-range" }

  fn accepts(&self, interaction: &Interaction) -> bool {
    self.range.contains(interaction.timestamp())
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// An ordered list of criteria applied one after another.
#[derive(Default)]
pub struct CriteriaPipeline {
  criteria: Vec<Box<dyn InteractionCriteria>>,
}

impl CriteriaPipeline {
  pub fn new() -> Self { Self::default() }

  /// The full privacy rule set: no self-edges, no bot edges, no
  /// external-to-external edges, nothing outside `range`.
  pub fn standard(range: TimeRange) -> Self {
    Self::new()
      .with(NonSelfInteractionCriteria)
      .with(NonBotInteractionCriteria)
      .with(NonExternalToExternalCriteria)
      .with(TimeRangeInteractionCriteria::new(range))
  }

  pub fn with(mut self, criteria: impl InteractionCriteria + 'static) -> Self {
    self.criteria.push(Box::new(criteria));
    self
  }

  pub fn len(&self) -> usize { self.criteria.len() }

  pub fn is_empty(&self) -> bool { self.criteria.is_empty() }

  pub fn apply(&self, interactions: Vec<Interaction>) -> Vec<Interaction> {
    self.criteria.iter().fold(interactions, |batch, criteria| {
      let before = batch.len();
      let batch = criteria.filter(batch);
      tracing::debug!(
        criteria = criteria.name(),
        before,
        after = batch.len(),
        "applied interaction criteria"
      );
      batch
    })
  }
}

/// Collapse structurally equal interactions into one.
pub fn dedup<I>(interactions: I) -> HashSet<Interaction>
where
  I: IntoIterator<Item = Interaction>,
{
  interactions.into_iter().collect()
}

//! Input model controller.
//!
//! Owns the single [`MetricsInput`] of a UI session. Every edit replaces the
//! whole record with one field changed, recomputes both scenarios, and hands
//! the new [`Comparison`] to each registered render callback before
//! returning. Nothing is cached between edits.

use crate::metrics::{MetricsField, MetricsInput};
use crate::scenario::Comparison;

/// Callback invoked with the fresh comparison after every edit.
pub type RenderCallback = Box<dyn FnMut(&Comparison) + Send>;

pub struct MetricsController {
    input: MetricsInput,
    comparison: Comparison,
    /// Bumped once per applied edit.
    revision: u64,
    renderers: Vec<RenderCallback>,
}

impl MetricsController {
    pub fn new(input: MetricsInput) -> Self {
        Self {
            input,
            comparison: Comparison::compute(&input),
            revision: 0,
            renderers: Vec::new(),
        }
    }

    pub fn input(&self) -> &MetricsInput {
        &self.input
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a renderer. It is not called until the next edit.
    pub fn on_render(&mut self, callback: RenderCallback) {
        self.renderers.push(callback);
    }

    /// Apply a raw text edit to one field.
    pub fn edit(&mut self, field: MetricsField, raw: &str) -> &Comparison {
        let next = self.input.with_raw(field, raw);
        self.replace(next)
    }

    /// Store an already-numeric value into one field.
    pub fn set(&mut self, field: MetricsField, value: f64) -> &Comparison {
        let next = self.input.with(field, value);
        self.replace(next)
    }

    pub fn set_contacts_per_day(&mut self, raw: &str) -> &Comparison {
        self.edit(MetricsField::ContactsPerDay, raw)
    }

    pub fn set_response_time(&mut self, raw: &str) -> &Comparison {
        self.edit(MetricsField::ResponseTime, raw)
    }

    pub fn set_conversion_rate(&mut self, raw: &str) -> &Comparison {
        self.edit(MetricsField::ConversionRate, raw)
    }

    pub fn set_ticket_value(&mut self, raw: &str) -> &Comparison {
        self.edit(MetricsField::TicketValue, raw)
    }

    /// Back to the default assumptions.
    pub fn reset(&mut self) -> &Comparison {
        self.replace(MetricsInput::default())
    }

    fn replace(&mut self, next: MetricsInput) -> &Comparison {
        self.input = next;
        self.comparison = Comparison::compute(&self.input);
        self.revision += 1;
        for render in self.renderers.iter_mut() {
            render(&self.comparison);
        }
        &self.comparison
    }
}

impl Default for MetricsController {
    fn default() -> Self {
        Self::new(MetricsInput::default())
    }
}

impl std::fmt::Debug for MetricsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsController")
            .field("input", &self.input)
            .field("revision", &self.revision)
            .field("renderers", &self.renderers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_initial_comparison_matches_defaults() {
        let ctl = MetricsController::default();
        assert_eq!(ctl.revision(), 0);
        assert_eq!(ctl.comparison().human.conversions, 42);
        assert_eq!(ctl.comparison().ai.conversions, 86);
    }

    #[test]
    fn test_edit_recomputes_both_scenarios() {
        let mut ctl = MetricsController::default();
        let cmp = ctl.set_contacts_per_day("200").clone();
        assert_eq!(cmp.human.responded_contacts, 4200);
        assert_eq!(cmp.ai.responded_contacts, 5700);
        assert_eq!(ctl.input().contacts_per_day, 200.0);
        assert_eq!(ctl.revision(), 1);
    }

    #[test]
    fn test_each_setter_targets_its_field() {
        let mut ctl = MetricsController::default();
        ctl.set_response_time("60");
        ctl.set_conversion_rate("5");
        ctl.set_ticket_value("10");
        let input = *ctl.input();
        assert_eq!(input.contacts_per_day, 100.0);
        assert_eq!(input.response_time_minutes, 60.0);
        assert_eq!(input.conversion_rate_percent, 5.0);
        assert_eq!(input.average_ticket_value, 10.0);
        assert_eq!(ctl.revision(), 3);
    }

    #[test]
    fn test_renderers_called_once_per_edit() {
        let seen: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut ctl = MetricsController::default();
        ctl.on_render(Box::new(move |cmp| {
            sink.lock().unwrap().push(cmp.human.responded_contacts);
        }));

        ctl.set_contacts_per_day("10");
        ctl.set_contacts_per_day("");

        assert_eq!(*seen.lock().unwrap(), vec![210, 0]);
    }

    #[test]
    fn test_non_numeric_edit_is_stored_not_rejected() {
        let mut ctl = MetricsController::default();
        ctl.set_ticket_value("abc");
        assert!(ctl.input().average_ticket_value.is_nan());
        assert_eq!(ctl.comparison().human.revenue, "R$\u{a0}NaN");
        assert_eq!(ctl.revision(), 1);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut ctl = MetricsController::default();
        ctl.set(MetricsField::ConversionRate, 9.0);
        ctl.reset();
        assert_eq!(*ctl.input(), MetricsInput::default());
        assert_eq!(ctl.revision(), 2);
    }
}

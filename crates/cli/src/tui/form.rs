use effcalc_engine::metrics::display_value;
use effcalc_engine::{MetricsField, MetricsInput};

/// Longest text a single input accepts.
const MAX_INPUT_CHARS: usize = 32;

/// Raw text of the four inputs, exactly as typed.
///
/// The controller stores the coerced number; the form keeps the text so a
/// half-typed value such as `"1e"` stays visible while it is NaN underneath.
pub struct FormState {
    buffers: [String; 4],
    pub focused: MetricsField,
}

fn slot(field: MetricsField) -> usize {
    match field {
        MetricsField::ContactsPerDay => 0,
        MetricsField::ResponseTime => 1,
        MetricsField::ConversionRate => 2,
        MetricsField::TicketValue => 3,
    }
}

impl FormState {
    pub fn from_input(input: &MetricsInput) -> Self {
        Self {
            buffers: MetricsField::ALL.map(|f| display_value(input.get(f))),
            focused: MetricsField::ContactsPerDay,
        }
    }

    pub fn text(&self, field: MetricsField) -> &str {
        &self.buffers[slot(field)]
    }

    pub fn focused_text(&self) -> &str {
        self.text(self.focused)
    }

    pub fn focus_next(&mut self) {
        self.focused = self.focused.next();
    }

    pub fn focus_prev(&mut self) {
        self.focused = self.focused.prev();
    }

    /// Append a character to the focused input. Returns false when ignored.
    pub fn insert(&mut self, ch: char) -> bool {
        let buf = &mut self.buffers[slot(self.focused)];
        if ch.is_control() || buf.chars().count() >= MAX_INPUT_CHARS {
            return false;
        }
        buf.push(ch);
        true
    }

    /// Remove the last character. Returns false when already empty.
    pub fn backspace(&mut self) -> bool {
        self.buffers[slot(self.focused)].pop().is_some()
    }

    /// Empty the focused input. Returns false when already empty.
    pub fn clear(&mut self) -> bool {
        let buf = &mut self.buffers[slot(self.focused)];
        if buf.is_empty() {
            return false;
        }
        buf.clear();
        true
    }

    /// Overwrite all buffers from stored values (after a reset).
    pub fn sync_from(&mut self, input: &MetricsInput) {
        self.buffers = MetricsField::ALL.map(|f| display_value(input.get(f)));
    }
}

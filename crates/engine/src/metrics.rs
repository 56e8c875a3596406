//! User-entered assumptions that drive both scenario projections.

use serde::{Deserialize, Serialize};

use crate::coerce::coerce_number;

/// Default daily contact volume.
pub const DEFAULT_CONTACTS_PER_DAY: f64 = 100.0;
/// Default average response time: 3 hours.
pub const DEFAULT_RESPONSE_TIME_MINUTES: f64 = 180.0;
/// Default conversion rate, in percent (2 = 2%).
pub const DEFAULT_CONVERSION_RATE_PERCENT: f64 = 2.0;
/// Default average ticket value, in BRL.
pub const DEFAULT_AVERAGE_TICKET_VALUE: f64 = 1200.0;

/// The four inputs of the calculator.
///
/// Every field is always a number. Raw edits go through [`coerce_number`],
/// so a field may hold NaN after non-numeric text; the projector carries it
/// through to the formatted output instead of rejecting it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsInput {
    pub contacts_per_day: f64,
    /// Informational only; no projection step reads it.
    #[serde(rename = "responseTime")]
    pub response_time_minutes: f64,
    #[serde(rename = "conversionRate")]
    pub conversion_rate_percent: f64,
    #[serde(rename = "ticketValue")]
    pub average_ticket_value: f64,
}

impl Default for MetricsInput {
    fn default() -> Self {
        Self {
            contacts_per_day: DEFAULT_CONTACTS_PER_DAY,
            response_time_minutes: DEFAULT_RESPONSE_TIME_MINUTES,
            conversion_rate_percent: DEFAULT_CONVERSION_RATE_PERCENT,
            average_ticket_value: DEFAULT_AVERAGE_TICKET_VALUE,
        }
    }
}

impl MetricsInput {
    pub fn new(
        contacts_per_day: f64,
        response_time_minutes: f64,
        conversion_rate_percent: f64,
        average_ticket_value: f64,
    ) -> Self {
        Self {
            contacts_per_day,
            response_time_minutes,
            conversion_rate_percent,
            average_ticket_value,
        }
    }

    pub fn get(&self, field: MetricsField) -> f64 {
        match field {
            MetricsField::ContactsPerDay => self.contacts_per_day,
            MetricsField::ResponseTime => self.response_time_minutes,
            MetricsField::ConversionRate => self.conversion_rate_percent,
            MetricsField::TicketValue => self.average_ticket_value,
        }
    }

    /// Copy of `self` with one field replaced.
    pub fn with(self, field: MetricsField, value: f64) -> Self {
        match field {
            MetricsField::ContactsPerDay => Self { contacts_per_day: value, ..self },
            MetricsField::ResponseTime => Self { response_time_minutes: value, ..self },
            MetricsField::ConversionRate => Self { conversion_rate_percent: value, ..self },
            MetricsField::TicketValue => Self { average_ticket_value: value, ..self },
        }
    }

    /// Copy of `self` with one field replaced by the coerced raw text.
    pub fn with_raw(self, field: MetricsField, raw: &str) -> Self {
        self.with(field, coerce_number(raw))
    }
}

/// Identifies one editable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricsField {
    ContactsPerDay,
    ResponseTime,
    ConversionRate,
    TicketValue,
}

impl MetricsField {
    /// All fields in display order.
    pub const ALL: [MetricsField; 4] = [
        MetricsField::ContactsPerDay,
        MetricsField::ResponseTime,
        MetricsField::ConversionRate,
        MetricsField::TicketValue,
    ];

    /// Form label shown next to the input.
    pub fn label(&self) -> &'static str {
        match self {
            MetricsField::ContactsPerDay => "Contatos por Dia",
            MetricsField::ResponseTime => "Tempo Médio de Resposta (minutos)",
            MetricsField::ConversionRate => "Taxa de Conversão (%)",
            MetricsField::TicketValue => "Ticket Médio (R$)",
        }
    }

    pub fn next(&self) -> MetricsField {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> MetricsField {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Render a stored value the way a numeric input shows it: integers without
/// a fraction, everything else with the shortest round-trip form.
pub fn display_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
